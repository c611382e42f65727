use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("plugin name at index {0} is empty")]
    EmptyPluginName(usize),
    #[error("plugin {0:?} is listed more than once")]
    DuplicatePlugin(String),
}

/// Construction-time settings. The plugin set is fixed for the life of the
/// `DeferPlugin` built from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeferConfig {
    /// Plugins whose calls are deferred, in the order records are queued.
    #[serde(default)]
    pub plugins: Vec<String>,
}

impl DeferConfig {
    pub fn new<I, S>(plugins: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = Self {
            plugins: plugins.into_iter().map(Into::into).collect(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (index, name) in self.plugins.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyPluginName(index));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicatePlugin(name.clone()));
            }
        }
        Ok(())
    }
}
