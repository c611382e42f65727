use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Which host operation a call belongs to. Closed set: replay selects the
/// dispatch shape by matching on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Page,
    Track,
    Identify,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Page => "page",
            OperationKind::Track => "track",
            OperationKind::Identify => "identify",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page interaction signals that count as real engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Scroll,
    MouseMove,
    TouchStart,
    KeyDown,
}

impl InteractionKind {
    /// Every kind the release path listens for.
    pub const ALL: [InteractionKind; 4] = [
        InteractionKind::Scroll,
        InteractionKind::MouseMove,
        InteractionKind::TouchStart,
        InteractionKind::KeyDown,
    ];

    /// DOM event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            InteractionKind::Scroll => "scroll",
            InteractionKind::MouseMove => "mousemove",
            InteractionKind::TouchStart => "touchstart",
            InteractionKind::KeyDown => "keydown",
        }
    }
}

/// Set by an earlier middleware step that cancelled the call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbortMarker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Per-call targeting. `all: false` restricts delivery to the plugins whose
/// entry in `targets` is truthy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<bool>,
    /// Plugin name -> flag or plugin-specific options object. Non-plugin
    /// option keys live here too and are carried through untouched, so a
    /// truthy key that happens to share a plugin's name reads as targeting it.
    #[serde(flatten)]
    pub targets: Map<String, Value>,
}

impl CallOptions {
    /// Options delivering only to `plugins`.
    pub fn targeting<I, S>(plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets = plugins
            .into_iter()
            .map(|name| (name.into(), Value::Bool(true)))
            .collect();
        Self { all: Some(false), targets }
    }

    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.targets.insert(key.into(), value);
        self
    }

    /// True when the entry for `plugin` is truthy.
    pub fn is_targeted(&self, plugin: &str) -> bool {
        self.targets.get(plugin).map_or(false, is_truthy)
    }

    /// True when the call explicitly excludes `plugin`.
    pub fn restricts(&self, plugin: &str) -> bool {
        self.all == Some(false) && !self.is_targeted(plugin)
    }

    /// Copy of these options narrowed to exactly `plugin`. Flags for the other
    /// `managed` plugins are switched off; unrelated option keys are kept.
    pub fn only(&self, plugin: &str, managed: &[String]) -> Self {
        let mut narrowed = self.clone();
        narrowed.all = Some(false);
        for other in managed.iter().filter(|name| name.as_str() != plugin) {
            if narrowed.is_targeted(other) {
                narrowed.targets.insert(other.clone(), Value::Bool(false));
            }
        }
        narrowed.targets.insert(plugin.to_string(), Value::Bool(true));
        narrowed
    }
}

/// Arguments of a page/track/identify call as the host hands them to the hooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallPayload {
    /// Track event name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Identify user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub options: CallOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort: Option<AbortMarker>,
    /// Anything else the host put on the payload (meta, anonymousId, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CallPayload {
    pub fn page(properties: Map<String, Value>) -> Self {
        Self { properties, ..Self::default() }
    }

    pub fn track(event: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            event: Some(event.into()),
            properties,
            ..Self::default()
        }
    }

    pub fn identify(user_id: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            properties,
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_abort(mut self, reason: impl Into<String>) -> Self {
        self.abort = Some(AbortMarker { reason: Some(reason.into()) });
        self
    }

    /// A marker without a reason does not count as aborted.
    pub fn is_aborted(&self) -> bool {
        self.abort
            .as_ref()
            .and_then(|marker| marker.reason.as_deref())
            .map_or(false, |reason| !reason.is_empty())
    }

    /// Clone whose options target only `plugin` among `managed`; every other
    /// field is unchanged.
    pub fn retarget(&self, plugin: &str, managed: &[String]) -> Self {
        Self {
            options: self.options.only(plugin, managed),
            ..self.clone()
        }
    }
}

/// Host notification that plugins are being enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnablePayload {
    #[serde(default)]
    pub plugins: Vec<String>,
}

impl EnablePayload {
    pub fn new<I, S>(plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            plugins: plugins.into_iter().map(Into::into).collect(),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        // Plugin-specific option objects are the common way to target a plugin
        Value::Array(_) | Value::Object(_) => true,
    }
}
