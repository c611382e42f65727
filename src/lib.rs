pub mod config;
pub mod host;
pub mod kernel;
pub mod page;
pub mod plugin;

// Re-export the embedding surface
pub use config::{ConfigError, DeferConfig};
pub use host::{AnalyticsHost, DispatchError, HostHandle, PluginState};
pub use kernel::event::{CallOptions, CallPayload, EnablePayload, InteractionKind, OperationKind};
pub use kernel::replay::{ReadySignal, ReplayJob};
pub use page::{ChannelPage, Headless, InteractionEmitter, InteractionSubscription, PageEnvironment};
pub use plugin::DeferPlugin;
