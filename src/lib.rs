// SlimeAnnihilator - flat world detection and slime spawn management
//
// This is the library crate containing the plugin logic. The host game server
// is reached only through the capability traits in `host`; the binary crate
// (main.rs) drives the plugin against an in-memory host from the console.

pub mod commands;
pub mod config;
pub mod events;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod plugin;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use commands::{Actor, CommandFront, Message};
pub use config::ConfigManager;
pub use events::{EventBridge, SpawnAttempt};
pub use host::{InMemoryHost, MainThread};
pub use models::{EntityKind, SlimeConfig, SlimeInfo, SpawnReason};
pub use plugin::SlimeAnnihilator;
pub use state::{ConfigChange, ConfigStore};

/// Plugin version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Plugin name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
