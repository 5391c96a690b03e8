//! Host capabilities - the narrow interface to the game server.
//!
//! The plugin never touches world or entity state directly. Everything it
//! needs from the host goes through these seams:
//!
//! - [`WorldRegistry`]: which worlds are loaded and what generates their terrain
//! - [`EntityScanner`]: entity listing and removal inside one world
//! - [`MainThread`]: "run this on the thread that owns world mutation"
//!
//! [`InMemoryHost`] implements both traits for tests and the console binary.

pub mod memory;
pub mod scheduler;

pub use memory::{InMemoryHost, WorldFixture};
pub use scheduler::{MainThread, MainThreadRunner, SchedulerError, TICK};

use crate::models::{EntityId, EntitySnapshot};
use thiserror::Error;

/// Errors reported by host capabilities
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("World '{0}' is not loaded")]
    WorldNotFound(String),

    #[error("Could not inspect generator of world '{world}': {reason}")]
    Introspection { world: String, reason: String },

    #[error("Entity operation failed in world '{world}': {reason}")]
    Entity { world: String, reason: String },
}

/// Lookup of loaded worlds.
#[cfg_attr(test, mockall::automock)]
pub trait WorldRegistry: Send + Sync {
    /// Names of all currently loaded worlds, in host order.
    fn world_names(&self) -> Vec<String>;

    /// Whether a world with this exact name is loaded.
    fn has_world(&self, name: &str) -> bool;

    /// Type name of the world's custom terrain generator, if it has one.
    fn generator_name(&self, world: &str) -> Result<Option<String>, HostError>;
}

/// Entity access for one world.
///
/// `remove_entity` mutates world state and must only be called from the
/// main thread; see [`MainThread`].
#[cfg_attr(test, mockall::automock)]
pub trait EntityScanner: Send + Sync {
    /// Current entities of the world.
    fn entities(&self, world: &str) -> Result<Vec<EntitySnapshot>, HostError>;

    /// Remove one entity. Returns false if it was already gone.
    fn remove_entity(&self, world: &str, id: EntityId) -> Result<bool, HostError>;
}
