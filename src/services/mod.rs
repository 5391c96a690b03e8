//! Services module - the slime management logic.
//!
//! Everything here reads configuration through [`ConfigStore`](crate::state::ConfigStore)
//! and reaches the game server only through the capability traits in
//! [`crate::host`], so each service can run against [`InMemoryHost`](crate::host::InMemoryHost).
//!
//! # Components
//!
//! - [`WorldClassifier`]: flat-world detection (manual list, generator name,
//!   world name) and exemption lookup
//! - [`SpawnPolicy`]: the ordered rule set deciding whether a slime spawn is
//!   cancelled
//! - [`SlimeOperations`]: counting and removal of slimes, the startup sweep
//!   over flat worlds, and per-world spawning/exemption management
//!
//! # Threading
//!
//! Classification and policy only read configuration snapshots and host
//! metadata, so they can be called from any thread. Removal mutates world
//! state and goes through [`MainThread`](crate::host::MainThread) unless the
//! caller is already on it.

pub mod classifier;
pub mod policy;
pub mod slimes;

pub use classifier::{FlatDetection, WorldClassifier};
pub use policy::SpawnPolicy;
pub use slimes::{RemovalError, RemovalReport, SlimeOperations};
