//! Data models for the slime management plugin.
//!
//! - [`SlimeConfig`]: Policy flags and world sets persisted in `config.yml`
//! - [`SpawnReason`]: Cause category of a spawn attempt
//! - [`EntityKind`] / [`EntitySnapshot`]: Entities as reported by the host
//! - [`SlimeInfo`]: Per-world snapshot returned by the `info` command
//!
//! `SlimeConfig` is never shared directly; [`ConfigStore`](crate::state::ConfigStore)
//! wraps it in `Arc<RwLock<>>` and persists every mutation.

pub mod config;
pub mod world;

pub use config::SlimeConfig;
pub use world::{EntityId, EntityKind, EntitySnapshot, SlimeInfo, SpawnReason};
