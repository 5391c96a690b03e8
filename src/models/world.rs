use std::fmt;

/// Kind of an entity living in a world.
///
/// Only [`EntityKind::Slime`] is managed by the plugin; every other kind is
/// carried by name so the in-memory host can model mixed populations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Slime,
    Other(String),
}

impl EntityKind {
    /// Parse a host entity type name (`"slime"`, `"ZOMBIE"`, ...).
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("slime") {
            Self::Slime
        } else {
            Self::Other(name.to_ascii_lowercase())
        }
    }

    pub fn is_slime(&self) -> bool {
        matches!(self, Self::Slime)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slime => f.write_str("slime"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Host-assigned entity identifier, unique within a world.
pub type EntityId = u64;

/// Point-in-time view of one entity as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
}

/// Cause of a spawn attempt.
///
/// The three named causes have dedicated global toggles. Everything else
/// (natural spawning, chunk generation, spawners, splitting, ...) falls into
/// [`SpawnReason::Other`], which keeps the host's label for logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpawnReason {
    SpawnerEgg,
    Command,
    Custom,
    Other(String),
}

impl SpawnReason {
    /// Map a host spawn-cause label onto a reason.
    pub fn from_host(label: &str) -> Self {
        match label.to_ascii_uppercase().as_str() {
            "SPAWNER_EGG" => Self::SpawnerEgg,
            "COMMAND" => Self::Command,
            "CUSTOM" => Self::Custom,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn natural() -> Self {
        Self::Other("NATURAL".to_string())
    }
}

impl fmt::Display for SpawnReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpawnerEgg => f.write_str("SPAWNER_EGG"),
            Self::Command => f.write_str("COMMAND"),
            Self::Custom => f.write_str("CUSTOM"),
            Self::Other(label) => f.write_str(label),
        }
    }
}

/// Snapshot of slime management state for one world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlimeInfo {
    pub world_name: String,
    pub slime_count: usize,
    pub spawning_disabled: bool,
    pub is_flat: bool,
    pub is_exempt: bool,
}
