use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Plugin configuration persisted as `config.yml`.
///
/// Every field carries its own serde default so a partial or empty document
/// still loads. World lists are stored as [`IndexSet`]s: duplicates in the
/// file collapse on load and the write-back order is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlimeConfig {
    #[serde(default = "default_true")]
    pub auto_remove_on_startup: bool,

    #[serde(default = "default_true")]
    pub prevent_spawning_in_flat_worlds: bool,

    #[serde(default = "default_true")]
    pub require_confirmation_for_non_flat_worlds: bool,

    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_seconds: u32,

    #[serde(rename = "debug-messages", default)]
    pub enable_debug_messages: bool,

    #[serde(default)]
    pub prevent_egg_spawning: bool,

    #[serde(default)]
    pub prevent_command_spawning: bool,

    #[serde(default)]
    pub prevent_custom_spawning: bool,

    #[serde(default)]
    pub flat_worlds: IndexSet<String>,

    #[serde(default)]
    pub exempt_worlds: IndexSet<String>,

    #[serde(rename = "worlds-with-spawning-disabled", default)]
    pub spawning_disabled_worlds: IndexSet<String>,

    #[serde(rename = "worlds-with-spawning-enabled", default)]
    pub spawning_enabled_worlds: IndexSet<String>,
}

impl Default for SlimeConfig {
    fn default() -> Self {
        Self {
            auto_remove_on_startup: true,
            prevent_spawning_in_flat_worlds: true,
            require_confirmation_for_non_flat_worlds: true,
            confirmation_timeout_seconds: default_confirmation_timeout(),
            enable_debug_messages: false,
            prevent_egg_spawning: false,
            prevent_command_spawning: false,
            prevent_custom_spawning: false,
            flat_worlds: IndexSet::new(),
            exempt_worlds: IndexSet::new(),
            spawning_disabled_worlds: IndexSet::new(),
            spawning_enabled_worlds: IndexSet::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_confirmation_timeout() -> u32 {
    30
}

impl SlimeConfig {
    /// Confirmation window for destructive commands on non-flat worlds.
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.confirmation_timeout_seconds))
    }

    pub fn is_flat_world(&self, world: &str) -> bool {
        self.flat_worlds.contains(world)
    }

    pub fn is_world_exempt(&self, world: &str) -> bool {
        self.exempt_worlds.contains(world)
    }

    pub fn is_world_spawning_disabled(&self, world: &str) -> bool {
        self.spawning_disabled_worlds.contains(world)
    }

    pub fn is_world_spawning_enabled(&self, world: &str) -> bool {
        self.spawning_enabled_worlds.contains(world)
    }

    /// Mark spawning as manually disabled. Also clears a manual enable for
    /// the same world; the inverse operation does not touch the enabled set.
    pub fn add_world_with_spawning_disabled(&mut self, world: &str) -> bool {
        self.spawning_enabled_worlds.shift_remove(world);
        self.spawning_disabled_worlds.insert(world.to_string())
    }

    pub fn remove_world_with_spawning_disabled(&mut self, world: &str) -> bool {
        self.spawning_disabled_worlds.shift_remove(world)
    }

    pub fn add_world_with_spawning_enabled(&mut self, world: &str) -> bool {
        self.spawning_enabled_worlds.insert(world.to_string())
    }

    pub fn remove_world_with_spawning_enabled(&mut self, world: &str) -> bool {
        self.spawning_enabled_worlds.shift_remove(world)
    }

    pub fn add_exempt_world(&mut self, world: &str) -> bool {
        self.exempt_worlds.insert(world.to_string())
    }

    pub fn remove_exempt_world(&mut self, world: &str) -> bool {
        self.exempt_worlds.shift_remove(world)
    }

    pub fn add_flat_world(&mut self, world: &str) -> bool {
        self.flat_worlds.insert(world.to_string())
    }

    pub fn remove_flat_world(&mut self, world: &str) -> bool {
        self.flat_worlds.shift_remove(world)
    }
}
