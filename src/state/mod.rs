// Configuration store
//
// Wraps SlimeConfig in Arc<RwLock<T>>, persists every mutation through the
// ConfigManager and emits change events for interested listeners.

use crate::config::ConfigManager;
use crate::models::SlimeConfig;
use anyhow::Result;
use indexmap::IndexSet;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// The four named world sets held by the configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorldSet {
    Flat,
    Exempt,
    SpawningDisabled,
    SpawningEnabled,
}

impl WorldSet {
    const ALL: [WorldSet; 4] = [
        WorldSet::Flat,
        WorldSet::Exempt,
        WorldSet::SpawningDisabled,
        WorldSet::SpawningEnabled,
    ];

    fn of(self, config: &SlimeConfig) -> &IndexSet<String> {
        match self {
            WorldSet::Flat => &config.flat_worlds,
            WorldSet::Exempt => &config.exempt_worlds,
            WorldSet::SpawningDisabled => &config.spawning_disabled_worlds,
            WorldSet::SpawningEnabled => &config.spawning_enabled_worlds,
        }
    }
}

/// Change events emitted when the configuration is modified
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigChange {
    /// A world joined or left one of the world sets
    WorldSetChanged {
        set: WorldSet,
        world: String,
        member: bool,
    },

    /// One or more scalar flags changed
    SettingsChanged,

    /// Configuration was reloaded from disk
    Reloaded,
}

/// Thread-safe configuration store with persistence and event emission
///
/// This is the only mutable persisted state of the plugin:
/// - [`read()`](Self::read) and [`snapshot()`](Self::snapshot) for lookups
/// - [`update()`](Self::update) for mutations; changed state is saved and
///   announced as [`ConfigChange`] events
/// - [`subscribe()`](Self::subscribe) for listening to changes
///
/// A store built with [`in_memory()`](Self::in_memory) has no backing file;
/// mutations still emit events but nothing is written.
pub struct ConfigStore {
    config: Arc<RwLock<SlimeConfig>>,
    manager: Option<ConfigManager>,
    change_tx: broadcast::Sender<ConfigChange>,
}

impl ConfigStore {
    /// Load the configuration through `manager` and keep it for persistence.
    pub fn load(manager: ConfigManager) -> Result<Self> {
        let config = manager.load_config()?;
        Ok(Self::new(config, manager))
    }

    /// Wrap an already loaded configuration; later saves go through `manager`.
    pub fn new(config: SlimeConfig, manager: ConfigManager) -> Self {
        let store = Self::build(config, Some(manager));
        store.log_loaded();
        store
    }

    /// Create a store without a backing file.
    pub fn in_memory(config: SlimeConfig) -> Self {
        Self::build(config, None)
    }

    fn build(config: SlimeConfig, manager: Option<ConfigManager>) -> Self {
        let (change_tx, _) = broadcast::channel(100);
        Self {
            config: Arc::new(RwLock::new(config)),
            manager,
            change_tx,
        }
    }

    /// Clone of the current configuration.
    pub fn snapshot(&self) -> SlimeConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the configuration
    ///
    /// # Example
    /// ```ignore
    /// let exempt = store.read(|config| config.is_world_exempt("lobby"));
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SlimeConfig) -> R,
    {
        let config = self.config.read().unwrap_or_else(PoisonError::into_inner);
        f(&config)
    }

    /// Mutate the configuration, persist it if anything changed and emit
    /// change events.
    ///
    /// The in-memory change is kept even when saving fails; the error is
    /// returned so the caller can report it.
    pub fn update<F>(&self, update_fn: F) -> Result<Vec<ConfigChange>>
    where
        F: FnOnce(&mut SlimeConfig),
    {
        let (changes, snapshot) = {
            let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
            let old = config.clone();
            update_fn(&mut config);
            (Self::detect_changes(&old, &config), config.clone())
        };

        if changes.is_empty() {
            return Ok(changes);
        }

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.change_tx.send(change.clone());
        }

        self.persist(&snapshot)?;
        Ok(changes)
    }

    /// Subscribe to configuration change events
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
        self.change_tx.subscribe()
    }

    /// Re-read `config.yml`, replacing the in-memory configuration.
    pub fn reload(&self) -> Result<()> {
        if let Some(manager) = &self.manager {
            let fresh = manager.load_config()?;
            *self.config.write().unwrap_or_else(PoisonError::into_inner) = fresh;
            self.log_loaded();
        }

        let _ = self.change_tx.send(ConfigChange::Reloaded);
        Ok(())
    }

    /// Write the current configuration to disk unconditionally.
    pub fn save(&self) -> Result<()> {
        self.persist(&self.snapshot())
    }

    fn persist(&self, config: &SlimeConfig) -> Result<()> {
        match &self.manager {
            Some(manager) => manager.save_config(config),
            None => Ok(()),
        }
    }

    fn detect_changes(old: &SlimeConfig, new: &SlimeConfig) -> Vec<ConfigChange> {
        let mut changes = Vec::new();

        for set in WorldSet::ALL {
            let (before, after) = (set.of(old), set.of(new));
            for world in after.difference(before) {
                changes.push(ConfigChange::WorldSetChanged {
                    set,
                    world: world.clone(),
                    member: true,
                });
            }
            for world in before.difference(after) {
                changes.push(ConfigChange::WorldSetChanged {
                    set,
                    world: world.clone(),
                    member: false,
                });
            }
        }

        if old.auto_remove_on_startup != new.auto_remove_on_startup
            || old.prevent_spawning_in_flat_worlds != new.prevent_spawning_in_flat_worlds
            || old.require_confirmation_for_non_flat_worlds
                != new.require_confirmation_for_non_flat_worlds
            || old.confirmation_timeout_seconds != new.confirmation_timeout_seconds
            || old.enable_debug_messages != new.enable_debug_messages
            || old.prevent_egg_spawning != new.prevent_egg_spawning
            || old.prevent_command_spawning != new.prevent_command_spawning
            || old.prevent_custom_spawning != new.prevent_custom_spawning
        {
            changes.push(ConfigChange::SettingsChanged);
        }

        changes
    }

    fn log_loaded(&self) {
        self.read(|config| {
            if !config.enable_debug_messages {
                return;
            }
            tracing::debug!("Configuration loaded:");
            tracing::debug!("  Auto remove on startup: {}", config.auto_remove_on_startup);
            tracing::debug!(
                "  Prevent spawning in flat worlds: {}",
                config.prevent_spawning_in_flat_worlds
            );
            tracing::debug!("  Prevent egg spawning: {}", config.prevent_egg_spawning);
            tracing::debug!("  Prevent command spawning: {}", config.prevent_command_spawning);
            tracing::debug!("  Prevent custom spawning: {}", config.prevent_custom_spawning);
            tracing::debug!("  Flat worlds: {:?}", config.flat_worlds);
            tracing::debug!("  Exempt worlds: {:?}", config.exempt_worlds);
            tracing::debug!(
                "  Worlds with spawning disabled: {:?}",
                config.spawning_disabled_worlds
            );
        });
    }

    // Convenience methods for world set management.
    // Each returns whether the set actually changed.

    pub fn add_exempt_world(&self, world: &str) -> Result<bool> {
        self.changed(|config| config.add_exempt_world(world))
    }

    pub fn remove_exempt_world(&self, world: &str) -> Result<bool> {
        self.changed(|config| config.remove_exempt_world(world))
    }

    pub fn add_flat_world(&self, world: &str) -> Result<bool> {
        self.changed(|config| config.add_flat_world(world))
    }

    pub fn remove_flat_world(&self, world: &str) -> Result<bool> {
        self.changed(|config| config.remove_flat_world(world))
    }

    pub fn add_world_with_spawning_disabled(&self, world: &str) -> Result<bool> {
        self.changed(|config| config.add_world_with_spawning_disabled(world))
    }

    pub fn remove_world_with_spawning_disabled(&self, world: &str) -> Result<bool> {
        self.changed(|config| config.remove_world_with_spawning_disabled(world))
    }

    pub fn add_world_with_spawning_enabled(&self, world: &str) -> Result<bool> {
        self.changed(|config| config.add_world_with_spawning_enabled(world))
    }

    pub fn remove_world_with_spawning_enabled(&self, world: &str) -> Result<bool> {
        self.changed(|config| config.remove_world_with_spawning_enabled(world))
    }

    fn changed<F>(&self, f: F) -> Result<bool>
    where
        F: FnOnce(&mut SlimeConfig) -> bool,
    {
        let mut result = false;
        self.update(|config| result = f(config))?;
        Ok(result)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::in_memory(SlimeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_emits_world_set_change() {
        let store = ConfigStore::default();
        let mut rx = store.subscribe();

        let changes = store.update(|c| {
            c.add_flat_world("flat_world");
        })
        .unwrap();

        assert_eq!(
            changes,
            vec![ConfigChange::WorldSetChanged {
                set: WorldSet::Flat,
                world: "flat_world".to_string(),
                member: true,
            }]
        );
        assert_eq!(rx.try_recv().unwrap(), changes[0]);
    }

    #[test]
    fn test_no_op_update_emits_nothing() {
        let store = ConfigStore::default();
        store.add_exempt_world("lobby").unwrap();
        let mut rx = store.subscribe();

        assert!(!store.add_exempt_world("lobby").unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disable_reports_enabled_removal() {
        let store = ConfigStore::default();
        store.add_world_with_spawning_enabled("world").unwrap();

        let changes = store
            .update(|c| {
                c.add_world_with_spawning_disabled("world");
            })
            .unwrap();

        assert!(changes.contains(&ConfigChange::WorldSetChanged {
            set: WorldSet::SpawningEnabled,
            world: "world".to_string(),
            member: false,
        }));
        assert!(changes.contains(&ConfigChange::WorldSetChanged {
            set: WorldSet::SpawningDisabled,
            world: "world".to_string(),
            member: true,
        }));
    }

    #[test]
    fn test_flag_change_emits_settings_changed() {
        let store = ConfigStore::default();
        let changes = store.update(|c| c.prevent_egg_spawning = true).unwrap();
        assert_eq!(changes, vec![ConfigChange::SettingsChanged]);
    }

    #[test]
    fn test_in_memory_reload_keeps_state() {
        let store = ConfigStore::default();
        store.add_flat_world("plots").unwrap();
        let mut rx = store.subscribe();

        store.reload().unwrap();

        assert!(store.read(|c| c.is_flat_world("plots")));
        assert_eq!(rx.try_recv().unwrap(), ConfigChange::Reloaded);
    }
}
