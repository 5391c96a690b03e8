use super::classifier::WorldClassifier;
use crate::models::SpawnReason;
use crate::state::ConfigStore;
use std::sync::Arc;

/// Decides whether a slime spawn should be cancelled.
///
/// Rules are evaluated in order and the first one that applies wins:
///
/// 1. Exempt world: allow
/// 2. Spawning manually disabled for the world: prevent
/// 3. Spawning manually enabled for the world: allow
/// 4. Spawn egg / command / custom spawns: prevent iff the matching
///    `prevent-*-spawning` flag is set (never falls through)
/// 5. Anything else: prevent iff the world is flat and
///    `prevent-spawning-in-flat-worlds` is set
///
/// Operators can therefore carve out exceptions at finer granularity
/// (world exemption > per-world toggle > per-cause toggle > flat default)
/// without touching several flags.
pub struct SpawnPolicy {
    config: Arc<ConfigStore>,
    classifier: Arc<WorldClassifier>,
}

/// The slice of configuration one spawn decision needs for a single world.
#[derive(Clone, Copy)]
struct SpawnRules {
    debug: bool,
    manually_disabled: bool,
    manually_enabled: bool,
    prevent_egg: bool,
    prevent_command: bool,
    prevent_custom: bool,
    prevent_flat: bool,
}

impl SpawnPolicy {
    pub fn new(config: Arc<ConfigStore>, classifier: Arc<WorldClassifier>) -> Self {
        Self { config, classifier }
    }

    /// Check if a spawn with the given cause should be prevented in `world`.
    pub fn should_prevent(&self, world: &str, reason: &SpawnReason) -> bool {
        if self.classifier.is_exempt(world) {
            return false;
        }

        let rules = self.config.read(|c| SpawnRules {
            debug: c.enable_debug_messages,
            manually_disabled: c.is_world_spawning_disabled(world),
            manually_enabled: c.is_world_spawning_enabled(world),
            prevent_egg: c.prevent_egg_spawning,
            prevent_command: c.prevent_command_spawning,
            prevent_custom: c.prevent_custom_spawning,
            prevent_flat: c.prevent_spawning_in_flat_worlds,
        });
        let debug = rules.debug;

        if rules.manually_disabled {
            if debug {
                tracing::debug!("Preventing slime spawn in {} (manually disabled)", world);
            }
            return true;
        }

        if rules.manually_enabled {
            if debug {
                tracing::debug!(
                    "Allowing slime spawn in {} (manually enabled, overriding global setting)",
                    world
                );
            }
            return false;
        }

        let cause_toggle = match reason {
            SpawnReason::SpawnerEgg => Some(("egg", rules.prevent_egg)),
            SpawnReason::Command => Some(("command", rules.prevent_command)),
            SpawnReason::Custom => Some(("custom", rules.prevent_custom)),
            SpawnReason::Other(_) => None,
        };

        if let Some((cause, prevent)) = cause_toggle {
            if debug {
                tracing::debug!(
                    "{} slime {} spawn in {} ({} spawning {})",
                    if prevent { "Preventing" } else { "Allowing" },
                    cause,
                    world,
                    cause,
                    if prevent { "disabled" } else { "enabled" }
                );
            }
            return prevent;
        }

        if rules.prevent_flat && self.classifier.is_flat(world) {
            if debug {
                tracing::debug!(
                    "Preventing slime natural spawn in flat world: {} (reason: {})",
                    world,
                    reason
                );
            }
            return true;
        }

        false
    }

    /// Whether natural slime spawning is off in `world`, for display.
    ///
    /// Unlike [`should_prevent`](Self::should_prevent) this ignores spawn
    /// causes and manual enables: it reports a manual disable, or the flat
    /// world rule applying to a non-exempt world.
    pub fn is_spawning_disabled(&self, world: &str) -> bool {
        if self.config.read(|c| c.is_world_spawning_disabled(world)) {
            return true;
        }

        self.config.read(|c| c.prevent_spawning_in_flat_worlds)
            && self.classifier.is_flat(world)
            && !self.classifier.is_exempt(world)
    }
}
