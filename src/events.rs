// Spawn event bridge
//
// Receives creature spawn notifications from the host and cancels slime
// spawns the policy rejects.

use crate::metrics::Metrics;
use crate::models::{EntityKind, SpawnReason};
use crate::services::SpawnPolicy;
use std::sync::Arc;

/// A creature spawn notification from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnAttempt {
    pub entity_kind: EntityKind,
    pub world: String,
    pub reason: SpawnReason,
    /// Set by earlier observers or by this bridge
    pub cancelled: bool,
}

impl SpawnAttempt {
    pub fn new(entity_kind: EntityKind, world: &str, reason: SpawnReason) -> Self {
        Self {
            entity_kind,
            world: world.to_string(),
            reason,
            cancelled: false,
        }
    }
}

/// Consults [`SpawnPolicy`] for every live slime spawn attempt.
pub struct EventBridge {
    policy: Arc<SpawnPolicy>,
    metrics: Arc<Metrics>,
}

impl EventBridge {
    pub fn new(policy: Arc<SpawnPolicy>, metrics: Arc<Metrics>) -> Self {
        Self { policy, metrics }
    }

    /// Handle one spawn attempt, cancelling it if the policy says so.
    ///
    /// Non-slime entities and attempts another observer already cancelled
    /// are left untouched. Returns whether this call cancelled the attempt.
    pub fn on_creature_spawn(&self, attempt: &mut SpawnAttempt) -> bool {
        if !attempt.entity_kind.is_slime() || attempt.cancelled {
            return false;
        }

        let prevent = self.policy.should_prevent(&attempt.world, &attempt.reason);
        self.metrics.record_spawn_check(prevent);

        if prevent {
            attempt.cancelled = true;
        }
        prevent
    }
}
