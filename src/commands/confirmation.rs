use indexmap::IndexMap;
use std::time::{Duration, Instant};

/// Result of confirming a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Request was within the timeout; carries the target world
    Confirmed(String),
    /// Request was older than the timeout
    Expired(String),
    /// The actor had no pending request
    NoPending,
}

/// Pending confirmations for destructive commands, keyed by `(actor, world)`.
///
/// Entries are created by [`request`](Self::request) and always removed by
/// [`confirm`](Self::confirm), whatever the outcome. Expired entries are only
/// noticed when they are looked at; there is no background timer. An actor
/// has at most one pending request.
#[derive(Debug, Default)]
pub struct ConfirmationLedger {
    requests: IndexMap<(String, String), Instant>,
}

impl ConfirmationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request at `now`, replacing the actor's earlier one.
    pub fn request(&mut self, actor: &str, world: &str, now: Instant) {
        self.cancel(actor);
        self.requests
            .insert((actor.to_string(), world.to_string()), now);
    }

    /// Whether a request for this key exists and is still within `timeout`.
    pub fn is_pending(&self, actor: &str, world: &str, now: Instant, timeout: Duration) -> bool {
        self.requests
            .get(&(actor.to_string(), world.to_string()))
            .is_some_and(|requested| !is_expired(*requested, now, timeout))
    }

    /// Resolve the actor's pending request and discard it.
    pub fn confirm(&mut self, actor: &str, now: Instant, timeout: Duration) -> ConfirmOutcome {
        let Some(key) = self.requests.keys().find(|(a, _)| a == actor).cloned() else {
            return ConfirmOutcome::NoPending;
        };

        let requested = self.requests.shift_remove(&key).unwrap_or(now);
        let (_, world) = key;

        if is_expired(requested, now, timeout) {
            ConfirmOutcome::Expired(world)
        } else {
            ConfirmOutcome::Confirmed(world)
        }
    }

    /// Drop the actor's pending request without resolving it.
    pub fn cancel(&mut self, actor: &str) -> bool {
        let before = self.requests.len();
        self.requests.retain(|(a, _), _| a != actor);
        self.requests.len() != before
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

fn is_expired(requested: Instant, now: Instant, timeout: Duration) -> bool {
    now.saturating_duration_since(requested) > timeout
}
