use super::{EntityScanner, HostError, WorldRegistry};
use crate::models::{EntityId, EntityKind, EntitySnapshot};
use anyhow::{Context, Result};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::{PoisonError, RwLock};

/// Declarative description of a world, as read from `worlds.yml`.
///
/// ```yaml
/// - name: plots_flat
///   generator: FlatChunkGenerator
///   entities:
///     slime: 5
///     cow: 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldFixture {
    pub name: String,

    #[serde(default)]
    pub generator: Option<String>,

    /// When set, generator introspection fails with this message.
    #[serde(default)]
    pub generator_error: Option<String>,

    /// Entity type name to population count.
    #[serde(default)]
    pub entities: IndexMap<String, usize>,
}

#[derive(Debug, Default)]
struct MemoryWorld {
    generator: Option<String>,
    generator_error: Option<String>,
    entities: IndexMap<EntityId, EntityKind>,
}

#[derive(Debug, Default)]
struct Worlds {
    by_name: IndexMap<String, MemoryWorld>,
    next_id: EntityId,
}

/// In-process host: a set of named worlds with flat entity lists.
///
/// Thread-safe so it can be shared behind `Arc` between the command front,
/// the event bridge and the main-thread runner.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    worlds: RwLock<Worlds>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a host from fixtures, spawning every listed entity.
    pub fn from_fixtures(fixtures: &[WorldFixture]) -> Self {
        let host = Self::new();
        for fixture in fixtures {
            host.add_world(&fixture.name, fixture.generator.as_deref());
            if let Some(reason) = &fixture.generator_error {
                host.fail_generator_lookup(&fixture.name, reason);
            }
            for (kind, count) in &fixture.entities {
                let kind = EntityKind::from_name(kind);
                for _ in 0..*count {
                    host.spawn(&fixture.name, kind.clone());
                }
            }
        }
        host
    }

    /// Load fixtures from a YAML list.
    pub fn load_fixtures(path: &Utf8Path) -> Result<Vec<WorldFixture>> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read world fixtures: {}", path))?;
        serde_yaml_ng::from_str(&contents)
            .with_context(|| format!("Failed to parse world fixtures: {}", path))
    }

    /// Load a world. Replaces any world already registered under `name`.
    pub fn add_world(&self, name: &str, generator: Option<&str>) {
        let mut worlds = self.worlds.write().unwrap_or_else(PoisonError::into_inner);
        worlds.by_name.insert(
            name.to_string(),
            MemoryWorld {
                generator: generator.map(str::to_string),
                ..MemoryWorld::default()
            },
        );
    }

    /// Unload a world. Returns false if it was not loaded.
    pub fn unload_world(&self, name: &str) -> bool {
        let mut worlds = self.worlds.write().unwrap_or_else(PoisonError::into_inner);
        worlds.by_name.shift_remove(name).is_some()
    }

    /// Make generator introspection of `world` fail.
    pub fn fail_generator_lookup(&self, world: &str, reason: &str) {
        let mut worlds = self.worlds.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(w) = worlds.by_name.get_mut(world) {
            w.generator_error = Some(reason.to_string());
        }
    }

    /// Add an entity to a world, returning its id, or None for unknown worlds.
    pub fn spawn(&self, world: &str, kind: EntityKind) -> Option<EntityId> {
        let mut worlds = self.worlds.write().unwrap_or_else(PoisonError::into_inner);
        let id = worlds.next_id;
        let w = worlds.by_name.get_mut(world)?;
        w.entities.insert(id, kind);
        worlds.next_id += 1;
        Some(id)
    }

    /// Number of entities of `kind` in `world` (0 for unknown worlds).
    pub fn population(&self, world: &str, kind: &EntityKind) -> usize {
        let worlds = self.worlds.read().unwrap_or_else(PoisonError::into_inner);
        worlds
            .by_name
            .get(world)
            .map(|w| w.entities.values().filter(|k| *k == kind).count())
            .unwrap_or(0)
    }
}

impl WorldRegistry for InMemoryHost {
    fn world_names(&self) -> Vec<String> {
        let worlds = self.worlds.read().unwrap_or_else(PoisonError::into_inner);
        worlds.by_name.keys().cloned().collect()
    }

    fn has_world(&self, name: &str) -> bool {
        let worlds = self.worlds.read().unwrap_or_else(PoisonError::into_inner);
        worlds.by_name.contains_key(name)
    }

    fn generator_name(&self, world: &str) -> Result<Option<String>, HostError> {
        let worlds = self.worlds.read().unwrap_or_else(PoisonError::into_inner);
        let w = worlds
            .by_name
            .get(world)
            .ok_or_else(|| HostError::WorldNotFound(world.to_string()))?;

        if let Some(reason) = &w.generator_error {
            return Err(HostError::Introspection {
                world: world.to_string(),
                reason: reason.clone(),
            });
        }

        Ok(w.generator.clone())
    }
}

impl EntityScanner for InMemoryHost {
    fn entities(&self, world: &str) -> Result<Vec<EntitySnapshot>, HostError> {
        let worlds = self.worlds.read().unwrap_or_else(PoisonError::into_inner);
        let w = worlds
            .by_name
            .get(world)
            .ok_or_else(|| HostError::WorldNotFound(world.to_string()))?;

        Ok(w.entities
            .iter()
            .map(|(id, kind)| EntitySnapshot {
                id: *id,
                kind: kind.clone(),
            })
            .collect())
    }

    fn remove_entity(&self, world: &str, id: EntityId) -> Result<bool, HostError> {
        let mut worlds = self.worlds.write().unwrap_or_else(PoisonError::into_inner);
        let w = worlds
            .by_name
            .get_mut(world)
            .ok_or_else(|| HostError::WorldNotFound(world.to_string()))?;

        Ok(w.entities.shift_remove(&id).is_some())
    }
}
