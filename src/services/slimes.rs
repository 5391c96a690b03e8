use super::classifier::WorldClassifier;
use super::policy::SpawnPolicy;
use crate::host::{EntityScanner, HostError, MainThread, SchedulerError, WorldRegistry};
use crate::metrics::Metrics;
use crate::models::SlimeInfo;
use crate::state::ConfigStore;
use anyhow::Result;
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

/// Why an asynchronous removal removed nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemovalError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Outcome of a startup sweep over all loaded worlds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Every loaded world that was examined
    pub scanned: Vec<String>,
    /// Worlds classified as flat
    pub flat: Vec<String>,
    /// Flat worlds that are not exempt; removal ran on these
    pub eligible: Vec<String>,
    /// Slimes removed per eligible world
    pub removed: IndexMap<String, usize>,
    /// Eligible worlds whose removal failed
    pub failed: Vec<(String, HostError)>,
}

impl RemovalReport {
    pub fn total_removed(&self) -> usize {
        self.removed.values().sum()
    }
}

/// Slime counting, removal and per-world management.
///
/// Removal mutates world state. [`remove_all_matching`](Self::remove_all_matching)
/// must be called on the main thread; everywhere else use
/// [`remove_all_matching_async`](Self::remove_all_matching_async), which
/// marshals the same work through [`MainThread`].
pub struct SlimeOperations {
    config: Arc<ConfigStore>,
    registry: Arc<dyn WorldRegistry>,
    entities: Arc<dyn EntityScanner>,
    classifier: Arc<WorldClassifier>,
    policy: Arc<SpawnPolicy>,
    main_thread: MainThread,
    metrics: Arc<Metrics>,
}

impl SlimeOperations {
    pub fn new(
        config: Arc<ConfigStore>,
        registry: Arc<dyn WorldRegistry>,
        entities: Arc<dyn EntityScanner>,
        classifier: Arc<WorldClassifier>,
        policy: Arc<SpawnPolicy>,
        main_thread: MainThread,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config,
            registry,
            entities,
            classifier,
            policy,
            main_thread,
            metrics,
        }
    }

    /// Count slimes currently in `world`.
    pub fn count_matching(&self, world: &str) -> Result<usize, HostError> {
        Ok(self
            .entities
            .entities(world)?
            .iter()
            .filter(|e| e.kind.is_slime())
            .count())
    }

    /// Remove every slime in `world` and return how many were removed.
    /// Main thread only.
    pub fn remove_all_matching(&self, world: &str) -> Result<usize, HostError> {
        let removed = remove_slimes(self.entities.as_ref(), world)?;
        self.metrics.record_removal(removed);
        self.debug_log(format_args!("Removed {} slimes from world: {}", removed, world));
        Ok(removed)
    }

    /// Remove every slime in `world` on the main thread and report failures.
    ///
    /// Resolves to the number removed, or to the reason nothing was removed
    /// when the main thread is gone or the host rejects the removal.
    pub async fn try_remove_all_matching_async(&self, world: &str) -> Result<usize, RemovalError> {
        let entities = self.entities.clone();
        let target = world.to_string();

        let outcome = match self
            .main_thread
            .submit(move || remove_slimes(entities.as_ref(), &target))
            .await
        {
            Ok(result) => result.map_err(RemovalError::from),
            Err(e) => Err(RemovalError::from(e)),
        };

        match &outcome {
            Ok(removed) => {
                self.metrics.record_removal(*removed);
                self.debug_log(format_args!("Removed {} slimes from world: {}", removed, world));
            }
            Err(_) => self.metrics.record_removal_failure(),
        }

        outcome
    }

    /// Remove every slime in `world` on the main thread.
    ///
    /// Resolves to the number removed. Any failure is logged and reported as 0.
    pub async fn remove_all_matching_async(&self, world: &str) -> usize {
        self.try_remove_all_matching_async(world)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Error removing slimes: {}", e);
                0
            })
    }

    /// Remove slimes from every loaded flat world that is not exempt.
    ///
    /// Does nothing when `auto-remove-on-startup` is off. A failing world is
    /// recorded in the report and does not stop the others. Main thread only.
    pub fn remove_from_all_eligible_flat_worlds(&self) -> RemovalReport {
        let mut report = RemovalReport::default();

        if !self.config.read(|c| c.auto_remove_on_startup) {
            self.debug_log(format_args!("Auto-remove on startup is disabled"));
            return report;
        }

        tracing::info!("Scanning worlds for flat world detection...");

        report.scanned = self.registry.world_names();
        tracing::info!(
            "Found {} worlds to check: {:?}",
            report.scanned.len(),
            report.scanned
        );

        report.flat = report
            .scanned
            .iter()
            .filter(|w| self.classifier.is_flat(w))
            .cloned()
            .collect();
        tracing::info!("Detected {} flat worlds: {:?}", report.flat.len(), report.flat);

        report.eligible = report
            .flat
            .iter()
            .filter(|w| !self.classifier.is_exempt(w))
            .cloned()
            .collect();
        tracing::info!(
            "Found {} eligible flat worlds (after exemptions): {:?}",
            report.eligible.len(),
            report.eligible
        );

        if report.eligible.is_empty() {
            tracing::info!("No eligible flat worlds found for slime removal.");
            return report;
        }

        for world in report.eligible.clone() {
            match self.remove_all_matching(&world) {
                Ok(removed) if removed > 0 => {
                    tracing::info!("Removed {} slimes from flat world: {}", removed, world);
                    tracing::info!(
                        "Hello, slimeless flat world '{}'! Your slime problem has been... flattened!",
                        world
                    );
                    report.removed.insert(world, removed);
                }
                Ok(_) => {
                    tracing::info!(
                        "Hello, already slimeless flat world '{}'! Staying clean and slime-free!",
                        world
                    );
                    report.removed.insert(world, 0);
                }
                Err(e) => {
                    tracing::warn!("Skipping slime removal in '{}': {}", world, e);
                    self.metrics.record_removal_failure();
                    report.failed.push((world, e));
                }
            }
        }

        tracing::info!("Flat world greeting process completed!");
        report
    }

    /// Gather slime information for a world.
    pub fn slime_info(&self, world: &str) -> Result<SlimeInfo, HostError> {
        Ok(SlimeInfo {
            world_name: world.to_string(),
            slime_count: self.count_matching(world)?,
            spawning_disabled: self.policy.is_spawning_disabled(world),
            is_flat: self.classifier.is_flat(world),
            is_exempt: self.classifier.is_exempt(world),
        })
    }

    /// Manually disable slime spawning in a world.
    pub fn disable_spawning(&self, world: &str) -> Result<bool> {
        let changed = self.config.add_world_with_spawning_disabled(world)?;
        self.debug_log(format_args!("Disabled slime spawning for world: {}", world));
        Ok(changed)
    }

    /// Lift a manual spawning disable. Does not add a manual enable.
    pub fn enable_spawning(&self, world: &str) -> Result<bool> {
        let changed = self.config.remove_world_with_spawning_disabled(world)?;
        self.debug_log(format_args!("Enabled slime spawning for world: {}", world));
        Ok(changed)
    }

    pub fn add_exempt_world(&self, world: &str) -> Result<bool> {
        let changed = self.config.add_exempt_world(world)?;
        self.debug_log(format_args!("Added world to exempt list: {}", world));
        Ok(changed)
    }

    pub fn remove_exempt_world(&self, world: &str) -> Result<bool> {
        let changed = self.config.remove_exempt_world(world)?;
        self.debug_log(format_args!("Removed world from exempt list: {}", world));
        Ok(changed)
    }

    pub fn classifier(&self) -> &WorldClassifier {
        &self.classifier
    }

    pub fn policy(&self) -> &SpawnPolicy {
        &self.policy
    }

    fn debug_log(&self, message: std::fmt::Arguments<'_>) {
        if self.config.read(|c| c.enable_debug_messages) {
            tracing::debug!("{}", message);
        }
    }
}

fn remove_slimes(entities: &dyn EntityScanner, world: &str) -> Result<usize, HostError> {
    let mut removed = 0;
    for entity in entities.entities(world)? {
        if entity.kind.is_slime() && entities.remove_entity(world, entity.id)? {
            removed += 1;
        }
    }
    Ok(removed)
}
