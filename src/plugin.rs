//! Plugin lifecycle: wiring on enable, startup sweep, persistence on disable.

use crate::commands::CommandFront;
use crate::events::EventBridge;
use crate::host::{EntityScanner, MainThread, SchedulerError, WorldRegistry};
use crate::logging::LogControl;
use crate::metrics::Metrics;
use crate::services::{SlimeOperations, SpawnPolicy, WorldClassifier};
use crate::state::{ConfigChange, ConfigStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Ticks to wait after enable before sweeping flat worlds, so that worlds
/// loaded right after the plugin are included.
pub const STARTUP_DELAY_TICKS: u32 = 20;

/// The assembled plugin.
///
/// Owns one instance of every service and hands out the two host-facing
/// entry points: [`commands()`](Self::commands) for `/slimes` and
/// [`events()`](Self::events) for spawn notifications.
pub struct SlimeAnnihilator {
    config: Arc<ConfigStore>,
    operations: Arc<SlimeOperations>,
    commands: CommandFront,
    events: EventBridge,
    metrics: Arc<Metrics>,
    main_thread: MainThread,
}

impl SlimeAnnihilator {
    /// Build every service on top of a loaded configuration.
    pub fn enable(
        config: Arc<ConfigStore>,
        registry: Arc<dyn WorldRegistry>,
        entities: Arc<dyn EntityScanner>,
        main_thread: MainThread,
    ) -> Self {
        tracing::info!("SlimeAnnihilator is starting up...");

        let metrics = Arc::new(Metrics::new());
        let classifier = Arc::new(WorldClassifier::new(config.clone(), registry.clone()));
        let policy = Arc::new(SpawnPolicy::new(config.clone(), classifier.clone()));
        let operations = Arc::new(SlimeOperations::new(
            config.clone(),
            registry.clone(),
            entities,
            classifier,
            policy.clone(),
            main_thread.clone(),
            metrics.clone(),
        ));
        let commands = CommandFront::new(
            operations.clone(),
            config.clone(),
            registry,
            metrics.clone(),
        );
        let events = EventBridge::new(policy, metrics.clone());

        tracing::info!("SlimeAnnihilator has been enabled!");

        Self {
            config,
            operations,
            commands,
            events,
            metrics,
            main_thread,
        }
    }

    /// Schedule the one-shot flat world sweep on the main thread.
    ///
    /// Returns `None` when `auto-remove-on-startup` is off. Must be called
    /// from within a tokio runtime.
    pub fn schedule_startup_removal(&self) -> Option<JoinHandle<Result<(), SchedulerError>>> {
        if !self.config.read(|c| c.auto_remove_on_startup) {
            tracing::info!("Auto-remove on startup is disabled.");
            return None;
        }

        tracing::info!("Auto-remove on startup is enabled. Scheduling world scan...");
        let operations = self.operations.clone();
        Some(
            self.main_thread
                .schedule_after_ticks(STARTUP_DELAY_TICKS, move || {
                    tracing::info!("Starting flat world scan and slime removal...");
                    let report = operations.remove_from_all_eligible_flat_worlds();
                    tracing::info!(
                        "Auto-removal task completed for flat worlds! ({} slimes removed)",
                        report.total_removed()
                    );
                }),
        )
    }

    /// Keep the log filter in step with `debug-messages`.
    ///
    /// The flag is re-applied after every reload or settings change until
    /// the configuration store is dropped. Must be called from within a
    /// tokio runtime.
    pub fn follow_debug_setting(&self, control: LogControl) -> JoinHandle<()> {
        let config = Arc::downgrade(&self.config);
        // Subscribe before spawning so no change is missed
        let mut changes = self.config.subscribe();

        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(ConfigChange::Reloaded | ConfigChange::SettingsChanged)
                    | Err(RecvError::Lagged(_)) => {
                        let Some(config) = config.upgrade() else {
                            break;
                        };
                        let debug = config.read(|c| c.enable_debug_messages);
                        if let Err(e) = control.set_debug(debug) {
                            tracing::warn!("{:#}", e);
                        }
                    }
                    Ok(ConfigChange::WorldSetChanged { .. }) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Persist the configuration and log a metrics summary.
    pub fn disable(&self) -> Result<()> {
        self.config
            .save()
            .context("Failed to save configuration on shutdown")?;
        self.metrics.log_summary();
        tracing::info!("SlimeAnnihilator has been disabled!");
        Ok(())
    }

    pub fn commands(&self) -> &CommandFront {
        &self.commands
    }

    pub fn events(&self) -> &EventBridge {
        &self.events
    }

    pub fn operations(&self) -> &Arc<SlimeOperations> {
        &self.operations
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}
