//! Integration tests for SlimeOperations against the in-memory host
//!
//! These tests verify:
//! - Counting and removal of slimes only
//! - Main-thread marshalling of async removal
//! - The startup sweep over flat, non-exempt worlds
//! - Failure handling when the host rejects a removal

use slime_annihilator::host::{EntityScanner, HostError, MainThreadRunner, WorldRegistry};
use slime_annihilator::metrics::Metrics;
use slime_annihilator::models::{EntityId, EntitySnapshot};
use slime_annihilator::services::{SlimeOperations, SpawnPolicy, WorldClassifier};
use slime_annihilator::{ConfigStore, EntityKind, InMemoryHost, MainThread, SlimeConfig};
use std::sync::Arc;
use std::sync::atomic::Ordering;

struct Harness {
    host: Arc<InMemoryHost>,
    config: Arc<ConfigStore>,
    metrics: Arc<Metrics>,
    ops: SlimeOperations,
    runner: Option<MainThreadRunner>,
}

fn harness_with(config: SlimeConfig, entities: Option<Arc<dyn EntityScanner>>) -> Harness {
    let host = Arc::new(InMemoryHost::new());
    let config = Arc::new(ConfigStore::in_memory(config));
    let metrics = Arc::new(Metrics::new());
    let (main_thread, runner) = MainThread::channel(16);

    let registry: Arc<dyn WorldRegistry> = host.clone();
    let entities: Arc<dyn EntityScanner> = match entities {
        Some(entities) => entities,
        None => host.clone(),
    };
    let classifier = Arc::new(WorldClassifier::new(config.clone(), registry.clone()));
    let policy = Arc::new(SpawnPolicy::new(config.clone(), classifier.clone()));
    let ops = SlimeOperations::new(
        config.clone(),
        registry,
        entities,
        classifier,
        policy,
        main_thread,
        metrics.clone(),
    );

    Harness {
        host,
        config,
        metrics,
        ops,
        runner: Some(runner),
    }
}

fn harness() -> Harness {
    harness_with(SlimeConfig::default(), None)
}

fn populate(host: &InMemoryHost, world: &str, slimes: usize, others: usize) {
    for _ in 0..slimes {
        host.spawn(world, EntityKind::Slime).unwrap();
    }
    for _ in 0..others {
        host.spawn(world, EntityKind::from_name("cow")).unwrap();
    }
}

/// Entity scanner whose removals always fail.
struct RejectingScanner {
    inner: Arc<InMemoryHost>,
}

impl EntityScanner for RejectingScanner {
    fn entities(&self, world: &str) -> Result<Vec<EntitySnapshot>, HostError> {
        self.inner.entities(world)
    }

    fn remove_entity(&self, world: &str, _id: EntityId) -> Result<bool, HostError> {
        Err(HostError::Entity {
            world: world.to_string(),
            reason: "entity is locked".to_string(),
        })
    }
}

#[test]
fn test_count_then_remove_only_slimes() {
    let h = harness();
    h.host.add_world("world", None);
    populate(&h.host, "world", 5, 3);

    assert_eq!(h.ops.count_matching("world").unwrap(), 5);
    assert_eq!(h.ops.remove_all_matching("world").unwrap(), 5);
    assert_eq!(h.ops.count_matching("world").unwrap(), 0);
    assert_eq!(h.host.population("world", &EntityKind::from_name("cow")), 3);
    assert_eq!(h.metrics.slimes_removed.load(Ordering::Relaxed), 5);
}

#[test]
fn test_unknown_world_is_an_error() {
    let h = harness();

    assert_eq!(
        h.ops.count_matching("nowhere"),
        Err(HostError::WorldNotFound("nowhere".to_string()))
    );
}

#[tokio::test]
async fn test_async_removal_runs_on_main_thread() {
    let mut h = harness();
    h.host.add_world("world", None);
    populate(&h.host, "world", 4, 1);

    let runner = h.runner.take().unwrap();
    let runner_task = tokio::spawn(runner.run());

    assert_eq!(h.ops.remove_all_matching_async("world").await, 4);
    assert_eq!(h.host.population("world", &EntityKind::Slime), 0);

    drop(h);
    runner_task.await.unwrap();
}

#[tokio::test]
async fn test_async_removal_without_main_thread_reports_zero() {
    let mut h = harness();
    h.host.add_world("world", None);
    populate(&h.host, "world", 2, 0);

    // No runner: the main thread has gone away
    drop(h.runner.take());

    assert_eq!(h.ops.remove_all_matching_async("world").await, 0);
    assert_eq!(h.host.population("world", &EntityKind::Slime), 2);
    assert_eq!(h.metrics.removal_failures.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn test_async_removal_failure_reports_zero() {
    let host = Arc::new(InMemoryHost::new());
    let scanner: Arc<dyn EntityScanner> = Arc::new(RejectingScanner {
        inner: host.clone(),
    });
    let mut h = harness_with(SlimeConfig::default(), Some(scanner));
    // Registry and scanner are separate hosts here; both need the world
    h.host.add_world("world", None);
    host.add_world("world", None);
    populate(&host, "world", 3, 0);

    let runner_task = tokio::spawn(h.runner.take().unwrap().run());

    assert_eq!(h.ops.remove_all_matching_async("world").await, 0);
    assert_eq!(host.population("world", &EntityKind::Slime), 3);
    assert_eq!(h.metrics.removal_failures.load(Ordering::Relaxed), 1);

    drop(h);
    runner_task.await.unwrap();
}

#[test]
fn test_startup_sweep_clears_eligible_flat_worlds() {
    let mut config = SlimeConfig::default();
    config.add_flat_world("plots");
    config.add_exempt_world("flat_farm");
    let h = harness_with(config, None);

    h.host.add_world("world", Some("NormalChunkGenerator"));
    h.host.add_world("plots", None);
    h.host.add_world("flat_farm", None);
    h.host.add_world("skyblock", Some("VoidGenerator"));
    h.host.add_world("creative", None);
    populate(&h.host, "world", 2, 0);
    populate(&h.host, "plots", 3, 1);
    populate(&h.host, "flat_farm", 4, 0);
    populate(&h.host, "skyblock", 1, 0);

    let report = h.ops.remove_from_all_eligible_flat_worlds();

    assert_eq!(report.scanned.len(), 5);
    assert_eq!(report.flat, vec!["plots", "flat_farm", "skyblock", "creative"]);
    assert_eq!(report.eligible, vec!["plots", "skyblock", "creative"]);
    assert_eq!(report.removed.get("plots"), Some(&3));
    assert_eq!(report.removed.get("skyblock"), Some(&1));
    assert_eq!(report.removed.get("creative"), Some(&0));
    assert_eq!(report.total_removed(), 4);
    assert!(report.failed.is_empty());

    assert_eq!(h.host.population("world", &EntityKind::Slime), 2);
    assert_eq!(h.host.population("flat_farm", &EntityKind::Slime), 4);
    assert_eq!(h.host.population("plots", &EntityKind::from_name("cow")), 1);
}

#[test]
fn test_startup_sweep_respects_auto_remove_flag() {
    let config = SlimeConfig {
        auto_remove_on_startup: false,
        ..SlimeConfig::default()
    };
    let h = harness_with(config, None);
    h.host.add_world("flat_world", None);
    populate(&h.host, "flat_world", 3, 0);

    let report = h.ops.remove_from_all_eligible_flat_worlds();

    assert!(report.scanned.is_empty());
    assert_eq!(h.host.population("flat_world", &EntityKind::Slime), 3);
}

#[test]
fn test_startup_sweep_continues_after_failure() {
    let host = Arc::new(InMemoryHost::new());
    let scanner: Arc<dyn EntityScanner> = Arc::new(RejectingScanner {
        inner: host.clone(),
    });
    let h = harness_with(SlimeConfig::default(), Some(scanner));
    h.host.add_world("flat_one", None);
    h.host.add_world("flat_two", None);
    host.add_world("flat_one", None);
    populate(&host, "flat_one", 1, 0);

    let report = h.ops.remove_from_all_eligible_flat_worlds();

    // flat_one rejects the removal, flat_two is unknown to the scanner
    assert_eq!(report.failed.len(), 2);
    assert!(report.removed.is_empty());
    assert_eq!(h.metrics.removal_failures.load(Ordering::Relaxed), 2);
}

#[test]
fn test_slime_info_reflects_configuration() {
    let h = harness();
    h.host.add_world("flat_world", None);
    populate(&h.host, "flat_world", 2, 2);

    let info = h.ops.slime_info("flat_world").unwrap();
    assert_eq!(info.slime_count, 2);
    assert!(info.is_flat);
    assert!(!info.is_exempt);
    assert!(info.spawning_disabled);

    h.ops.add_exempt_world("flat_world").unwrap();
    let info = h.ops.slime_info("flat_world").unwrap();
    assert!(info.is_exempt);
    assert!(!info.spawning_disabled);
}

#[test]
fn test_enable_only_lifts_manual_disable() {
    let h = harness();
    h.host.add_world("world", None);

    assert!(h.ops.disable_spawning("world").unwrap());
    assert!(h.ops.policy().is_spawning_disabled("world"));

    assert!(h.ops.enable_spawning("world").unwrap());
    assert!(!h.ops.policy().is_spawning_disabled("world"));
    assert!(!h.config.read(|c| c.is_world_spawning_enabled("world")));
    assert!(!h.ops.enable_spawning("world").unwrap());
}
