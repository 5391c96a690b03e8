//! Integration tests for the plugin lifecycle
//!
//! These tests verify:
//! - The delayed startup sweep on the main thread
//! - Spawn events routed through the assembled plugin
//! - Configuration persistence on disable

use camino::Utf8PathBuf;
use slime_annihilator::plugin::STARTUP_DELAY_TICKS;
use slime_annihilator::{
    ConfigManager, ConfigStore, EntityKind, InMemoryHost, MainThread, SlimeAnnihilator,
    SlimeConfig, SpawnAttempt, SpawnReason,
};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

fn flat_server() -> Arc<InMemoryHost> {
    let host = Arc::new(InMemoryHost::new());
    host.add_world("world", None);
    host.add_world("flat_world", None);
    for world in ["world", "flat_world"] {
        for _ in 0..3 {
            host.spawn(world, EntityKind::Slime).unwrap();
        }
    }
    host
}

#[tokio::test]
async fn test_startup_sweep_runs_after_delay() {
    let host = flat_server();
    let (main_thread, runner) = MainThread::channel(8);
    let runner_task = tokio::spawn(runner.run());
    let plugin = SlimeAnnihilator::enable(
        Arc::new(ConfigStore::in_memory(SlimeConfig::default())),
        host.clone(),
        host.clone(),
        main_thread,
    );

    let sweep = plugin
        .schedule_startup_removal()
        .expect("auto-remove is on by default");

    // Nothing happens before the delay has elapsed
    assert_eq!(host.population("flat_world", &EntityKind::Slime), 3);
    assert_eq!(STARTUP_DELAY_TICKS, 20);

    sweep.await.unwrap().unwrap();

    assert_eq!(host.population("flat_world", &EntityKind::Slime), 0);
    assert_eq!(host.population("world", &EntityKind::Slime), 3);
    assert_eq!(plugin.metrics().slimes_removed.load(Ordering::Relaxed), 3);

    drop(plugin);
    runner_task.await.unwrap();
}

#[tokio::test]
async fn test_no_startup_sweep_when_disabled() {
    let host = flat_server();
    let (main_thread, _runner) = MainThread::channel(8);
    let config = SlimeConfig {
        auto_remove_on_startup: false,
        ..SlimeConfig::default()
    };
    let plugin = SlimeAnnihilator::enable(
        Arc::new(ConfigStore::in_memory(config)),
        host.clone(),
        host,
        main_thread,
    );

    assert!(plugin.schedule_startup_removal().is_none());
}

#[test]
fn test_spawn_events_through_plugin() {
    let host = flat_server();
    let (main_thread, _runner) = MainThread::channel(8);
    let plugin = SlimeAnnihilator::enable(
        Arc::new(ConfigStore::in_memory(SlimeConfig::default())),
        host.clone(),
        host,
        main_thread,
    );

    let mut natural = SpawnAttempt::new(EntityKind::Slime, "flat_world", SpawnReason::natural());
    let mut egg = SpawnAttempt::new(EntityKind::Slime, "flat_world", SpawnReason::SpawnerEgg);
    let mut elsewhere = SpawnAttempt::new(EntityKind::Slime, "world", SpawnReason::natural());

    assert!(plugin.events().on_creature_spawn(&mut natural));
    assert!(!plugin.events().on_creature_spawn(&mut egg));
    assert!(!plugin.events().on_creature_spawn(&mut elsewhere));

    let metrics = plugin.metrics();
    assert_eq!(metrics.spawns_checked.load(Ordering::Relaxed), 3);
    assert_eq!(metrics.spawns_prevented.load(Ordering::Relaxed), 1);
}

#[test]
fn test_disable_persists_configuration() {
    let temp_dir = TempDir::new().unwrap();
    let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    let manager = ConfigManager::new(&dir).unwrap();
    let store = Arc::new(ConfigStore::load(manager.clone()).unwrap());
    store.add_exempt_world("lobby").unwrap();

    let host = Arc::new(InMemoryHost::new());
    let (main_thread, _runner) = MainThread::channel(8);
    let plugin = SlimeAnnihilator::enable(store, host.clone(), host, main_thread);

    // Saving on disable does not depend on earlier writes
    fs::remove_file(manager.config_path()).unwrap();
    plugin.disable().unwrap();

    let saved = manager.load_config().unwrap();
    assert!(saved.is_world_exempt("lobby"));
}

#[test]
fn test_events_see_runtime_config_changes() {
    let host = flat_server();
    let (main_thread, _runner) = MainThread::channel(8);
    let plugin = SlimeAnnihilator::enable(
        Arc::new(ConfigStore::in_memory(SlimeConfig::default())),
        host.clone(),
        host,
        main_thread,
    );

    plugin.config().add_exempt_world("flat_world").unwrap();

    let mut attempt = SpawnAttempt::new(EntityKind::Slime, "flat_world", SpawnReason::natural());
    assert!(!plugin.events().on_creature_spawn(&mut attempt));
    assert!(plugin.operations().classifier().is_exempt("flat_world"));
}
