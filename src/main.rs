//! SlimeAnnihilator console host
//!
//! Runs the plugin against an in-memory server so it can be driven from a
//! terminal. It initializes:
//! - Logging infrastructure (file rotation + console output)
//! - Tokio async runtime for command handling and scheduled work
//! - The main-thread executor on a dedicated OS thread
//! - Configuration loading ([`ConfigManager`])
//! - The in-memory world host ([`InMemoryHost`])
//!
//! # Execution Flow
//!
//! 1. Load `SlimeAnnihilator Data/config.yml` (written with defaults if missing)
//! 2. Initialize logging → logs/slime-annihilator.<date>
//! 3. Populate worlds from `SlimeAnnihilator Data/worlds.yml` if present
//! 4. Enable the plugin and schedule the startup sweep
//! 5. Read commands from stdin until EOF
//! 6. Disable the plugin (saves config), stop the runtime and main thread
//!
//! # Console input
//!
//! - `/slimes <subcommand> [world]` (the `/slimes` prefix is optional)
//!   runs a command as the console
//! - `as <player> <world> <subcommand> [world]` runs a command as a player
//!   standing in `<world>`
//! - `spawn <world> [entity] [reason]` simulates a creature spawn attempt

use anyhow::Result;
use camino::Utf8Path;
use slime_annihilator::commands::{COMMAND_NAME, Tone};
use slime_annihilator::host::{EntityScanner, WorldRegistry};
use slime_annihilator::logging::{LogSettings, setup_logging};
use slime_annihilator::{
    APP_NAME, Actor, ConfigManager, ConfigStore, EntityKind, InMemoryHost, MainThread, Message,
    SlimeAnnihilator, SpawnAttempt, SpawnReason, VERSION,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const DATA_DIR: &str = "SlimeAnnihilator Data";
const WORLDS_FILE: &str = "worlds.yml";

/// Jobs the main thread may have queued before callers start waiting.
const MAIN_THREAD_QUEUE: usize = 64;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(DATA_DIR)?;
    let config = config_manager.load_config()?;

    let mut log_settings = LogSettings::new("logs", APP_NAME);
    log_settings.debug = config.enable_debug_messages;
    let (_log_guard, log_control) = setup_logging(&log_settings)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("slimes-worker")
        .build()?;

    tracing::info!("Tokio runtime initialized with {} worker threads", 2);

    let config = Arc::new(ConfigStore::new(config, config_manager));
    let host = Arc::new(load_host(&Utf8Path::new(DATA_DIR).join(WORLDS_FILE))?);

    let (main_thread, runner) = MainThread::channel(MAIN_THREAD_QUEUE);
    let runner_thread = std::thread::Builder::new()
        .name("main-thread".to_string())
        .spawn(move || runner.run_blocking())?;

    let registry: Arc<dyn WorldRegistry> = host.clone();
    let entities: Arc<dyn EntityScanner> = host.clone();
    let plugin = SlimeAnnihilator::enable(config, registry, entities, main_thread);

    let result = runtime.block_on(async {
        let _debug_follower = plugin.follow_debug_setting(log_control);
        let _startup = plugin.schedule_startup_removal();
        console_loop(&plugin, &host).await
    });

    tracing::info!("Console closed, shutting down");

    if let Err(e) = plugin.disable() {
        tracing::error!("{:#}", e);
    }

    // Dropping every MainThread handle lets the runner thread finish
    drop(plugin);
    runtime.shutdown_timeout(Duration::from_secs(5));
    if runner_thread.join().is_err() {
        tracing::error!("Main thread runner panicked");
    }

    tracing::info!("Shutdown complete");
    result
}

fn load_host(worlds_path: &Utf8Path) -> Result<InMemoryHost> {
    if !worlds_path.exists() {
        tracing::warn!(
            "No world fixtures at {}, starting with a single empty 'world'",
            worlds_path
        );
        let host = InMemoryHost::new();
        host.add_world("world", None);
        return Ok(host);
    }

    let fixtures = InMemoryHost::load_fixtures(worlds_path)?;
    tracing::info!("Loaded {} worlds from {}", fixtures.len(), worlds_path);
    Ok(InMemoryHost::from_fixtures(&fixtures))
}

async fn console_loop(plugin: &SlimeAnnihilator, host: &InMemoryHost) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["spawn", world, rest @ ..] => simulate_spawn(plugin, host, world, rest),
            ["as", player, world, args @ ..] => {
                let actor = Actor::player(player, world);
                print_messages(&plugin.commands().execute(&actor, strip_prefix(args)).await);
            }
            args => {
                print_messages(
                    &plugin
                        .commands()
                        .execute(&Actor::Console, strip_prefix(args))
                        .await,
                );
            }
        }
    }

    Ok(())
}

fn strip_prefix<'a>(args: &'a [&'a str]) -> &'a [&'a str] {
    match args {
        [first, rest @ ..] if first.trim_start_matches('/') == COMMAND_NAME => rest,
        _ => args,
    }
}

fn simulate_spawn(plugin: &SlimeAnnihilator, host: &InMemoryHost, world: &str, rest: &[&str]) {
    let kind = rest
        .first()
        .map(|name| EntityKind::from_name(name))
        .unwrap_or(EntityKind::Slime);
    let reason = rest
        .get(1)
        .map(|label| SpawnReason::from_host(label))
        .unwrap_or_else(SpawnReason::natural);

    let mut attempt = SpawnAttempt::new(kind.clone(), world, reason);
    plugin.events().on_creature_spawn(&mut attempt);

    if attempt.cancelled {
        println!("{} spawn in '{}' was cancelled", kind, world);
    } else if host.spawn(world, kind.clone()).is_some() {
        println!("{} spawned in '{}'", kind, world);
    } else {
        println!("World '{}' not found!", world);
    }
}

fn print_messages(messages: &[Message]) {
    for message in messages {
        match message.tone {
            Tone::Error | Tone::Warning => eprintln!("{}", message),
            _ => println!("{}", message),
        }
    }
}
