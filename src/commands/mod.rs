//! `/slimes` command front.
//!
//! Parses subcommands, resolves the target world, calls into
//! [`SlimeOperations`] / [`ConfigStore`] and renders replies as [`Message`]s.
//! Destructive commands on non-flat worlds go through the
//! [`ConfirmationLedger`] when `require-confirmation-for-non-flat-worlds` is on.

pub mod confirmation;

pub use confirmation::{ConfirmOutcome, ConfirmationLedger};

use crate::host::WorldRegistry;
use crate::metrics::Metrics;
use crate::services::{RemovalError, SlimeOperations};
use crate::models::SpawnReason;
use crate::state::ConfigStore;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use thiserror::Error;

/// Name of the command the plugin registers.
pub const COMMAND_NAME: &str = "slimes";

/// All subcommands, in help order.
pub const SUBCOMMANDS: [&str; 12] = [
    "nuke",
    "disable",
    "enable",
    "info",
    "exempt",
    "unexempt",
    "confirm",
    "reload",
    "config",
    "setflat",
    "unsetflat",
    "listflat",
];

/// Subcommands that take no world argument.
const WORLDLESS: [&str; 4] = ["confirm", "reload", "config", "listflat"];

/// Who issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Console,
    Player { name: String, world: String },
}

impl Actor {
    pub fn player(name: &str, world: &str) -> Self {
        Actor::Player {
            name: name.to_string(),
            world: world.to_string(),
        }
    }

    /// Key used for confirmation requests.
    pub fn name(&self) -> &str {
        match self {
            Actor::Console => "CONSOLE",
            Actor::Player { name, .. } => name,
        }
    }

    pub fn current_world(&self) -> Option<&str> {
        match self {
            Actor::Console => None,
            Actor::Player { world, .. } => Some(world),
        }
    }
}

/// Presentation hint for a reply line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Heading,
    Info,
    Success,
    Warning,
    Error,
    Detail,
}

/// One line of command output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub tone: Tone,
    pub text: String,
}

impl Message {
    fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self::new(Tone::Heading, text)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Tone::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Tone::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Tone::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Tone::Error, text)
    }

    pub fn detail(text: impl Into<String>) -> Self {
        Self::new(Tone::Detail, text)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Errors reported back to the command sender
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("World '{0}' not found!")]
    WorldNotFound(String),

    #[error("You must specify a world when running from console!")]
    WorldRequired,

    #[error("Could not save configuration: {0}")]
    Persistence(#[from] anyhow::Error),

    #[error("Could not read slimes in world '{world}': {source}")]
    Host {
        world: String,
        #[source]
        source: crate::host::HostError,
    },

    #[error("Could not remove slimes from world '{world}': {source}")]
    Removal {
        world: String,
        #[source]
        source: RemovalError,
    },
}

type CommandResult = Result<Vec<Message>, CommandError>;

/// Executes `/slimes` subcommands on behalf of an [`Actor`].
pub struct CommandFront {
    ops: Arc<SlimeOperations>,
    config: Arc<ConfigStore>,
    registry: Arc<dyn WorldRegistry>,
    metrics: Arc<Metrics>,
    ledger: Mutex<ConfirmationLedger>,
}

impl CommandFront {
    pub fn new(
        ops: Arc<SlimeOperations>,
        config: Arc<ConfigStore>,
        registry: Arc<dyn WorldRegistry>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            ops,
            config,
            registry,
            metrics,
            ledger: Mutex::new(ConfirmationLedger::new()),
        }
    }

    /// Run a command line such as `["nuke", "world"]`.
    pub async fn execute(&self, actor: &Actor, args: &[&str]) -> Vec<Message> {
        self.execute_at(actor, args, Instant::now()).await
    }

    /// [`execute`](Self::execute) with an explicit clock reading for the
    /// confirmation ledger.
    pub async fn execute_at(&self, actor: &Actor, args: &[&str], now: Instant) -> Vec<Message> {
        self.metrics.record_command();

        let Some(subcommand) = args.first() else {
            return help();
        };

        tracing::debug!("{} issued /{} {}", actor.name(), COMMAND_NAME, args.join(" "));

        let result = match subcommand.to_lowercase().as_str() {
            "nuke" => self.nuke(actor, args, now).await,
            "disable" => self.disable(actor, args),
            "enable" => self.enable(actor, args),
            "info" => self.info(actor, args),
            "confirm" => self.confirm(actor, now).await,
            "exempt" => self.exempt(actor, args),
            "unexempt" => self.unexempt(actor, args),
            "reload" => self.reload(),
            "config" => Ok(self.show_config(args)),
            "setflat" => self.set_flat(actor, args),
            "unsetflat" => self.unset_flat(actor, args),
            "listflat" => Ok(self.list_flat()),
            _ => Ok(help()),
        };

        result.unwrap_or_else(|e| {
            if matches!(e, CommandError::Persistence(_) | CommandError::Removal { .. }) {
                tracing::error!("{}", e);
            }
            vec![Message::error(e.to_string())]
        })
    }

    /// Tab completion for a partially typed command line.
    pub fn complete(&self, args: &[&str]) -> Vec<String> {
        match args {
            [partial] => {
                let partial = partial.to_lowercase();
                SUBCOMMANDS
                    .iter()
                    .filter(|s| s.starts_with(&partial))
                    .map(|s| s.to_string())
                    .collect()
            }
            [subcommand, partial] if !WORLDLESS.contains(&subcommand.to_lowercase().as_str()) => {
                let partial = partial.to_lowercase();
                self.registry
                    .world_names()
                    .into_iter()
                    .filter(|name| name.to_lowercase().starts_with(&partial))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn target_world(&self, actor: &Actor, args: &[&str]) -> Result<String, CommandError> {
        if let Some(name) = args.get(1) {
            if self.registry.has_world(name) {
                return Ok(name.to_string());
            }
            return Err(CommandError::WorldNotFound(name.to_string()));
        }

        actor
            .current_world()
            .map(str::to_string)
            .ok_or(CommandError::WorldRequired)
    }

    async fn remove(&self, world: &str) -> Result<usize, CommandError> {
        self.ops
            .try_remove_all_matching_async(world)
            .await
            .map_err(|source| CommandError::Removal {
                world: world.to_string(),
                source,
            })
    }

    fn count(&self, world: &str) -> Result<usize, CommandError> {
        self.ops
            .count_matching(world)
            .map_err(|source| CommandError::Host {
                world: world.to_string(),
                source,
            })
    }

    async fn nuke(&self, actor: &Actor, args: &[&str], now: Instant) -> CommandResult {
        let world = self.target_world(actor, args)?;
        let classifier = self.ops.classifier();

        if classifier.is_exempt(&world) {
            return Ok(vec![
                Message::warning(format!(
                    "World '{}' is exempt from slime management!",
                    world
                )),
                Message::warning(format!(
                    "Use /{} unexempt {} first if you want to manage slimes in this world.",
                    COMMAND_NAME, world
                )),
            ]);
        }

        let (require_confirmation, timeout) = self.config.read(|c| {
            (
                c.require_confirmation_for_non_flat_worlds,
                c.confirmation_timeout(),
            )
        });

        if require_confirmation && !classifier.is_flat(&world) {
            let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
            if !ledger.is_pending(actor.name(), &world, now, timeout) {
                ledger.request(actor.name(), &world, now);
                return Ok(vec![
                    Message::warning(format!("Warning: World '{}' is not a flat world!", world)),
                    Message::warning("Are you sure you want to remove all slimes?"),
                    Message::warning(format!(
                        "Type /{} confirm within {} seconds to proceed.",
                        COMMAND_NAME,
                        timeout.as_secs()
                    )),
                ]);
            }
            // Repeating the command within the window counts as confirmation
            ledger.cancel(actor.name());
        }

        let slime_count = self.count(&world)?;
        if slime_count == 0 {
            return Ok(vec![Message::success(format!(
                "No slimes found in world '{}'!",
                world
            ))]);
        }

        let mut replies = vec![Message::warning(format!(
            "Removing {} slimes from world '{}'...",
            slime_count, world
        ))];

        let removed = match self.remove(&world).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::error!("{}", e);
                replies.push(Message::error(e.to_string()));
                return Ok(replies);
            }
        };
        replies.push(Message::success(format!(
            "Successfully removed {} slimes from world '{}'!",
            removed, world
        )));

        Ok(replies)
    }

    async fn confirm(&self, actor: &Actor, now: Instant) -> CommandResult {
        let timeout = self.config.read(|c| c.confirmation_timeout());
        let outcome = self
            .ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .confirm(actor.name(), now, timeout);

        match outcome {
            ConfirmOutcome::NoPending => Ok(vec![Message::error(
                "No pending confirmation request found!",
            )]),
            ConfirmOutcome::Expired(world) => {
                tracing::debug!("Confirmation by {} for '{}' expired", actor.name(), world);
                Ok(vec![Message::error("Confirmation request expired!")])
            }
            ConfirmOutcome::Confirmed(world) => {
                if !self.registry.has_world(&world) {
                    return Ok(vec![Message::error("World no longer exists!")]);
                }

                let removed = self.remove(&world).await?;
                Ok(vec![Message::success(format!(
                    "Confirmed! Removed {} slimes from world '{}'!",
                    removed, world
                ))])
            }
        }
    }

    fn disable(&self, actor: &Actor, args: &[&str]) -> CommandResult {
        let world = self.target_world(actor, args)?;

        if self.ops.policy().is_spawning_disabled(&world) {
            return Ok(vec![Message::warning(format!(
                "Slime spawning is already disabled in world '{}'!",
                world
            ))]);
        }

        self.ops.disable_spawning(&world)?;
        Ok(vec![Message::success(format!(
            "Slime spawning disabled in world '{}'!",
            world
        ))])
    }

    fn enable(&self, actor: &Actor, args: &[&str]) -> CommandResult {
        let world = self.target_world(actor, args)?;
        let policy = self.ops.policy();

        if !policy.is_spawning_disabled(&world) {
            return Ok(vec![Message::warning(format!(
                "Slime spawning is already enabled in world '{}'!",
                world
            ))]);
        }

        self.ops.enable_spawning(&world)?;
        let mut replies = vec![Message::success(format!(
            "Slime spawning enabled in world '{}'!",
            world
        ))];

        // Lifting a manual disable leaves the flat world rule in force
        if policy.is_spawning_disabled(&world) {
            replies.push(Message::detail(
                "Note: Natural spawning is still blocked due to flat world restrictions",
            ));
        }

        Ok(replies)
    }

    fn info(&self, actor: &Actor, args: &[&str]) -> CommandResult {
        let world = self.target_world(actor, args)?;
        let info = self
            .ops
            .slime_info(&world)
            .map_err(|source| CommandError::Host {
                world: world.clone(),
                source,
            })?;

        let mut replies = vec![
            Message::heading(format!("=== Slime Info for '{}' ===", info.world_name)),
            Message::info(format!("Slime Count: {}", info.slime_count)),
            Message::info(format!(
                "World Type: {}",
                if info.is_flat { "FLAT" } else { "NORMAL" }
            )),
            Message::info(format!(
                "Exempt: {}",
                if info.is_exempt { "YES" } else { "NO" }
            )),
        ];

        if info.is_exempt {
            replies.push(Message::success(
                "This world is exempt from all slime management.",
            ));
            replies.push(Message::success(
                "All slime spawning methods are allowed normally.",
            ));
            return Ok(replies);
        }

        let policy = self.ops.policy();
        let state = |disabled: bool| if disabled { "DISABLED" } else { "ENABLED" };

        replies.push(Message::info(format!(
            "Natural Spawning: {}",
            state(info.spawning_disabled)
        )));
        for (label, reason) in [
            ("Egg", SpawnReason::SpawnerEgg),
            ("Command", SpawnReason::Command),
            ("Custom", SpawnReason::Custom),
        ] {
            replies.push(Message::info(format!(
                "{} Spawning: {}",
                label,
                state(policy.should_prevent(&world, &reason))
            )));
        }

        if info.is_flat && self.config.read(|c| c.prevent_spawning_in_flat_worlds) {
            replies.push(Message::detail(
                "Note: Natural spawning blocked due to flat world restrictions",
            ));
        }

        Ok(replies)
    }

    fn exempt(&self, actor: &Actor, args: &[&str]) -> CommandResult {
        let world = self.target_world(actor, args)?;

        if !self.ops.add_exempt_world(&world)? {
            return Ok(vec![Message::warning(format!(
                "World '{}' is already exempt!",
                world
            ))]);
        }

        Ok(vec![Message::success(format!(
            "World '{}' is now exempt from slime management!",
            world
        ))])
    }

    fn unexempt(&self, actor: &Actor, args: &[&str]) -> CommandResult {
        let world = self.target_world(actor, args)?;

        if !self.ops.remove_exempt_world(&world)? {
            return Ok(vec![Message::warning(format!(
                "World '{}' is not exempt!",
                world
            ))]);
        }

        Ok(vec![Message::success(format!(
            "World '{}' is no longer exempt from slime management!",
            world
        ))])
    }

    fn reload(&self) -> CommandResult {
        self.config.reload()?;
        tracing::info!("Configuration reloaded by command");
        Ok(vec![Message::success("Configuration reloaded!")])
    }

    fn show_config(&self, args: &[&str]) -> Vec<Message> {
        if args.len() > 1 {
            return vec![Message::error(format!(
                "Config modification via commands is not supported. Edit config.yml and use /{} reload.",
                COMMAND_NAME
            ))];
        }

        let config = self.config.snapshot();
        vec![
            Message::heading("=== SlimeAnnihilator Configuration ==="),
            Message::info(format!(
                "Auto remove on startup: {}",
                config.auto_remove_on_startup
            )),
            Message::info(format!(
                "Prevent spawning in flat worlds: {}",
                config.prevent_spawning_in_flat_worlds
            )),
            Message::info(format!(
                "Require confirmation for non-flat: {}",
                config.require_confirmation_for_non_flat_worlds
            )),
            Message::info(format!(
                "Confirmation timeout: {}s",
                config.confirmation_timeout_seconds
            )),
            Message::info(format!("Prevent egg spawning: {}", config.prevent_egg_spawning)),
            Message::info(format!(
                "Prevent command spawning: {}",
                config.prevent_command_spawning
            )),
            Message::info(format!(
                "Prevent custom spawning: {}",
                config.prevent_custom_spawning
            )),
            Message::info(format!("Debug messages: {}", config.enable_debug_messages)),
        ]
    }

    fn set_flat(&self, actor: &Actor, args: &[&str]) -> CommandResult {
        let world = self.target_world(actor, args)?;

        if !self.config.add_flat_world(&world)? {
            return Ok(vec![Message::warning(format!(
                "World '{}' is already marked as flat!",
                world
            ))]);
        }

        Ok(vec![Message::success(format!(
            "World '{}' is now marked as a flat world!",
            world
        ))])
    }

    fn unset_flat(&self, actor: &Actor, args: &[&str]) -> CommandResult {
        let world = self.target_world(actor, args)?;

        if !self.config.remove_flat_world(&world)? {
            return Ok(vec![Message::warning(format!(
                "World '{}' is not marked as flat!",
                world
            ))]);
        }

        Ok(vec![Message::success(format!(
            "World '{}' is no longer marked as a flat world!",
            world
        ))])
    }

    fn list_flat(&self) -> Vec<Message> {
        let manual = self.config.read(|c| c.flat_worlds.clone());
        let mut replies = vec![Message::heading("=== Flat Worlds ===")];

        if manual.is_empty() {
            replies.push(Message::warning("No worlds are manually marked as flat."));
        } else {
            replies.push(Message::info("Manually configured flat worlds:"));
            replies.extend(manual.iter().map(|w| Message::detail(format!("  - {}", w))));
        }

        replies.push(Message::info("Auto-detected flat worlds:"));
        let classifier = self.ops.classifier();
        let detected: Vec<String> = self
            .registry
            .world_names()
            .into_iter()
            .filter(|w| classifier.detect(w).is_auto_detected())
            .collect();

        if detected.is_empty() {
            replies.push(Message::detail("  No auto-detected flat worlds found."));
        } else {
            replies.extend(
                detected
                    .iter()
                    .map(|w| Message::detail(format!("  - {} (auto-detected)", w))),
            );
        }

        replies
    }
}

/// Usage summary shown for no or unknown subcommands.
pub fn help() -> Vec<Message> {
    let usage = [
        ("nuke [world]", "Remove all slimes from a world"),
        ("disable [world]", "Disable slime spawning"),
        ("enable [world]", "Enable slime spawning"),
        ("info [world]", "Show slime information"),
        ("exempt [world]", "Exempt world from slime management"),
        ("unexempt [world]", "Remove world exemption"),
        ("confirm", "Confirm pending action"),
        ("reload", "Reload configuration"),
        ("config", "Show current configuration"),
        ("setflat [world]", "Mark world as flat"),
        ("unsetflat [world]", "Unmark world as flat"),
        ("listflat", "List all flat worlds"),
    ];

    let mut lines = vec![Message::heading("=== Slime Annihilator Commands ===")];
    lines.extend(
        usage
            .iter()
            .map(|(syntax, what)| Message::info(format!("/{} {} - {}", COMMAND_NAME, syntax, what))),
    );
    lines
}
