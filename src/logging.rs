use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

/// Where and how the plugin logs.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Directory for daily rotated log files
    pub log_dir: Utf8PathBuf,
    /// File name prefix for log files
    pub prefix: String,
    /// Mirrors the `debug-messages` config flag
    pub debug: bool,
    /// Also write to the console with ANSI colors
    pub console: bool,
}

impl LogSettings {
    pub fn new(log_dir: impl Into<Utf8PathBuf>, prefix: &str) -> Self {
        Self {
            log_dir: log_dir.into(),
            prefix: prefix.to_string(),
            debug: false,
            console: true,
        }
    }
}

/// Build the level filter.
///
/// `RUST_LOG` wins when set. Otherwise the plugin's own target logs at
/// debug when `debug` is true, and everything else at info.
pub fn build_filter(debug: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    if debug {
        EnvFilter::new("info,slime_annihilator=debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Runtime switch for the debug level of an installed subscriber.
///
/// Cheap to clone; every clone drives the same filter.
#[derive(Clone)]
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    debug: Arc<AtomicBool>,
}

impl LogControl {
    /// Swap in the filter for `debug`. Does nothing if it is already active.
    pub fn set_debug(&self, debug: bool) -> Result<()> {
        if self.debug.swap(debug, Ordering::SeqCst) == debug {
            return Ok(());
        }

        if let Err(e) = self.handle.reload(build_filter(debug)) {
            self.debug.store(!debug, Ordering::SeqCst);
            return Err(e).context("Failed to swap log filter");
        }

        let state = if debug { "enabled" } else { "disabled" };
        tracing::info!("Debug logging {}", state);
        Ok(())
    }

    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::SeqCst)
    }
}

/// A filter layer for the root of a subscriber, plus the control that can
/// later switch it between normal and debug levels.
pub fn reloadable_filter(debug: bool) -> (reload::Layer<EnvFilter, Registry>, LogControl) {
    let (layer, handle) = reload::Layer::new(build_filter(debug));
    let control = LogControl {
        handle,
        debug: Arc::new(AtomicBool::new(debug)),
    };
    (layer, control)
}

/// Setup logging with a daily rotating file appender and optional console output.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging
/// active, and the [`LogControl`] that follows the `debug-messages` setting
///
/// # Errors
/// Fails if the log directory cannot be created or a global subscriber is
/// already installed.
pub fn setup_logging(settings: &LogSettings) -> Result<(WorkerGuard, LogControl)> {
    if !settings.log_dir.exists() {
        fs::create_dir_all(&settings.log_dir)
            .with_context(|| format!("Failed to create log directory: {}", settings.log_dir))?;
    }

    let file_appender = rolling::daily(&settings.log_dir, &settings.prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_names(true)
        .with_line_number(true);

    let console_layer = settings.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(false)
    });

    let (filter, control) = reloadable_filter(settings.debug);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}",
        settings.log_dir,
        settings.prefix,
        settings.debug,
        settings.console
    );

    Ok((guard, control))
}
