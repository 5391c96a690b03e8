use crate::models::SlimeConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the plugin configuration inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Configuration manager for loading and saving the YAML plugin configuration.
///
/// The configuration lives at `<data dir>/config.yml`. A default document is
/// written the first time it is loaded, so operators always have a file to
/// edit before running `/slimes reload`.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified data directory.
    ///
    /// # Arguments
    /// * `config_dir` - Plugin data directory (e.g., "SlimeAnnihilator Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the plugin configuration.
    ///
    /// Missing keys fall back to their defaults. When the file does not exist
    /// the defaults are written to disk and returned.
    pub fn load_config(&self) -> Result<SlimeConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, writing defaults",
                self.config_path
            );
            let config = SlimeConfig::default();
            self.save_config(&config)?;
            return Ok(config);
        }

        let file_contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config: {}", self.config_path))?;

        // An empty file is a valid document with every key missing
        let config: SlimeConfig = if file_contents.trim().is_empty() {
            SlimeConfig::default()
        } else {
            serde_yaml_ng::from_str(&file_contents)
                .with_context(|| format!("Failed to parse config: {}", self.config_path))?
        };

        tracing::info!("Loaded config from {}", self.config_path);
        Ok(config)
    }

    /// Save the plugin configuration.
    pub fn save_config(&self, config: &SlimeConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write config: {}", self.config_path))?;

        tracing::debug!("Saved config to {}", self.config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Get the full path of `config.yml`.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
