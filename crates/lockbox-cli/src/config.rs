//! Configuration file handling.
//!
//! Reads from `~/.config/lockbox/lockbox.toml`

use anyhow::{Context, Result};
use lockbox_core::{DEFAULT_VAULT_FILE, MIN_PASSWORD_LENGTH};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the encrypted container file.
    #[serde(default = "default_vault_path")]
    pub vault_path: PathBuf,
    /// Category used when `add` is given none.
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Length of generated secrets.
    #[serde(default = "default_password_length")]
    pub password_length: usize,
}

fn default_vault_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lockbox")
        .join(DEFAULT_VAULT_FILE)
}

fn default_category() -> String {
    "other".to_string()
}

fn default_password_length() -> usize {
    16
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_path: default_vault_path(),
            default_category: default_category(),
            password_length: default_password_length(),
        }
    }
}

impl Config {
    /// Load configuration from the config file.
    ///
    /// If `custom_path` is provided, load from that path.
    /// Otherwise, load from the default XDG config location.
    /// Creates a default config file if it doesn't exist (only for default path).
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self> {
        let is_custom = custom_path.is_some();
        let config_path = match custom_path {
            Some(path) => path,
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            if !is_custom {
                let config = Config::default();
                config.save_to(&config_path)?;
                tracing::info!("Created default config at {}", config_path.display());
                return Ok(config);
            } else {
                anyhow::bail!("Config file not found: {}", config_path.display());
            }
        }

        Self::load_from(&config_path)
    }

    fn load_from(config_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        if config.password_length < MIN_PASSWORD_LENGTH {
            tracing::warn!(
                "password_length {} is below the minimum, using {}",
                config.password_length,
                MIN_PASSWORD_LENGTH
            );
            config.password_length = MIN_PASSWORD_LENGTH;
        }
        if config.default_category.trim().is_empty() {
            config.default_category = default_category();
        }

        tracing::debug!("Loaded config from {}: {:?}", config_path.display(), config);
        Ok(config)
    }

    /// Save configuration to `config_path`.
    fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))
    }

    /// Get the path to the config file.
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("lockbox").join("lockbox.toml"))
    }
}
