//! Global kith configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{KithError, KithResult};

static DEFAULT_DATA_DIR: &str = "~/.local/share/kith";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_port() -> u16 {
    4820
}

/// Global configuration at ~/.config/kith/config.toml
///
/// A missing file yields the defaults; a malformed file is an error.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub mail: MailConfig,
}

/// Settings for the outgoing invite-mail relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailConfig {
    /// SendGrid API key; unset (and no SENDGRID_API_KEY in the
    /// environment) disables outgoing mail
    pub api_key: Option<String>,

    pub from_address: Option<String>,

    /// Base URL used in invite links when a request carries no origin
    pub app_url: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            data_dir: default_data_dir(),
            port: default_port(),
            mail: MailConfig::default(),
        }
    }
}

impl GlobalConfig {
    pub fn config_path() -> KithResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| KithError::Config("Could not determine config directory".into()))?
            .join("kith");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> KithResult<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        let raw = std::fs::read_to_string(&path)?;
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> KithResult<Self> {
        toml::from_str(raw).map_err(|e| KithError::Config(format!("Invalid config file: {}", e)))
    }

    /// Data directory with the leading tilde expanded.
    pub fn data_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_path().join("kith.db")
    }
}
