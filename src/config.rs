//! Configuration for the presence agent.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scheduler::{DEFAULT_TICK, DEFAULT_TOLERANCE};
use crate::sink::remote::DEFAULT_IDLE_TIMEOUT;

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for the local log files
    pub local_root: PathBuf,

    /// Remote log store credentials; absent means local-only operation
    pub remote: Option<RemoteSettings>,

    /// Scheduler tick period
    #[serde(with = "duration_serde")]
    pub tick_period: Duration,

    /// Interval-match tolerance; keep strictly below the tick period
    #[serde(with = "duration_serde")]
    pub tick_tolerance: Duration,

    /// Idle period after which the remote session is closed
    #[serde(with = "duration_serde")]
    pub idle_timeout: Duration,

    /// Subjects tracked from startup; others are adopted as observed
    pub subjects: Vec<String>,

    /// Recipient for the direct-message sink, if any
    pub direct_message_recipient: Option<String>,

    /// The agent's own chat identity, used for echo suppression
    pub own_name: String,
}

/// Credentials for the remote log store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("presence-agent");

        Self {
            local_root: data_dir.join("reports"),
            remote: None,
            tick_period: DEFAULT_TICK,
            tick_tolerance: DEFAULT_TOLERANCE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            subjects: Vec::new(),
            direct_message_recipient: None,
            own_name: "presence-agent".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("presence-agent")
            .join("config.json")
    }

    /// Ensure the local report root exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.local_root)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration, stored as milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
