use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::serial::Pacing;

/// Environment variable naming a JSON config file
pub const CONFIG_ENV: &str = "PWRGATE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Monitor settings. Every field has a default matching the deployed unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Console serial device
    pub port: String,
    pub baud_rate: u32,
    /// Blocking read timeout; two in a row end the session
    pub read_timeout_ms: u64,
    pub byte_delay_ms: u64,
    pub cr_settle_ms: u64,
    pub key_settle_ms: u64,
    /// Readings buffered between the session and the aggregator
    pub queue_capacity: usize,
    /// How far back the summary looks
    pub window_secs: u64,
    /// How often the summary is logged
    pub report_interval_secs: u64,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port: crate::serial::interface::DEFAULT_PORT.to_string(),
            baud_rate: crate::serial::interface::BAUD_RATE,
            read_timeout_ms: crate::serial::interface::READ_TIMEOUT.as_millis() as u64,
            byte_delay_ms: 10,
            cr_settle_ms: 100,
            key_settle_ms: 250,
            queue_capacity: 10,
            window_secs: 300,
            report_interval_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Load from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                serde_json::from_str::<MonitorConfig>(&text)?
            }
            None => MonitorConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config path from an explicit argument or `PWRGATE_CONFIG`
    pub fn from_args_or_env(arg: Option<String>) -> Result<Self, ConfigError> {
        let path = arg.or_else(|| std::env::var(CONFIG_ENV).ok()).map(PathBuf::from);
        Self::load(path.as_deref())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port.trim().is_empty() {
            return Err(ConfigError::Invalid("port must not be empty".to_string()));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be positive".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be positive".to_string()));
        }
        if self.window_secs == 0 {
            return Err(ConfigError::Invalid("window_secs must be positive".to_string()));
        }
        if self.report_interval_secs == 0 {
            return Err(ConfigError::Invalid("report_interval_secs must be positive".to_string()));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    pub fn pacing(&self) -> Pacing {
        Pacing::new(
            Duration::from_millis(self.byte_delay_ms),
            Duration::from_millis(self.cr_settle_ms),
            Duration::from_millis(self.key_settle_ms),
        )
    }
}
