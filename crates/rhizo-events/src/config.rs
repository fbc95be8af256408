use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Level used when logging dropped notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Trace,
    Debug,
    Info,
    Warn,
}

/// Registry configuration (subscription map sizing, drop logging)
///
/// ```toml
/// shard_amount = 16
/// initial_capacity = 256
/// drop_log_level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Shard count for the subscription maps (power of two, > 1).
    /// `None` uses the dashmap default derived from available parallelism.
    pub shard_amount: Option<usize>,

    /// Initial capacity of each subscription map
    pub initial_capacity: usize,

    pub drop_log_level: LogLevel,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            shard_amount: None,
            initial_capacity: 0,
            drop_log_level: LogLevel::Trace,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: RegistryConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(shards) = self.shard_amount {
            if shards < 2 || !shards.is_power_of_two() {
                return Err(ConfigError::InvalidConfig(format!(
                    "shard_amount must be a power of two greater than 1, got {}",
                    shards
                )));
            }
        }
        Ok(())
    }
}
