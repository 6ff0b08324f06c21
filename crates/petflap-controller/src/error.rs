use crate::config::ButtonThresholds;
use thiserror::Error;

/// Problems with a [`FlapConfig`](crate::FlapConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration value {field}={value} out of range")]
    OutOfRange { field: &'static str, value: u32 },

    #[error("Button thresholds must be strictly increasing: {0:?}")]
    Thresholds(ButtonThresholds),
}

impl ConfigError {
    pub fn out_of_range(field: &'static str, value: u32) -> Self {
        ConfigError::OutOfRange { field, value }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
