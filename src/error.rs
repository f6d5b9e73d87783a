//! Top-level error type for the MQTT publish/subscribe client
//!
//! Maps every failure to the process exit status reported by the binary.

use crate::config::ConfigError;
use crate::transport::mqtt::MqttError;
use thiserror::Error;

/// Exit status for configuration problems
pub const EXIT_CONFIG: i32 = 1;
/// Exit status for connect, subscribe or publish failures
pub const EXIT_TRANSPORT: i32 = 2;

/// Main error type for client operations
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("MQTT error: {0}")]
    Mqtt(#[from] MqttError),

    #[error("Signal handling error: {0}")]
    Signal(#[source] std::io::Error),
}

impl AppError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => EXIT_CONFIG,
            AppError::Mqtt(_) | AppError::Signal(_) => EXIT_TRANSPORT,
        }
    }
}

/// Result type for client operations
pub type AppResult<T> = Result<T, AppError>;
