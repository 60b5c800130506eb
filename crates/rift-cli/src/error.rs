//! Error types for riftctl

use rift_sensor::SensorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Tracker error: {0}")]
    Tracker(#[source] SensorError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<SensorError> for CliError {
    fn from(err: SensorError) -> Self {
        match err {
            SensorError::DeviceNotFound { index, found } => CliError::DeviceNotFound(format!(
                "no Rift DK1 at index {index} ({found} attached); check the cable and power"
            )),
            SensorError::PermissionDenied(path) => CliError::PermissionDenied(format!(
                "{path}; the tracker is attached but not readable by this user \
                 (on Linux add a udev rule for 2833:0001)"
            )),
            SensorError::InvalidConfig(msg) => CliError::InvalidConfiguration(msg),
            other => CliError::Tracker(other),
        }
    }
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::DeviceNotFound(_) => 2,
            CliError::InvalidConfiguration(_) | CliError::JsonError(_) => 4,
            CliError::PermissionDenied(_) => 6,
            CliError::Tracker(_) | CliError::IoError(_) => 1,
        }
    }
}
