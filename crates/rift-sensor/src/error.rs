//! Session error taxonomy.

use std::fmt;

use rift_hid_common::HidCommonError;
use rift_hid_dk1_protocol::DecodeError;

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info = 0,
    Warning = 1,
    Error = 2,
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Device session errors.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// No DK1 at the requested enumeration index.
    #[error("No Rift DK1 at index {index} ({found} found)")]
    DeviceNotFound { index: usize, found: usize },

    /// The OS refused access to the HID node.
    #[error("Permission denied opening tracker: {0}")]
    PermissionDenied(String),

    /// Open, read or write failed in the HID layer.
    #[error("Transport error: {0}")]
    Transport(#[source] HidCommonError),

    #[error("Malformed report: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid tracker configuration: {0}")]
    InvalidConfig(String),

    /// The sampling thread could not be started.
    #[error("Failed to spawn sampler thread: {0}")]
    Spawn(#[source] std::io::Error),
}

impl From<HidCommonError> for SensorError {
    fn from(err: HidCommonError) -> Self {
        match err {
            HidCommonError::PermissionDenied(path) => SensorError::PermissionDenied(path),
            other => SensorError::Transport(other),
        }
    }
}

impl SensorError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SensorError::DeviceNotFound { .. } => ErrorSeverity::Error,
            SensorError::PermissionDenied(_) => ErrorSeverity::Error,
            SensorError::Transport(HidCommonError::Disconnected) => ErrorSeverity::Critical,
            SensorError::Transport(_) => ErrorSeverity::Error,
            SensorError::Decode(_) => ErrorSeverity::Warning,
            SensorError::InvalidConfig(_) => ErrorSeverity::Error,
            SensorError::Spawn(_) => ErrorSeverity::Critical,
        }
    }

    /// Check if this error indicates the device is unavailable.
    pub fn is_device_unavailable(&self) -> bool {
        matches!(
            self,
            SensorError::DeviceNotFound { .. }
                | SensorError::PermissionDenied(_)
                | SensorError::Transport(
                    HidCommonError::Disconnected | HidCommonError::DeviceNotFound(_)
                )
        )
    }

    /// Check if retrying the operation might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SensorError::Decode(_)
                | SensorError::Transport(
                    HidCommonError::ReadError(_) | HidCommonError::WriteError(_)
                )
        )
    }
}

pub type SensorResult<T> = Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_is_distinct() {
        let err = SensorError::from(HidCommonError::PermissionDenied("/dev/hidraw3".into()));
        assert!(matches!(err, SensorError::PermissionDenied(_)));
        assert!(err.is_device_unavailable());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("Permission denied"));
    }

    #[test]
    fn test_not_found_message() {
        let err = SensorError::DeviceNotFound { index: 1, found: 0 };
        assert_eq!(err.to_string(), "No Rift DK1 at index 1 (0 found)");
        assert!(err.is_device_unavailable());
    }

    #[test]
    fn test_disconnect_is_critical() {
        let err = SensorError::from(HidCommonError::Disconnected);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.is_device_unavailable());
    }

    #[test]
    fn test_write_failure_is_retryable() {
        let err = SensorError::from(HidCommonError::WriteError("stall".into()));
        assert!(err.is_retryable());
        assert!(!err.is_device_unavailable());
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_decode_error_is_warning() {
        let err = SensorError::from(DecodeError::TooShort { got: 10, need: 62 });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }
}
