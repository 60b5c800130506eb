//! HID transport seam for the Rift tracker.
//!
//! The session layer talks to hardware only through [`HidBackend`] and
//! [`HidTransport`]. A scripted in-memory implementation lives in
//! [`hid_traits::mock`]; the real `hidapi` backend is behind the `hidapi`
//! feature.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod device_info;
pub mod hid_traits;
#[cfg(feature = "hidapi")]
pub mod hidapi_backend;

pub use device_info::*;
pub use hid_traits::*;
#[cfg(feature = "hidapi")]
pub use hidapi_backend::{HidApiBackend, HidApiTransport};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HidCommonError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to open device: {0}")]
    OpenError(String),

    #[error("Failed to read from device: {0}")]
    ReadError(String),

    #[error("Failed to write to device: {0}")]
    WriteError(String),

    #[error("Invalid report format: {0}")]
    InvalidReport(String),

    #[error("Device disconnected")]
    Disconnected,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl HidCommonError {
    /// Guess whether an OS/HID error message describes an access problem.
    pub fn looks_like_permission_error(message: &str) -> bool {
        let lower = message.to_ascii_lowercase();
        lower.contains("permission") || lower.contains("access denied") || lower.contains("eacces")
    }
}

pub type HidCommonResult<T> = Result<T, HidCommonError>;
