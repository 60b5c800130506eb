//! HID protocol constants, report decoders and feature-report encoders for the
//! Oculus Rift DK1 head tracker.
//!
//! The DK1 tracker enumerates as a USB HID device (VID `0x2833`, PID `0x0001`)
//! and streams 62-byte interrupt reports carrying up to three
//! accelerometer/gyroscope samples plus one magnetometer reading. Control
//! happens through small feature reports (keep-alive, sensor config, scale
//! range) and calibration data is fetched with the DisplayInfo feature report.
//!
//! ## Design
//! This crate is intentionally I/O-free and allocation-free. It provides only
//! constants, pure decode/encode functions and plain data types that can be
//! tested without hardware.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod codec;
pub mod feature;
pub mod ids;
pub mod range;
pub mod tracker;

pub use codec::{
    S21_MAX, S21_MIN, decode_f32_le, decode_i16_le, decode_u16_le, decode_u32_le,
    pack_triple_s21, unpack_triple_s21,
};
pub use feature::{
    DISPLAY_INFO_LEN, DisplayInfo, DistortionBase, KEEP_ALIVE_LEN, SCALE_RANGE_LEN,
    SENSOR_CONFIG_LEN, SensorConfigFlags, decode_display_info, encode_keep_alive,
    encode_scale_range, encode_sensor_config, report_ids,
};
pub use ids::{PID_DK1, VENDOR_ID, is_rift_dk1};
pub use range::{ScaleRange, SensorRange, select_ramp_value};
pub use tracker::{
    MAX_SAMPLES_PER_REPORT, TRACKER_REPORT_ID, TRACKER_REPORT_LEN, TrackerReportBuilder, TrackerSample,
    TrackerSensors, decode_tracker_report,
};

use thiserror::Error;

/// Errors returned by the report decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The buffer was shorter than the fixed report layout.
    #[error("report too short: got {got} bytes, need {need}")]
    TooShort { got: usize, need: usize },

    /// The first byte did not carry the expected report ID.
    #[error("unexpected report id {got:#04x}, expected {expected:#04x}")]
    WrongReportId { got: u8, expected: u8 },
}
