//! Normalized motion samples.

use nalgebra::Vector3;
use rift_hid_dk1_protocol::{TrackerSample, TrackerSensors};

/// Raw tracker units per SI unit (10⁻⁴ m/s², rad/s, gauss).
const RAW_SCALE: f64 = 1e-4;
/// Raw temperature units per degree Celsius.
const TEMPERATURE_SCALE: f64 = 0.01;

/// One motion sample in SI units and logical axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageBodyFrame {
    /// m/s²
    pub acceleration: Vector3<f64>,
    /// rad/s
    pub rotation_rate: Vector3<f64>,
    /// gauss
    pub magnetic_field: Vector3<f64>,
    /// °C
    pub temperature: f64,
    /// Seconds since the previous frame.
    pub time_delta: f64,
}

impl Default for MessageBodyFrame {
    fn default() -> Self {
        Self {
            acceleration: Vector3::zeros(),
            rotation_rate: Vector3::zeros(),
            magnetic_field: Vector3::zeros(),
            temperature: 0.0,
            time_delta: 0.0,
        }
    }
}

/// Scale a raw triple by 10⁻⁴, remapping HMD axes `(x, y, z)` to sensor
/// axes `(x, z, -y)` when `hmd_to_sensor` is set.
pub fn convert_axes(raw: [f64; 3], hmd_to_sensor: bool) -> Vector3<f64> {
    let [x, y, z] = raw;
    let v = if hmd_to_sensor {
        Vector3::new(x, z, -y)
    } else {
        Vector3::new(x, y, z)
    };
    v * RAW_SCALE
}

impl MessageBodyFrame {
    /// Build a frame from one decoded sample slot plus the report-wide
    /// magnetometer and temperature readings.
    pub fn from_sample(
        report: &TrackerSensors,
        sample: &TrackerSample,
        time_delta: f64,
        hmd_to_sensor: bool,
    ) -> Self {
        Self {
            acceleration: convert_axes(sample.accel.map(f64::from), hmd_to_sensor),
            rotation_rate: convert_axes(sample.gyro.map(f64::from), hmd_to_sensor),
            magnetic_field: convert_axes(report.mag.map(f64::from), hmd_to_sensor),
            temperature: f64::from(report.temperature) * TEMPERATURE_SCALE,
            time_delta,
        }
    }
}
