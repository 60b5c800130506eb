//! Sensor full-scale range selection.
//!
//! The DK1 only accepts a handful of full-scale settings per sensor. A
//! requested physical range is rounded up to the next supported ramp value
//! (or clamped to the largest one) before it is sent in a ScaleRange report.

/// Accelerometer ramps, in g.
pub const ACCEL_RANGE_RAMP: [u16; 4] = [2, 4, 8, 16];
/// Gyroscope ramps, in deg/s.
pub const GYRO_RANGE_RAMP: [u16; 4] = [250, 500, 1000, 2000];
/// Magnetometer ramps, in milligauss.
pub const MAG_RANGE_RAMP: [u16; 4] = [880, 1300, 1900, 2500];

const STANDARD_GRAVITY: f32 = 9.81;

/// Requested or reported physical measurement ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorRange {
    /// m/s²
    pub max_acceleration: f32,
    /// rad/s
    pub max_rotation_rate: f32,
    /// gauss
    pub max_magnetic_field: f32,
}

/// Hardware ramp values carried by the ScaleRange feature report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleRange {
    pub accel_scale: u8,
    pub gyro_scale: u16,
    pub mag_scale: u16,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self {
            accel_scale: 8,
            gyro_scale: 1000,
            mag_scale: 1300,
        }
    }
}

/// First ramp value at or above `value * factor`, or the last ramp value.
pub fn select_ramp_value(ramp: &[u16], value: f32, factor: f32) -> u16 {
    // Float-to-int `as` saturates, so negative and NaN requests pick the
    // smallest ramp and oversized requests the largest.
    let threshold = (value * factor) as u16;
    ramp.iter()
        .copied()
        .find(|&step| step >= threshold)
        .or_else(|| ramp.last().copied())
        .unwrap_or(0)
}

impl ScaleRange {
    pub fn from_sensor_range(range: &SensorRange) -> Self {
        let accel = select_ramp_value(
            &ACCEL_RANGE_RAMP,
            range.max_acceleration,
            1.0 / STANDARD_GRAVITY,
        );
        Self {
            accel_scale: u8::try_from(accel).unwrap_or(u8::MAX),
            gyro_scale: select_ramp_value(
                &GYRO_RANGE_RAMP,
                range.max_rotation_rate,
                180.0 / std::f32::consts::PI,
            ),
            mag_scale: select_ramp_value(&MAG_RANGE_RAMP, range.max_magnetic_field, 1000.0),
        }
    }

    pub fn to_sensor_range(&self) -> SensorRange {
        SensorRange {
            max_acceleration: f32::from(self.accel_scale) * STANDARD_GRAVITY,
            max_rotation_rate: f32::from(self.gyro_scale).to_radians(),
            max_magnetic_field: f32::from(self.mag_scale) * 0.001,
        }
    }
}
