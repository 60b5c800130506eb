//! DK1 tracker interrupt report (62 bytes).
//!
//! # Report layout
//! | Offset | Size | Field            | Encoding                           |
//! |--------|------|------------------|------------------------------------|
//! | 0      | u8   | report id        | `0x01`                             |
//! | 1      | u8   | sample count     | samples batched since last report  |
//! | 2–3    | u16  | timestamp        | LE, wraps at 65536, 1 tick = 1 ms  |
//! | 4–5    | u16  | last command id  | LE                                 |
//! | 6–7    | i16  | temperature      | LE, 0.01 °C                        |
//! | 8–55   | 3×16 | samples          | accel triple (8) + gyro triple (8) |
//! | 56–61  | 3×i16| magnetometer     | LE, 10⁻⁴ gauss                     |
//!
//! A report may announce more than three samples when the host fell behind;
//! only the three packed slots are present on the wire.

use crate::DecodeError;
use crate::codec::{decode_i16_le, decode_u16_le, pack_triple_s21, unpack_triple_s21};

/// Exact length of a tracker interrupt report.
pub const TRACKER_REPORT_LEN: usize = 62;

/// Report ID carried in byte 0 of tracker reports.
pub const TRACKER_REPORT_ID: u8 = 0x01;

/// Number of sample slots physically present in one report.
pub const MAX_SAMPLES_PER_REPORT: usize = 3;

const SAMPLES_OFFSET: usize = 8;
const SAMPLE_STRIDE: usize = 16;
const GYRO_OFFSET: usize = 8;
const MAG_OFFSET: usize = 56;

/// One raw accelerometer + gyroscope sample, in device units.
///
/// Accelerometer: 10⁻⁴ m/s². Gyroscope: 10⁻⁴ rad/s. Body-frame axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerSample {
    pub accel: [i32; 3],
    pub gyro: [i32; 3],
}

/// One decoded tracker report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerSensors {
    /// Samples batched by the device since the previous report. May exceed 3.
    pub sample_count: u8,
    pub timestamp: u16,
    pub last_command_id: u16,
    /// Raw temperature in 0.01 °C.
    pub temperature: i16,
    /// Packed sample slots. Only the first [`Self::decoded_count`] are valid.
    pub samples: [TrackerSample; MAX_SAMPLES_PER_REPORT],
    /// Raw magnetometer reading, 10⁻⁴ gauss.
    pub mag: [i16; 3],
}

impl TrackerSensors {
    /// Number of sample slots that carry data (`min(sample_count, 3)`).
    pub fn decoded_count(&self) -> usize {
        usize::from(self.sample_count).min(MAX_SAMPLES_PER_REPORT)
    }

    pub fn decoded_samples(&self) -> &[TrackerSample] {
        self.samples
            .get(..self.decoded_count())
            .unwrap_or(&self.samples)
    }

    /// Temperature in degrees Celsius.
    pub fn temperature_celsius(&self) -> f32 {
        f32::from(self.temperature) * 0.01
    }
}

fn block(report: &[u8; TRACKER_REPORT_LEN], offset: usize) -> [u8; 8] {
    report
        .get(offset..offset + 8)
        .and_then(|s| <[u8; 8]>::try_from(s).ok())
        .unwrap_or_default()
}

/// Decode a tracker interrupt report.
///
/// Fails with [`DecodeError::TooShort`] when fewer than 62 bytes are given.
/// Bytes beyond the 62-byte layout are ignored.
pub fn decode_tracker_report(data: &[u8]) -> Result<TrackerSensors, DecodeError> {
    let report: &[u8; TRACKER_REPORT_LEN] = data
        .get(..TRACKER_REPORT_LEN)
        .and_then(|s| s.try_into().ok())
        .ok_or(DecodeError::TooShort {
            got: data.len(),
            need: TRACKER_REPORT_LEN,
        })?;

    let mut sensors = TrackerSensors {
        sample_count: report[1],
        timestamp: decode_u16_le([report[2], report[3]]),
        last_command_id: decode_u16_le([report[4], report[5]]),
        temperature: decode_i16_le([report[6], report[7]]),
        samples: [TrackerSample::default(); MAX_SAMPLES_PER_REPORT],
        mag: [
            decode_i16_le([report[MAG_OFFSET], report[MAG_OFFSET + 1]]),
            decode_i16_le([report[MAG_OFFSET + 2], report[MAG_OFFSET + 3]]),
            decode_i16_le([report[MAG_OFFSET + 4], report[MAG_OFFSET + 5]]),
        ],
    };

    let count = sensors.decoded_count();
    for (i, slot) in sensors.samples.iter_mut().take(count).enumerate() {
        let base = SAMPLES_OFFSET + SAMPLE_STRIDE * i;
        let (ax, ay, az) = unpack_triple_s21(&block(report, base));
        let (gx, gy, gz) = unpack_triple_s21(&block(report, base + GYRO_OFFSET));
        *slot = TrackerSample {
            accel: [ax, ay, az],
            gyro: [gx, gy, gz],
        };
    }

    Ok(sensors)
}

/// Builds raw 62-byte tracker reports, mainly for fixtures and simulated
/// transports.
#[derive(Debug, Clone)]
pub struct TrackerReportBuilder {
    buffer: [u8; TRACKER_REPORT_LEN],
}

impl TrackerReportBuilder {
    pub fn new() -> Self {
        let mut buffer = [0u8; TRACKER_REPORT_LEN];
        buffer[0] = TRACKER_REPORT_ID;
        Self { buffer }
    }

    pub fn sample_count(mut self, count: u8) -> Self {
        self.buffer[1] = count;
        self
    }

    pub fn timestamp(mut self, timestamp: u16) -> Self {
        let [lo, hi] = timestamp.to_le_bytes();
        self.buffer[2] = lo;
        self.buffer[3] = hi;
        self
    }

    pub fn last_command_id(mut self, id: u16) -> Self {
        let [lo, hi] = id.to_le_bytes();
        self.buffer[4] = lo;
        self.buffer[5] = hi;
        self
    }

    pub fn temperature(mut self, raw: i16) -> Self {
        let [lo, hi] = raw.to_le_bytes();
        self.buffer[6] = lo;
        self.buffer[7] = hi;
        self
    }

    /// Write sample slot `index` (0..3). Out-of-range slots are ignored.
    pub fn sample(mut self, index: usize, accel: [i32; 3], gyro: [i32; 3]) -> Self {
        if index < MAX_SAMPLES_PER_REPORT {
            let base = SAMPLES_OFFSET + SAMPLE_STRIDE * index;
            let [ax, ay, az] = accel;
            let [gx, gy, gz] = gyro;
            if let Some(dst) = self.buffer.get_mut(base..base + 8) {
                dst.copy_from_slice(&pack_triple_s21(ax, ay, az));
            }
            if let Some(dst) = self.buffer.get_mut(base + GYRO_OFFSET..base + GYRO_OFFSET + 8) {
                dst.copy_from_slice(&pack_triple_s21(gx, gy, gz));
            }
        }
        self
    }

    pub fn mag(mut self, mag: [i16; 3]) -> Self {
        for (i, value) in mag.iter().enumerate() {
            let offset = MAG_OFFSET + 2 * i;
            if let Some(dst) = self.buffer.get_mut(offset..offset + 2) {
                dst.copy_from_slice(&value.to_le_bytes());
            }
        }
        self
    }

    pub fn build(self) -> [u8; TRACKER_REPORT_LEN] {
        self.buffer
    }
}

impl Default for TrackerReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
