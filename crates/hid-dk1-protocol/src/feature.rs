//! Feature report encoders and the DisplayInfo decoder.
//!
//! Every set-report starts with the report ID followed by a 16-bit command id.
//! The command id is always 0; no command/response correlation is done.

use bitflags::bitflags;

use crate::DecodeError;
use crate::codec::{decode_f32_le, decode_u16_le, decode_u32_le};
use crate::range::ScaleRange;

/// Feature report IDs.
pub mod report_ids {
    pub const SENSOR_CONFIG: u8 = 0x02;
    pub const SCALE_RANGE: u8 = 0x04;
    pub const KEEP_ALIVE: u8 = 0x08;
    pub const DISPLAY_INFO: u8 = 0x09;
}

pub const KEEP_ALIVE_LEN: usize = 5;
pub const SENSOR_CONFIG_LEN: usize = 7;
pub const SCALE_RANGE_LEN: usize = 8;
pub const DISPLAY_INFO_LEN: usize = 56;

const COMMAND_ID: u16 = 0;

bitflags! {
    /// SensorConfig flag byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SensorConfigFlags: u8 {
        const RAW_MODE = 0x01;
        /// Internal factory test mode.
        const CALIBRATION_TEST = 0x02;
        const USE_CALIBRATION = 0x04;
        const AUTO_CALIBRATION = 0x08;
        const MOTION_KEEP_ALIVE = 0x10;
        const COMMAND_KEEP_ALIVE = 0x20;
        const SENSOR_COORDINATES = 0x40;
    }
}

fn header(report_id: u8) -> [u8; 3] {
    let [lo, hi] = COMMAND_ID.to_le_bytes();
    [report_id, lo, hi]
}

/// KeepAlive (report 8): `[id, cmd lo, cmd hi, interval lo, interval hi]`.
pub fn encode_keep_alive(interval_ms: u16) -> [u8; KEEP_ALIVE_LEN] {
    let [id, c0, c1] = header(report_ids::KEEP_ALIVE);
    let [i0, i1] = interval_ms.to_le_bytes();
    [id, c0, c1, i0, i1]
}

/// SensorConfig (report 2).
pub fn encode_sensor_config(
    flags: SensorConfigFlags,
    packet_interval: u8,
    keep_alive_interval_ms: u16,
) -> [u8; SENSOR_CONFIG_LEN] {
    let [id, c0, c1] = header(report_ids::SENSOR_CONFIG);
    let [k0, k1] = keep_alive_interval_ms.to_le_bytes();
    [id, c0, c1, flags.bits(), packet_interval, k0, k1]
}

/// ScaleRange (report 4).
pub fn encode_scale_range(range: &ScaleRange) -> [u8; SCALE_RANGE_LEN] {
    let [id, c0, c1] = header(report_ids::SCALE_RANGE);
    let [g0, g1] = range.gyro_scale.to_le_bytes();
    let [m0, m1] = range.mag_scale.to_le_bytes();
    [id, c0, c1, range.accel_scale, g0, g1, m0, m1]
}

/// Base distortion format, low nibble of the DisplayInfo distortion byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistortionBase {
    None,
    ScreenOnly,
    Distortion,
    Unknown(u8),
}

impl DistortionBase {
    pub const MASK: u8 = 0x0f;
    pub const OPTIONS_MASK: u8 = 0xf0;

    pub fn from_raw(raw: u8) -> Self {
        match raw & Self::MASK {
            0 => Self::None,
            1 => Self::ScreenOnly,
            2 => Self::Distortion,
            other => Self::Unknown(other),
        }
    }
}

/// Display and lens calibration record reported by the headset.
///
/// Firmware without calibration data reports all zeros; consumers should
/// then fall back to their own defaults (see [`DisplayInfo::is_empty`]).
/// Sizes are in metres.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplayInfo {
    pub distortion_type: u8,
    pub h_resolution: u16,
    pub v_resolution: u16,
    pub h_screen_size: f32,
    pub v_screen_size: f32,
    pub v_center: f32,
    pub lens_separation: f32,
    pub eye_to_screen_distance: [f32; 2],
    pub distortion_k: [f32; 6],
}

impl DisplayInfo {
    pub fn distortion_base(&self) -> DistortionBase {
        DistortionBase::from_raw(self.distortion_type)
    }

    pub fn distortion_options(&self) -> u8 {
        self.distortion_type & DistortionBase::OPTIONS_MASK
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn micro(report: &[u8; DISPLAY_INFO_LEN], offset: usize) -> f32 {
    decode_u32_le(word(report, offset)) as f32 * 1e-6
}

fn word(report: &[u8; DISPLAY_INFO_LEN], offset: usize) -> [u8; 4] {
    report
        .get(offset..offset + 4)
        .and_then(|s| <[u8; 4]>::try_from(s).ok())
        .unwrap_or_default()
}

/// Decode a DisplayInfo get-report buffer (report ID in byte 0).
pub fn decode_display_info(data: &[u8]) -> Result<DisplayInfo, DecodeError> {
    let report: &[u8; DISPLAY_INFO_LEN] = data
        .get(..DISPLAY_INFO_LEN)
        .and_then(|s| s.try_into().ok())
        .ok_or(DecodeError::TooShort {
            got: data.len(),
            need: DISPLAY_INFO_LEN,
        })?;

    if report[0] != report_ids::DISPLAY_INFO {
        return Err(DecodeError::WrongReportId {
            got: report[0],
            expected: report_ids::DISPLAY_INFO,
        });
    }

    let mut distortion_k = [0.0f32; 6];
    for (i, k) in distortion_k.iter_mut().enumerate() {
        *k = decode_f32_le(word(report, 32 + 4 * i));
    }

    Ok(DisplayInfo {
        distortion_type: report[3],
        h_resolution: decode_u16_le([report[4], report[5]]),
        v_resolution: decode_u16_le([report[6], report[7]]),
        h_screen_size: micro(report, 8),
        v_screen_size: micro(report, 12),
        v_center: micro(report, 16),
        lens_separation: micro(report, 20),
        eye_to_screen_distance: [micro(report, 24), micro(report, 28)],
        distortion_k,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_alive_layout() {
        assert_eq!(encode_keep_alive(1000), [0x08, 0, 0, 0xE8, 0x03]);
        assert_eq!(encode_keep_alive(0), [0x08, 0, 0, 0, 0]);
    }

    #[test]
    fn sensor_config_layout() {
        let flags = SensorConfigFlags::USE_CALIBRATION | SensorConfigFlags::AUTO_CALIBRATION;
        assert_eq!(
            encode_sensor_config(flags, 0, 10_000),
            [0x02, 0, 0, 0x0C, 0, 0x10, 0x27]
        );
    }

    #[test]
    fn scale_range_layout() {
        let range = ScaleRange {
            accel_scale: 4,
            gyro_scale: 2000,
            mag_scale: 880,
        };
        assert_eq!(
            encode_scale_range(&range),
            [0x04, 0, 0, 4, 0xD0, 0x07, 0x70, 0x03]
        );
    }

    #[test]
    fn flag_bits_match_wire_values() {
        assert_eq!(SensorConfigFlags::RAW_MODE.bits(), 0x01);
        assert_eq!(SensorConfigFlags::SENSOR_COORDINATES.bits(), 0x40);
        assert_eq!(SensorConfigFlags::all().bits(), 0x7F);
    }

    fn sample_display_info() -> [u8; DISPLAY_INFO_LEN] {
        let mut buf = [0u8; DISPLAY_INFO_LEN];
        buf[0] = report_ids::DISPLAY_INFO;
        buf[3] = 0x12;
        buf[4..6].copy_from_slice(&1280u16.to_le_bytes());
        buf[6..8].copy_from_slice(&800u16.to_le_bytes());
        buf[8..12].copy_from_slice(&149_760u32.to_le_bytes());
        buf[12..16].copy_from_slice(&93_600u32.to_le_bytes());
        buf[16..20].copy_from_slice(&46_800u32.to_le_bytes());
        buf[20..24].copy_from_slice(&63_500u32.to_le_bytes());
        buf[24..28].copy_from_slice(&41_000u32.to_le_bytes());
        buf[28..32].copy_from_slice(&41_000u32.to_le_bytes());
        for (i, k) in [1.0f32, 0.22, 0.24, 0.0, 0.0, 0.0].iter().enumerate() {
            let at = 32 + 4 * i;
            buf[at..at + 4].copy_from_slice(&k.to_le_bytes());
        }
        buf
    }

    #[test]
    fn display_info_decodes_fields() -> Result<(), DecodeError> {
        let info = decode_display_info(&sample_display_info())?;
        assert_eq!(info.h_resolution, 1280);
        assert_eq!(info.v_resolution, 800);
        assert!((info.h_screen_size - 0.149_76).abs() < 1e-6);
        assert!((info.v_center - 0.0468).abs() < 1e-6);
        assert!((info.lens_separation - 0.0635).abs() < 1e-6);
        assert!((info.eye_to_screen_distance[1] - 0.041).abs() < 1e-6);
        assert_eq!(info.distortion_k[1].to_bits(), 0.22f32.to_bits());
        assert_eq!(info.distortion_base(), DistortionBase::Distortion);
        assert_eq!(info.distortion_options(), 0x10);
        assert!(!info.is_empty());
        Ok(())
    }

    #[test]
    fn display_info_all_zero_is_empty() -> Result<(), DecodeError> {
        let mut buf = [0u8; DISPLAY_INFO_LEN];
        buf[0] = report_ids::DISPLAY_INFO;
        let info = decode_display_info(&buf)?;
        assert!(info.is_empty());
        assert_eq!(info.distortion_base(), DistortionBase::None);
        Ok(())
    }

    #[test]
    fn display_info_rejects_short_and_wrong_id() {
        assert_eq!(
            decode_display_info(&[0x09; 20]),
            Err(DecodeError::TooShort { got: 20, need: 56 })
        );
        let mut buf = sample_display_info();
        buf[0] = 0x02;
        assert_eq!(
            decode_display_info(&buf),
            Err(DecodeError::WrongReportId {
                got: 0x02,
                expected: 0x09
            })
        );
    }

    #[test]
    fn unknown_distortion_base_is_preserved() {
        assert_eq!(DistortionBase::from_raw(0x27), DistortionBase::Unknown(7));
    }
}
