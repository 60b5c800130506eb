//! Tracker session configuration.

use rift_fusion::{CoordinateFrame, FusionSettings};
use serde::{Deserialize, Serialize};

use crate::error::{SensorError, SensorResult};

/// Session knobs. Missing fields take the device-init defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Gravity feedback strength.
    pub gain: f64,
    pub yaw_mult: f64,
    pub enable_gravity: bool,
    pub enable_prediction: bool,
    pub filter_prediction: bool,
    /// Prediction horizon in seconds.
    pub prediction_dt: f64,
    /// Axis convention requested by consumers.
    pub coordinates: CoordinateFrame,
    /// Axis convention the hardware reports in.
    pub hw_coordinates: CoordinateFrame,
    /// Interval sent in the keep-alive report; the device stops streaming
    /// if it hears nothing for this long.
    pub keep_alive_interval_ms: u16,
    /// Read timeout per sampling-loop iteration. Must be non-zero so the
    /// sampler blocks between reports.
    pub poll_timeout_ms: u16,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let fusion = FusionSettings::default();
        Self {
            gain: fusion.gain,
            yaw_mult: fusion.yaw_mult,
            enable_gravity: fusion.enable_gravity,
            enable_prediction: fusion.enable_prediction,
            filter_prediction: fusion.filter_prediction,
            prediction_dt: fusion.prediction_dt,
            coordinates: CoordinateFrame::Sensor,
            hw_coordinates: CoordinateFrame::Hmd,
            keep_alive_interval_ms: 1000,
            poll_timeout_ms: 1,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> SensorResult<()> {
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(SensorError::InvalidConfig(format!(
                "gain must be finite and non-negative, got {}",
                self.gain
            )));
        }
        if !self.yaw_mult.is_finite() {
            return Err(SensorError::InvalidConfig(format!(
                "yaw_mult must be finite, got {}",
                self.yaw_mult
            )));
        }
        if !self.prediction_dt.is_finite() || self.prediction_dt < 0.0 {
            return Err(SensorError::InvalidConfig(format!(
                "prediction_dt must be finite and non-negative, got {}",
                self.prediction_dt
            )));
        }
        if self.keep_alive_interval_ms == 0 {
            return Err(SensorError::InvalidConfig(
                "keep_alive_interval_ms must be non-zero".to_string(),
            ));
        }
        if self.poll_timeout_ms == 0 {
            return Err(SensorError::InvalidConfig(
                "poll_timeout_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fusion_settings(&self) -> FusionSettings {
        FusionSettings {
            gain: self.gain,
            yaw_mult: self.yaw_mult,
            enable_gravity: self.enable_gravity,
            enable_prediction: self.enable_prediction,
            filter_prediction: self.filter_prediction,
            prediction_dt: self.prediction_dt,
        }
    }

    /// Whether raw samples need the HMD-to-sensor axis remap.
    pub fn hmd_to_sensor(&self) -> bool {
        CoordinateFrame::needs_hmd_to_sensor(self.coordinates, self.hw_coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.hmd_to_sensor());
        assert_eq!(config.keep_alive_interval_ms, 1000);
        assert!(config.enable_gravity);
        assert!(!config.enable_prediction);
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            TrackerConfig {
                gain: -0.1,
                ..TrackerConfig::default()
            },
            TrackerConfig {
                gain: f64::NAN,
                ..TrackerConfig::default()
            },
            TrackerConfig {
                yaw_mult: f64::INFINITY,
                ..TrackerConfig::default()
            },
            TrackerConfig {
                prediction_dt: -1.0,
                ..TrackerConfig::default()
            },
            TrackerConfig {
                keep_alive_interval_ms: 0,
                ..TrackerConfig::default()
            },
            TrackerConfig {
                poll_timeout_ms: 0,
                ..TrackerConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(SensorError::InvalidConfig(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_partial_json() -> Result<(), serde_json::Error> {
        let config: TrackerConfig = serde_json::from_str(
            r#"{ "enable_prediction": true, "prediction_dt": 0.05, "hw_coordinates": "sensor" }"#,
        )?;
        assert!(config.enable_prediction);
        assert!((config.prediction_dt - 0.05).abs() < f64::EPSILON);
        assert!(!config.hmd_to_sensor());
        assert_eq!(config.keep_alive_interval_ms, 1000);
        Ok(())
    }

    #[test]
    fn test_fusion_projection() {
        let config = TrackerConfig {
            gain: 0.25,
            yaw_mult: 0.5,
            ..TrackerConfig::default()
        };
        let settings = config.fusion_settings();
        assert!((settings.gain - 0.25).abs() < f64::EPSILON);
        assert!((settings.yaw_mult - 0.5).abs() < f64::EPSILON);
    }
}
