//! Engine configuration knobs.

use serde::{Deserialize, Serialize};

/// Axis convention of a reported or requested coordinate frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateFrame {
    /// Logical sensor frame: X right, Y up, Z toward the viewer.
    #[default]
    Sensor,
    /// Axes as mounted in the headset hardware.
    Hmd,
}

impl CoordinateFrame {
    /// Whether samples reported in `hardware` axes must be remapped to reach
    /// `requested` axes.
    pub fn needs_hmd_to_sensor(requested: Self, hardware: Self) -> bool {
        requested == Self::Sensor && hardware == Self::Hmd
    }
}

/// Fusion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    /// Gravity feedback strength.
    pub gain: f64,
    /// Multiplier on the yaw (Y) rate before integration.
    pub yaw_mult: f64,
    pub enable_gravity: bool,
    pub enable_prediction: bool,
    /// Smooth the angular velocity used for prediction.
    pub filter_prediction: bool,
    /// Prediction horizon in seconds, added to each frame's time delta.
    pub prediction_dt: f64,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            gain: 0.5,
            yaw_mult: 1.0,
            enable_gravity: true,
            enable_prediction: false,
            filter_prediction: false,
            prediction_dt: 0.03,
        }
    }
}
