//! Gyro integration with prediction and gravity drift correction.
//!
//! Per frame:
//! 1. `AngV = rotation_rate` (Y scaled by `yaw_mult`), `A = acceleration * dt`.
//! 2. `Q = Q * exp(AngV * dt)`, then renormalize.
//! 3. `QP = Q * exp(AngVF * (dt + prediction_dt))` when prediction is on and
//!    the (optionally smoothed) rate `AngVF` exceeds 0.001 rad/s, else `QP = Q`.
//! 4. When the device looks static (|accel| within 0.4 of 9.81 and
//!    |AngV| < 3 rad/s), try two opposite tilt corrections and keep the one
//!    that brings the world-frame acceleration closest to +Y. If neither
//!    strictly improves on the current `Q`, `Q` is left alone.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rift_filters::{AngVFilterState, FilterState, angv_filter};

use crate::body_frame::MessageBodyFrame;
use crate::settings::FusionSettings;

pub const STANDARD_GRAVITY: f64 = 9.81;
/// Maximum deviation of |accel| from [`STANDARD_GRAVITY`] for correction.
pub const GRAVITY_TOLERANCE: f64 = 0.4;
/// Angular speed (rad/s) at or above which correction is skipped.
pub const ANGULAR_SPEED_LIMIT: f64 = 3.0;
/// Smoothed angular speed (rad/s) below which no prediction is applied.
pub const PREDICTION_MIN_SPEED: f64 = 0.001;

/// Outcome of the gravity step for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityCorrection {
    /// Disabled, or the device was not near-static.
    Skipped,
    /// Neither candidate improved on the current orientation.
    Rejected,
    /// The first candidate (`-aw.z`, `+aw.x`) was committed.
    Primary,
    /// The opposite-sign candidate was committed.
    Secondary,
}

/// Whether the gravity correction gate is open.
pub fn gravity_correction_applies(accel_magnitude: f64, angular_speed: f64) -> bool {
    (accel_magnitude - STANDARD_GRAVITY).abs() < GRAVITY_TOLERANCE
        && angular_speed < ANGULAR_SPEED_LIMIT
}

/// Unit quaternion for the rotation vector `rotation` (axis times angle).
///
/// Returns `None` for a zero or non-finite rotation.
pub fn exp_map(rotation: &Vector3<f64>) -> Option<UnitQuaternion<f64>> {
    let angle = rotation.norm();
    if angle <= 0.0 || !angle.is_finite() {
        return None;
    }
    let half = angle * 0.5;
    let s = half.sin() / angle;
    Some(UnitQuaternion::new_unchecked(Quaternion::new(
        half.cos(),
        rotation.x * s,
        rotation.y * s,
        rotation.z * s,
    )))
}

/// Angle in radians between two vectors, `None` if either is zero.
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> Option<f64> {
    let denom = a.norm() * b.norm();
    if denom <= 0.0 || !denom.is_finite() {
        return None;
    }
    Some((a.dot(b) / denom).clamp(-1.0, 1.0).acos())
}

/// Orientation state for one tracker.
#[derive(Debug, Clone)]
pub struct SensorFusion {
    settings: FusionSettings,
    orientation: UnitQuaternion<f64>,
    predicted: UnitQuaternion<f64>,
    acceleration_impulse: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    filter: AngVFilterState,
}

impl SensorFusion {
    pub fn new(settings: FusionSettings) -> Self {
        Self {
            settings,
            orientation: UnitQuaternion::identity(),
            predicted: UnitQuaternion::identity(),
            acceleration_impulse: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            filter: AngVFilterState::new(settings.filter_prediction),
        }
    }

    pub fn settings(&self) -> &FusionSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: FusionSettings) {
        self.filter.enabled = settings.filter_prediction;
        self.settings = settings;
    }

    /// Current orientation `Q` (world from sensor).
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.orientation
    }

    /// Overwrite `Q` (and `QP`), e.g. to restore a saved pose.
    pub fn set_orientation(&mut self, orientation: UnitQuaternion<f64>) {
        self.orientation = orientation;
        self.predicted = orientation;
    }

    /// Predicted orientation `QP`; equals `Q` when prediction is off.
    pub fn predicted_orientation(&self) -> UnitQuaternion<f64> {
        self.predicted
    }

    /// Last acceleration scaled by its time delta (m/s).
    pub fn acceleration_impulse(&self) -> Vector3<f64> {
        self.acceleration_impulse
    }

    /// Last angular velocity (rad/s), yaw already scaled.
    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.angular_velocity
    }

    pub fn filter(&self) -> &AngVFilterState {
        &self.filter
    }

    /// Back to identity with no motion history.
    pub fn reset(&mut self) {
        self.orientation = UnitQuaternion::identity();
        self.predicted = UnitQuaternion::identity();
        self.acceleration_impulse = Vector3::zeros();
        self.angular_velocity = Vector3::zeros();
        self.filter.reset();
    }

    /// Advance the state by one frame.
    pub fn update(&mut self, frame: &MessageBodyFrame) -> GravityCorrection {
        let mut angular_velocity = frame.rotation_rate;
        angular_velocity.y *= self.settings.yaw_mult;
        self.angular_velocity = angular_velocity;
        self.acceleration_impulse = frame.acceleration * frame.time_delta;

        if let Some(dq) = exp_map(&(angular_velocity * frame.time_delta)) {
            self.orientation *= dq;
            self.orientation.renormalize();
        }

        self.predicted = self.predict(frame.time_delta);
        self.correct_gravity(frame.acceleration.norm())
    }

    fn predict(&mut self, time_delta: f64) -> UnitQuaternion<f64> {
        if !self.settings.enable_prediction {
            return self.orientation;
        }

        let smoothed = Vector3::from(angv_filter(
            &mut self.filter,
            self.angular_velocity.into(),
        ));
        if smoothed.norm() > PREDICTION_MIN_SPEED {
            let horizon = time_delta + self.settings.prediction_dt;
            if let Some(dqp) = exp_map(&(smoothed * horizon)) {
                return self.orientation * dqp;
            }
        }
        self.orientation
    }

    fn feedback_candidate(&self, x: f64, z: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::new_normalize(Quaternion::new(1.0, x, 0.0, z) * self.orientation.quaternion())
    }

    fn correct_gravity(&mut self, accel_magnitude: f64) -> GravityCorrection {
        if !self.settings.enable_gravity
            || !gravity_correction_applies(accel_magnitude, self.angular_velocity.norm())
        {
            return GravityCorrection::Skipped;
        }

        let up = Vector3::y();
        let impulse = self.acceleration_impulse;
        let aw = self.orientation * impulse;
        let Some(angle0) = angle_between(&up, &aw) else {
            return GravityCorrection::Rejected;
        };
        let gain = self.settings.gain;

        let improves = |q: &UnitQuaternion<f64>| {
            matches!(angle_between(&up, &(q * impulse)), Some(angle) if angle < angle0)
        };

        let q1 = self.feedback_candidate(-aw.z * gain, aw.x * gain);
        if improves(&q1) {
            self.orientation = q1;
            return GravityCorrection::Primary;
        }

        let q2 = self.feedback_candidate(aw.z * gain, -aw.x * gain);
        if improves(&q2) {
            self.orientation = q2;
            return GravityCorrection::Secondary;
        }

        GravityCorrection::Rejected
    }
}

impl Default for SensorFusion {
    fn default() -> Self {
        Self::new(FusionSettings::default())
    }
}
