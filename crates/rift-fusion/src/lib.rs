//! Orientation engine for the Rift DK1 head tracker.
//!
//! Raw tracker samples are converted into [`MessageBodyFrame`]s (SI units,
//! logical axes) and fed one at a time to [`SensorFusion`], which integrates
//! the gyroscope on the unit-quaternion sphere, optionally predicts ahead and
//! pulls accumulated tilt back toward gravity.
//!
//! Quaternions are `nalgebra::UnitQuaternion<f64>` with Hamilton
//! multiplication; `orientation()` rotates sensor-frame vectors into the
//! world frame (Y up).

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]

pub mod body_frame;
pub mod orientation;
pub mod settings;

pub use body_frame::{MessageBodyFrame, convert_axes};
pub use orientation::{
    ANGULAR_SPEED_LIMIT, GRAVITY_TOLERANCE, GravityCorrection, PREDICTION_MIN_SPEED,
    STANDARD_GRAVITY, SensorFusion, angle_between, exp_map, gravity_correction_applies,
};
pub use settings::{CoordinateFrame, FusionSettings};

pub use nalgebra::{UnitQuaternion, Vector3};
