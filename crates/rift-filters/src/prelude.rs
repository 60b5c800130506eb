//! Convenience re-exports.

pub use crate::Vec3;
pub use crate::angular_velocity::{
    ANGV_FILTER_GAIN, ANGV_FILTER_TAPS, ANGV_FILTER_WEIGHTS, AngVFilterState, angv_filter,
};
pub use crate::state::FilterState;
