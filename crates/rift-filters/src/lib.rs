//! RT-safe filters for the Rift orientation pipeline.
//!
//! # Overview
//!
//! - **Angular velocity**: fixed 8-tap FIR smoother feeding orientation
//!   prediction ([`angular_velocity`]).
//!
//! # RT Safety Guarantees
//!
//! - No heap allocations in filter hot paths
//! - O(1) time complexity for all operations
//! - No syscalls or I/O in filter functions
//! - All state types are `#[repr(C)]`
//!
//! # Example
//!
//! ```
//! use rift_filters::prelude::*;
//!
//! let mut state = AngVFilterState::new(true);
//! for _ in 0..ANGV_FILTER_TAPS {
//!     angv_filter(&mut state, [0.0, 1.0, 0.0]);
//! }
//! let smoothed = angv_filter(&mut state, [0.0, 1.0, 0.0]);
//! assert!((smoothed[1] - ANGV_FILTER_GAIN).abs() < 1e-9);
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod angular_velocity;
pub mod prelude;
pub mod state;

pub use angular_velocity::{
    ANGV_FILTER_GAIN, ANGV_FILTER_TAPS, ANGV_FILTER_WEIGHTS, AngVFilterState, angv_filter,
};
pub use state::FilterState;

/// A 3-axis vector in the sensor's units (rad/s for angular velocity).
pub type Vec3 = [f64; 3];
