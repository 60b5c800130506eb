//! Angular Velocity Smoothing Filter
//!
//! An 8-tap FIR kernel over the most recent angular-velocity samples. Slot 0
//! holds the newest sample; older samples shift toward slot 7. The kernel is
//! signed so it both smooths and leans slightly forward, which is what the
//! orientation predictor wants.
//!
//! The coefficients sum to [`ANGV_FILTER_GAIN`] (0.775), so a steady input
//! converges to 0.775 times its value rather than to the input itself.

use crate::Vec3;

/// Number of history slots.
pub const ANGV_FILTER_TAPS: usize = 8;

/// Kernel weights applied to history slots 0 (newest) through 7 (oldest).
pub const ANGV_FILTER_WEIGHTS: [f64; ANGV_FILTER_TAPS] = [
    0.41667, 0.33333, 0.025, 0.16667, 0.08333, 0.0, -0.08333, -0.16667,
];

/// Steady-state gain of the kernel (sum of [`ANGV_FILTER_WEIGHTS`]).
pub const ANGV_FILTER_GAIN: f64 = 0.775;

/// State for the angular-velocity smoother.
///
/// # RT Safety
///
/// - `#[repr(C)]` for stable ABI
/// - Fixed-size history, no heap allocations
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AngVFilterState {
    /// Sample history, newest first.
    pub history: [Vec3; ANGV_FILTER_TAPS],
    /// When `false` the filter is a pass-through and history is left untouched.
    pub enabled: bool,
}

impl AngVFilterState {
    /// Create a filter with zeroed history.
    pub fn new(enabled: bool) -> Self {
        Self {
            history: [[0.0; 3]; ANGV_FILTER_TAPS],
            enabled,
        }
    }

    /// Pass-through filter.
    pub fn bypass() -> Self {
        Self::new(false)
    }

    /// Weighted sum of the current history without pushing a new sample.
    pub fn smoothed(&self) -> Vec3 {
        let mut out = [0.0; 3];
        for (sample, weight) in self.history.iter().zip(ANGV_FILTER_WEIGHTS) {
            for (acc, v) in out.iter_mut().zip(sample) {
                *acc += v * weight;
            }
        }
        out
    }
}

impl Default for AngVFilterState {
    fn default() -> Self {
        Self::bypass()
    }
}

/// Push `angular_velocity` into the history and return the smoothed value.
///
/// When the filter is disabled, returns the input unchanged.
///
/// # RT Safety
///
/// - No heap allocations
/// - O(1) time complexity
#[inline]
pub fn angv_filter(state: &mut AngVFilterState, angular_velocity: Vec3) -> Vec3 {
    if !state.enabled {
        return angular_velocity;
    }

    state.history.copy_within(0..ANGV_FILTER_TAPS - 1, 1);
    state.history[0] = angular_velocity;
    state.smoothed()
}
