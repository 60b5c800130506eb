//! Filter State Types

pub use crate::angular_velocity::AngVFilterState;

/// Filter trait for common filter operations.
pub trait FilterState: Copy + Clone + std::fmt::Debug {
    /// Reset the filter state to initial values.
    fn reset(&mut self);
}

impl FilterState for AngVFilterState {
    fn reset(&mut self) {
        self.history = [[0.0; 3]; crate::ANGV_FILTER_TAPS];
    }
}
