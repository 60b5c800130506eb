//! Oculus Rift DK1 tracker sessions.
//!
//! A [`Device`] owns one HID transport and turns the tracker's interrupt
//! reports into an orientation estimate:
//!
//! 1. enumerate and open the `index`-th DK1 through a [`HidBackend`],
//! 2. fetch the DisplayInfo calibration record,
//! 3. keep the tracker streaming with periodic keep-alive reports,
//! 4. decode each 62-byte report, fill timestamp gaps and run every frame
//!    through [`rift_fusion::SensorFusion`].
//!
//! Sampling can be driven by hand with [`Device::sample_once`] or moved onto
//! a background thread with [`Sampler::spawn`].
//!
//! [`HidBackend`]: rift_hid_common::HidBackend

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod counters;
pub mod device;
pub mod error;
pub mod sampler;
pub mod sequence;

pub use config::TrackerConfig;
pub use counters::{CounterSnapshot, SessionCounters};
pub use device::{Device, SampleOutcome, list_devices};
pub use error::{ErrorSeverity, SensorError, SensorResult};
pub use rift_hid_common::HidDeviceInfo;
pub use sampler::{Sampler, SamplerHandle, TrackingSnapshot};
pub use sequence::{FrameAssembler, FrameBatch};
