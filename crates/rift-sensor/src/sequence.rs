//! Report-to-frame assembly with sequence-gap handling.
//!
//! The tracker timestamp is a wrapping 16-bit millisecond counter that
//! advances by the number of samples the device has delivered. When the
//! counter jumps further than the previous report's sample count (but by no
//! more than [`MAX_GAP_TICKS`]), one catch-up frame replicating the last
//! known sample covers the missing interval before the new samples run.

use nalgebra::Vector3;
use rift_fusion::MessageBodyFrame;
use rift_hid_dk1_protocol::{MAX_SAMPLES_PER_REPORT, TrackerSensors};

/// Seconds per timestamp tick.
pub const TIME_UNIT: f64 = 0.001;

/// Largest timestamp jump still treated as missed samples. Anything beyond
/// is assumed to be counter corruption and gets no catch-up frame.
pub const MAX_GAP_TICKS: u16 = 254;

/// One catch-up frame plus up to three real frames.
pub const MAX_FRAMES_PER_REPORT: usize = MAX_SAMPLES_PER_REPORT + 1;

/// Frames produced from a single report, in processing order.
#[derive(Debug, Clone, Copy)]
pub struct FrameBatch {
    frames: [MessageBodyFrame; MAX_FRAMES_PER_REPORT],
    len: usize,
    synthesized: bool,
}

impl FrameBatch {
    fn new() -> Self {
        Self {
            frames: [MessageBodyFrame::default(); MAX_FRAMES_PER_REPORT],
            len: 0,
            synthesized: false,
        }
    }

    fn push(&mut self, frame: MessageBodyFrame) {
        if let Some(slot) = self.frames.get_mut(self.len) {
            *slot = frame;
            self.len += 1;
        }
    }

    pub fn frames(&self) -> &[MessageBodyFrame] {
        self.frames.get(..self.len).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the first frame is a catch-up frame.
    pub fn synthesized(&self) -> bool {
        self.synthesized
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LastSample {
    acceleration: Vector3<f64>,
    rotation_rate: Vector3<f64>,
    magnetic_field: Vector3<f64>,
    temperature: f64,
}

impl LastSample {
    fn zero() -> Self {
        Self {
            acceleration: Vector3::zeros(),
            rotation_rate: Vector3::zeros(),
            magnetic_field: Vector3::zeros(),
            temperature: 0.0,
        }
    }
}

/// Turns decoded reports into timed body frames.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    hmd_to_sensor: bool,
    sequence_valid: bool,
    last_timestamp: u16,
    last_sample_count: u8,
    last: LastSample,
}

impl FrameAssembler {
    pub fn new(hmd_to_sensor: bool) -> Self {
        Self {
            hmd_to_sensor,
            sequence_valid: false,
            last_timestamp: 0,
            last_sample_count: 0,
            last: LastSample::zero(),
        }
    }

    /// Forget the sequence so the next report seeds it afresh.
    pub fn reset(&mut self) {
        self.sequence_valid = false;
        self.last = LastSample::zero();
    }

    pub fn last_timestamp(&self) -> Option<u16> {
        self.sequence_valid.then_some(self.last_timestamp)
    }

    /// Temperature of the most recent frame, °C.
    pub fn last_temperature(&self) -> f64 {
        self.last.temperature
    }

    pub fn assemble(&mut self, report: &TrackerSensors) -> FrameBatch {
        let mut batch = FrameBatch::new();

        if self.sequence_valid {
            let delta = report.timestamp.wrapping_sub(self.last_timestamp);
            let delivered = u16::from(self.last_sample_count);
            if delta > delivered && delta <= MAX_GAP_TICKS {
                batch.push(MessageBodyFrame {
                    acceleration: self.last.acceleration,
                    rotation_rate: self.last.rotation_rate,
                    magnetic_field: self.last.magnetic_field,
                    temperature: self.last.temperature,
                    time_delta: f64::from(delta - delivered) * TIME_UNIT,
                });
                batch.synthesized = true;
            }
        } else {
            self.last = LastSample::zero();
            self.sequence_valid = true;
        }

        self.last_sample_count = report.sample_count;
        self.last_timestamp = report.timestamp;

        // Samples the device could not fit in the report are folded into the
        // first frame's time delta.
        let mut time_delta = if usize::from(report.sample_count) > MAX_SAMPLES_PER_REPORT {
            f64::from(report.sample_count - 2) * TIME_UNIT
        } else {
            TIME_UNIT
        };

        let mut newest = None;
        for sample in report.decoded_samples() {
            let frame =
                MessageBodyFrame::from_sample(report, sample, time_delta, self.hmd_to_sensor);
            batch.push(frame);
            newest = Some(frame);
            time_delta = TIME_UNIT;
        }

        if let Some(frame) = newest {
            self.last = LastSample {
                acceleration: frame.acceleration,
                rotation_rate: frame.rotation_rate,
                magnetic_field: frame.magnetic_field,
                temperature: frame.temperature,
            };
        }

        batch
    }
}
