//! Background sampling thread.
//!
//! The thread owns the [`Device`], keeps the tracker alive, drains reports
//! and publishes a [`TrackingSnapshot`] after every processed report. Readers
//! take the snapshot under a short read lock; they never touch the device.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use nalgebra::{UnitQuaternion, Vector3};
use parking_lot::RwLock;
use rift_hid_common::HidTransport;
use tracing::{debug, info, warn};

use crate::counters::{CounterSnapshot, SessionCounters};
use crate::device::{Device, SampleOutcome};
use crate::error::{SensorError, SensorResult};

/// Latest published tracking state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingSnapshot {
    pub orientation: UnitQuaternion<f64>,
    pub predicted: UnitQuaternion<f64>,
    /// Last acceleration times its frame delta, m/s.
    pub acceleration_impulse: Vector3<f64>,
    /// Last unfiltered angular velocity with yaw scaling applied, rad/s.
    pub angular_velocity: Vector3<f64>,
    /// °C
    pub temperature: f64,
    pub last_timestamp: Option<u16>,
    /// Number of reports folded into this snapshot.
    pub updates: u64,
}

impl Default for TrackingSnapshot {
    fn default() -> Self {
        Self {
            orientation: UnitQuaternion::identity(),
            predicted: UnitQuaternion::identity(),
            acceleration_impulse: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            temperature: 0.0,
            last_timestamp: None,
            updates: 0,
        }
    }
}

impl TrackingSnapshot {
    fn capture<T: HidTransport>(device: &Device<T>, updates: u64) -> Self {
        Self {
            orientation: device.orientation(),
            predicted: device.predicted_orientation(),
            acceleration_impulse: device.acceleration_impulse(),
            angular_velocity: device.angular_velocity(),
            temperature: device.temperature(),
            last_timestamp: device.last_timestamp(),
            updates,
        }
    }
}

/// Starts sampling threads.
pub struct Sampler;

impl Sampler {
    /// Move `device` onto a dedicated thread and start sampling.
    pub fn spawn<T>(device: Device<T>) -> SensorResult<SamplerHandle<T>>
    where
        T: HidTransport + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let snapshot = Arc::new(RwLock::new(TrackingSnapshot::capture(&device, 0)));
        let counters = device.shared_counters();

        let thread_running = Arc::clone(&running);
        let thread_snapshot = Arc::clone(&snapshot);
        let thread = thread::Builder::new()
            .name("rift-sampler".to_string())
            .spawn(move || sampler_main(device, thread_running, thread_snapshot))
            .map_err(SensorError::Spawn)?;

        info!("sampler started");
        Ok(SamplerHandle {
            running,
            snapshot,
            counters,
            thread: Some(thread),
        })
    }
}

fn sampler_main<T: HidTransport>(
    mut device: Device<T>,
    running: Arc<AtomicBool>,
    snapshot: Arc<RwLock<TrackingSnapshot>>,
) -> Device<T> {
    let timeout_ms = i32::from(device.config().poll_timeout_ms);
    let mut updates = 0u64;

    while running.load(Ordering::Acquire) {
        if device.keep_alive_due(Instant::now()) {
            match device.send_keep_alive() {
                Err(e) if e.is_device_unavailable() => {
                    warn!(error = %e, "tracker unavailable, sampler exiting");
                    break;
                }
                _ => {}
            }
        }

        match device.sample_with_timeout(timeout_ms) {
            Ok(SampleOutcome::Processed { .. }) => {
                updates += 1;
                *snapshot.write() = TrackingSnapshot::capture(&device, updates);
            }
            Ok(SampleOutcome::NoSample | SampleOutcome::Dropped { .. }) => {}
            Err(e) => {
                warn!(error = %e, "tracker read failed, sampler exiting");
                break;
            }
        }
    }

    running.store(false, Ordering::Release);
    debug!(updates, "sampler loop finished");
    device
}

/// Handle to a running sampler. Dropping it stops the thread.
pub struct SamplerHandle<T: HidTransport> {
    running: Arc<AtomicBool>,
    snapshot: Arc<RwLock<TrackingSnapshot>>,
    counters: Arc<SessionCounters>,
    thread: Option<JoinHandle<Device<T>>>,
}

impl<T: HidTransport> SamplerHandle<T> {
    pub fn snapshot(&self) -> TrackingSnapshot {
        *self.snapshot.read()
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// False once the loop has exited, whether stopped or after a disconnect.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop the loop and take the device back. `None` if the thread
    /// panicked.
    pub fn stop(mut self) -> Option<Device<T>> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<Device<T>> {
        self.running.store(false, Ordering::Release);
        let thread = self.thread.take()?;
        match thread.join() {
            Ok(device) => {
                info!("sampler stopped");
                Some(device)
            }
            Err(_) => {
                warn!("sampler thread panicked");
                None
            }
        }
    }
}

impl<T: HidTransport> Drop for SamplerHandle<T> {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use rift_hid_common::HidDeviceInfo;
    use rift_hid_common::mock::MockHidDevice;
    use rift_hid_dk1_protocol::{PID_DK1, TrackerReportBuilder, VENDOR_ID};
    use std::time::Duration;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn mock() -> MockHidDevice {
        MockHidDevice::with_info(HidDeviceInfo::new(VENDOR_ID, PID_DK1, "/dev/hidraw0"))
            .with_idle_wait(Duration::from_millis(1))
    }

    fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_snapshot_published_after_reports() -> TestResult {
        let mock = mock();
        for ts in [1u16, 2, 3] {
            mock.queue_read(
                TrackerReportBuilder::new()
                    .sample_count(1)
                    .timestamp(ts)
                    .temperature(2_100)
                    .sample(0, [0, 0, 0], [0, 0, 10_000])
                    .build()
                    .to_vec(),
            );
        }
        let device = Device::from_transport(mock.clone(), TrackerConfig::default())?;
        let handle = Sampler::spawn(device)?;

        assert!(wait_until(|| handle.snapshot().updates == 3));
        let snap = handle.snapshot();
        assert_eq!(snap.last_timestamp, Some(3));
        assert!((snap.temperature - 21.0).abs() < 1e-9);
        assert_ne!(snap.orientation, UnitQuaternion::identity());

        let device = handle.stop().ok_or("sampler thread panicked")?;
        assert_eq!(device.orientation(), snap.orientation);
        assert_eq!(snap.acceleration_impulse, device.acceleration_impulse());
        assert_eq!(snap.angular_velocity, device.angular_velocity());
        Ok(())
    }

    #[test]
    fn test_keep_alive_sent_on_start() -> TestResult {
        let mock = mock();
        let device = Device::from_transport(mock.clone(), TrackerConfig::default())?;
        let handle = Sampler::spawn(device)?;

        assert!(wait_until(|| !mock.get_feature_history().is_empty()));
        assert_eq!(mock.get_feature_history()[0][0], 0x08);
        assert!(handle.counters().keep_alives_sent >= 1);
        drop(handle);
        Ok(())
    }

    #[test]
    fn test_exits_on_disconnect() -> TestResult {
        let mock = mock();
        let device = Device::from_transport(mock.clone(), TrackerConfig::default())?;
        let handle = Sampler::spawn(device)?;

        mock.disconnect();
        assert!(wait_until(|| !handle.is_running()));
        assert!(handle.stop().is_some());
        Ok(())
    }
}
