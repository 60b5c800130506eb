//! One open DK1 tracker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use nalgebra::{UnitQuaternion, Vector3};
use rift_fusion::{FusionSettings, SensorFusion};
use rift_hid_common::{HidBackend, HidCommonError, HidDeviceInfo, HidTransport};
use rift_hid_dk1_protocol::{
    DISPLAY_INFO_LEN, DisplayInfo, PID_DK1, ScaleRange, SensorConfigFlags, SensorRange,
    TRACKER_REPORT_LEN, VENDOR_ID, decode_display_info, decode_tracker_report, encode_keep_alive,
    encode_scale_range, encode_sensor_config, report_ids,
};
use tracing::{debug, info, trace, warn};

use crate::config::TrackerConfig;
use crate::counters::{CounterSnapshot, SessionCounters};
use crate::error::{SensorError, SensorResult};
use crate::sequence::FrameAssembler;

/// Interrupt read buffer; one byte of headroom so oversized reads are
/// detected rather than truncated to a valid length.
const READ_BUFFER_LEN: usize = TRACKER_REPORT_LEN + 2;

/// Result of one sampling attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// A report was decoded and `frames` frames went through the engine.
    Processed { frames: usize, synthesized: bool },
    /// The read timed out, returned nothing, or failed transiently.
    NoSample,
    /// A report of the wrong length was discarded.
    Dropped { len: usize },
}

/// List every attached DK1.
pub fn list_devices<B: HidBackend>(backend: &B) -> SensorResult<Vec<HidDeviceInfo>> {
    Ok(backend.enumerate(VENDOR_ID, PID_DK1)?)
}

/// An open tracker with its orientation state.
///
/// All HID traffic and state updates go through `&mut self`; share it across
/// threads with [`crate::Sampler`].
pub struct Device<T: HidTransport> {
    transport: T,
    config: TrackerConfig,
    display_info: DisplayInfo,
    fusion: SensorFusion,
    assembler: FrameAssembler,
    counters: Arc<SessionCounters>,
    last_keep_alive: Option<Instant>,
    last_command_id: u16,
}

impl<T: HidTransport> std::fmt::Debug for Device<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("identity", self.transport.device_info())
            .field("config", &self.config)
            .field("orientation", &self.fusion.orientation())
            .finish_non_exhaustive()
    }
}

impl<T: HidTransport> Device<T> {
    /// Open the `index`-th attached DK1.
    pub fn open<B>(backend: &B, index: usize, config: TrackerConfig) -> SensorResult<Self>
    where
        B: HidBackend<Transport = T>,
    {
        config.validate()?;
        let devices = list_devices(backend)?;
        let info = devices.get(index).ok_or(SensorError::DeviceNotFound {
            index,
            found: devices.len(),
        })?;
        let transport = backend.open(info)?;
        Self::from_transport(transport, config)
    }

    /// Wrap an already-open transport.
    ///
    /// Fetches DisplayInfo; a failed or malformed response is logged and
    /// leaves the record zeroed.
    pub fn from_transport(mut transport: T, config: TrackerConfig) -> SensorResult<Self> {
        config.validate()?;

        let display_info = match fetch_display_info(&mut transport) {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "DisplayInfo unavailable, using zeroed calibration");
                DisplayInfo::default()
            }
        };

        let identity = transport.device_info();
        info!(
            product = %identity.display_name(),
            serial = identity.serial_number.as_deref().unwrap_or("-"),
            path = %identity.path,
            h_resolution = display_info.h_resolution,
            v_resolution = display_info.v_resolution,
            "opened Rift tracker"
        );

        Ok(Self {
            fusion: SensorFusion::new(config.fusion_settings()),
            assembler: FrameAssembler::new(config.hmd_to_sensor()),
            transport,
            config,
            display_info,
            counters: Arc::new(SessionCounters::new()),
            last_keep_alive: None,
            last_command_id: 0,
        })
    }

    pub fn identity(&self) -> &HidDeviceInfo {
        self.transport.device_info()
    }

    pub fn display_info(&self) -> &DisplayInfo {
        &self.display_info
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Replace the fusion knobs without touching orientation state.
    pub fn set_fusion_settings(&mut self, settings: FusionSettings) {
        self.config.gain = settings.gain;
        self.config.yaw_mult = settings.yaw_mult;
        self.config.enable_gravity = settings.enable_gravity;
        self.config.enable_prediction = settings.enable_prediction;
        self.config.filter_prediction = settings.filter_prediction;
        self.config.prediction_dt = settings.prediction_dt;
        self.fusion.set_settings(settings);
    }

    pub fn fusion(&self) -> &SensorFusion {
        &self.fusion
    }

    pub fn orientation(&self) -> UnitQuaternion<f64> {
        self.fusion.orientation()
    }

    pub fn predicted_orientation(&self) -> UnitQuaternion<f64> {
        self.fusion.predicted_orientation()
    }

    pub fn acceleration_impulse(&self) -> Vector3<f64> {
        self.fusion.acceleration_impulse()
    }

    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.fusion.angular_velocity()
    }

    /// Last reported temperature, °C.
    pub fn temperature(&self) -> f64 {
        self.assembler.last_temperature()
    }

    pub fn last_timestamp(&self) -> Option<u16> {
        self.assembler.last_timestamp()
    }

    pub fn last_command_id(&self) -> u16 {
        self.last_command_id
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    pub(crate) fn shared_counters(&self) -> Arc<SessionCounters> {
        Arc::clone(&self.counters)
    }

    /// Identity orientation, no motion history, fresh timestamp sequence.
    pub fn reset_orientation(&mut self) {
        self.fusion.reset();
        self.assembler.reset();
        debug!("orientation reset");
    }

    /// Send the keep-alive report. Must happen at least once per
    /// `keep_alive_interval_ms` or the tracker stops streaming.
    pub fn send_keep_alive(&mut self) -> SensorResult<()> {
        let report = encode_keep_alive(self.config.keep_alive_interval_ms);
        match self.transport.send_feature_report(&report) {
            Ok(_) => {
                self.last_keep_alive = Some(Instant::now());
                self.counters.record_keep_alive(true);
                trace!(interval_ms = self.config.keep_alive_interval_ms, "keep-alive sent");
                Ok(())
            }
            Err(e) => {
                self.counters.record_keep_alive(false);
                warn!(error = %e, "keep-alive failed");
                Err(e.into())
            }
        }
    }

    /// True once half the keep-alive interval has passed since the last
    /// successful keep-alive, or if none was ever sent.
    pub fn keep_alive_due(&self, now: Instant) -> bool {
        let half = Duration::from_millis(u64::from(self.config.keep_alive_interval_ms) / 2);
        self.last_keep_alive
            .is_none_or(|sent| now.saturating_duration_since(sent) >= half)
    }

    /// Request new full-scale ranges. Returns the hardware ramp values
    /// actually selected.
    pub fn set_range(&mut self, range: &SensorRange) -> SensorResult<ScaleRange> {
        let scale = ScaleRange::from_sensor_range(range);
        self.transport
            .send_feature_report(&encode_scale_range(&scale))?;
        info!(
            accel_g = scale.accel_scale,
            gyro_dps = scale.gyro_scale,
            mag_mgauss = scale.mag_scale,
            "sensor range set"
        );
        Ok(scale)
    }

    pub fn send_sensor_config(
        &mut self,
        flags: SensorConfigFlags,
        packet_interval: u8,
    ) -> SensorResult<()> {
        let report = encode_sensor_config(
            flags,
            packet_interval,
            self.config.keep_alive_interval_ms,
        );
        self.transport.send_feature_report(&report)?;
        debug!(?flags, packet_interval, "sensor config sent");
        Ok(())
    }

    /// Non-blocking sample.
    pub fn sample_once(&mut self) -> SensorResult<SampleOutcome> {
        self.sample_with_timeout(0)
    }

    /// Wait up to `timeout_ms` for one report and process it.
    ///
    /// Only a disconnect is an error; timeouts, transient read failures and
    /// wrong-length reports are normal poll outcomes.
    pub fn sample_with_timeout(&mut self, timeout_ms: i32) -> SensorResult<SampleOutcome> {
        let mut buf = [0u8; READ_BUFFER_LEN];
        match self.transport.read_timeout(&mut buf, timeout_ms) {
            Ok(0) => {
                self.counters.inc_empty_read();
                Ok(SampleOutcome::NoSample)
            }
            Ok(n) => Ok(self.process_report(buf.get(..n).unwrap_or(&buf))),
            Err(HidCommonError::Disconnected) => Err(HidCommonError::Disconnected.into()),
            Err(e) => {
                self.counters.inc_read_error();
                debug!(error = %e, "tracker read failed");
                Ok(SampleOutcome::NoSample)
            }
        }
    }

    /// Feed one raw interrupt report. Anything but exactly 62 bytes is
    /// dropped without touching state.
    pub fn process_report(&mut self, data: &[u8]) -> SampleOutcome {
        if data.len() != TRACKER_REPORT_LEN {
            self.counters.inc_dropped();
            debug!(len = data.len(), "dropping report with unexpected length");
            return SampleOutcome::Dropped { len: data.len() };
        }

        let report = match decode_tracker_report(data) {
            Ok(report) => report,
            Err(e) => {
                self.counters.inc_dropped();
                debug!(error = %e, "dropping undecodable report");
                return SampleOutcome::Dropped { len: data.len() };
            }
        };

        let batch = self.assembler.assemble(&report);
        if batch.synthesized() {
            trace!(timestamp = report.timestamp, "synthesized catch-up frame");
        }
        for frame in batch.frames() {
            self.fusion.update(frame);
        }
        self.last_command_id = report.last_command_id;
        self.counters.record_report(batch.len(), batch.synthesized());

        SampleOutcome::Processed {
            frames: batch.len(),
            synthesized: batch.synthesized(),
        }
    }

    /// Close the session and hand back the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}

fn fetch_display_info<T: HidTransport>(transport: &mut T) -> SensorResult<DisplayInfo> {
    let mut buf = [0u8; DISPLAY_INFO_LEN];
    buf[0] = report_ids::DISPLAY_INFO;
    let n = transport.get_feature_report(&mut buf)?;
    Ok(decode_display_info(buf.get(..n).unwrap_or(&buf))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rift_hid_common::mock::{MockHidBackend, MockHidDevice};
    use rift_hid_dk1_protocol::TrackerReportBuilder;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn dk1(path: &str) -> MockHidDevice {
        MockHidDevice::with_info(
            HidDeviceInfo::new(VENDOR_ID, PID_DK1, path)
                .with_product_name("Tracker DK")
                .with_serial("SN0001"),
        )
    }

    fn display_info_report() -> Vec<u8> {
        let mut buf = vec![0u8; DISPLAY_INFO_LEN];
        buf[0] = report_ids::DISPLAY_INFO;
        buf[3] = 0x02;
        buf[4..6].copy_from_slice(&1280u16.to_le_bytes());
        buf[6..8].copy_from_slice(&800u16.to_le_bytes());
        buf
    }

    fn open_mock(device: &MockHidDevice) -> SensorResult<Device<MockHidDevice>> {
        Device::from_transport(device.clone(), TrackerConfig::default())
    }

    #[test]
    fn test_open_by_index() -> TestResult {
        let mut backend = MockHidBackend::new();
        backend.add_device(MockHidDevice::new(0x046D, 0xC24F, "/dev/hidraw0"));
        backend.add_device(dk1("/dev/hidraw1"));
        backend.add_device(dk1("/dev/hidraw2"));

        assert_eq!(list_devices(&backend)?.len(), 2);
        let device = Device::open(&backend, 1, TrackerConfig::default())?;
        assert_eq!(device.identity().path, "/dev/hidraw2");
        assert_eq!(device.identity().serial_number.as_deref(), Some("SN0001"));
        Ok(())
    }

    #[test]
    fn test_open_missing_index() {
        let mut backend = MockHidBackend::new();
        backend.add_device(dk1("/dev/hidraw1"));
        let err = Device::open(&backend, 3, TrackerConfig::default());
        assert!(matches!(
            err,
            Err(SensorError::DeviceNotFound { index: 3, found: 1 })
        ));
    }

    #[test]
    fn test_open_permission_denied() {
        let mut backend = MockHidBackend::new();
        backend.add_device(dk1("/dev/hidraw1"));
        backend.deny_access("/dev/hidraw1");
        let err = Device::open(&backend, 0, TrackerConfig::default());
        assert!(matches!(err, Err(SensorError::PermissionDenied(_))));
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let mut backend = MockHidBackend::new();
        backend.add_device(dk1("/dev/hidraw1"));
        let config = TrackerConfig {
            keep_alive_interval_ms: 0,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            Device::open(&backend, 0, config),
            Err(SensorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_display_info_loaded() -> TestResult {
        let mock = dk1("/dev/hidraw1");
        mock.set_feature_response(display_info_report());
        let device = open_mock(&mock)?;
        assert_eq!(device.display_info().h_resolution, 1280);
        assert_eq!(device.display_info().v_resolution, 800);
        Ok(())
    }

    #[test]
    fn test_display_info_failure_is_not_fatal() -> TestResult {
        let mock = dk1("/dev/hidraw1");
        let device = open_mock(&mock)?;
        assert!(device.display_info().is_empty());
        Ok(())
    }

    #[test]
    fn test_keep_alive_report_and_schedule() -> TestResult {
        let mock = dk1("/dev/hidraw1");
        let mut device = open_mock(&mock)?;

        let start = Instant::now();
        assert!(device.keep_alive_due(start));
        device.send_keep_alive()?;
        assert_eq!(mock.get_feature_history(), vec![vec![0x08, 0, 0, 0xE8, 0x03]]);

        let sent = Instant::now();
        assert!(!device.keep_alive_due(sent));
        assert!(!device.keep_alive_due(sent + Duration::from_millis(499)));
        assert!(device.keep_alive_due(sent + Duration::from_millis(500)));
        assert_eq!(device.counters().keep_alives_sent, 1);
        Ok(())
    }

    #[test]
    fn test_keep_alive_failure_reported() -> TestResult {
        let mock = dk1("/dev/hidraw1");
        let mut device = open_mock(&mock)?;
        mock.set_feature_write_failure(true);

        let err = device.send_keep_alive();
        assert!(matches!(err, Err(SensorError::Transport(_))));
        assert!(device.keep_alive_due(Instant::now()));
        assert_eq!(device.counters().keep_alive_failures, 1);
        Ok(())
    }

    #[test]
    fn test_set_range_sends_selected_ramps() -> TestResult {
        let mock = dk1("/dev/hidraw1");
        let mut device = open_mock(&mock)?;
        let scale = device.set_range(&SensorRange {
            max_acceleration: 4.0 * 9.81,
            max_rotation_rate: 8.0,
            max_magnetic_field: 1.0,
        })?;
        assert_eq!(scale.accel_scale, 4);
        assert_eq!(
            mock.get_feature_history(),
            vec![vec![0x04, 0, 0, 4, 0xF4, 0x01, 0x14, 0x05]]
        );
        Ok(())
    }

    #[test]
    fn test_sensor_config_carries_keep_alive_interval() -> TestResult {
        let mock = dk1("/dev/hidraw1");
        let mut device = open_mock(&mock)?;
        device.send_sensor_config(
            SensorConfigFlags::USE_CALIBRATION | SensorConfigFlags::AUTO_CALIBRATION,
            0,
        )?;
        assert_eq!(
            mock.get_feature_history(),
            vec![vec![0x02, 0, 0, 0x0C, 0, 0xE8, 0x03]]
        );
        Ok(())
    }

    #[test]
    fn test_sample_outcomes() -> TestResult {
        let mock = dk1("/dev/hidraw1");
        let mut device = open_mock(&mock)?;

        mock.queue_read(
            TrackerReportBuilder::new()
                .sample_count(2)
                .timestamp(10)
                .last_command_id(7)
                .build()
                .to_vec(),
        );
        mock.queue_read(vec![0u8; 10]);
        mock.queue_timeout();
        mock.queue_read_error("transient");

        assert_eq!(
            device.sample_once()?,
            SampleOutcome::Processed {
                frames: 2,
                synthesized: false
            }
        );
        assert_eq!(device.sample_once()?, SampleOutcome::Dropped { len: 10 });
        assert_eq!(device.sample_once()?, SampleOutcome::NoSample);
        assert_eq!(device.sample_once()?, SampleOutcome::NoSample);

        let counters = device.counters();
        assert_eq!(counters.reports_processed, 1);
        assert_eq!(counters.reports_dropped, 1);
        assert_eq!(counters.empty_reads, 1);
        assert_eq!(counters.read_errors, 1);
        assert_eq!(device.last_command_id(), 7);
        assert_eq!(device.last_timestamp(), Some(10));
        Ok(())
    }

    #[test]
    fn test_oversized_report_dropped() -> TestResult {
        let mock = dk1("/dev/hidraw1");
        let mut device = open_mock(&mock)?;
        mock.queue_read(vec![0u8; 63]);
        assert_eq!(device.sample_once()?, SampleOutcome::Dropped { len: 63 });
        Ok(())
    }

    #[test]
    fn test_disconnect_is_error() -> TestResult {
        let mock = dk1("/dev/hidraw1");
        let mut device = open_mock(&mock)?;
        mock.disconnect();
        let err = device.sample_once();
        assert!(matches!(err, Err(ref e) if e.is_device_unavailable()));
        Ok(())
    }

    #[test]
    fn test_fusion_settings_keep_filter_history() -> TestResult {
        let mock = dk1("/dev/hidraw1");
        let config = TrackerConfig {
            enable_prediction: true,
            filter_prediction: true,
            ..TrackerConfig::default()
        };
        let mut device = Device::from_transport(mock.clone(), config)?;
        let turning = |timestamp| {
            TrackerReportBuilder::new()
                .sample_count(1)
                .timestamp(timestamp)
                .sample(0, [0, 0, 0], [0, 0, 10_000])
                .build()
        };
        device.process_report(&turning(1));
        let history = device.fusion().filter().history;
        assert_ne!(history[0], [0.0; 3]);

        let mut settings = device.config().fusion_settings();
        settings.filter_prediction = false;
        settings.gain = 0.3;
        device.set_fusion_settings(settings);
        assert!(!device.config().filter_prediction);
        assert!((device.config().gain - 0.3).abs() < 1e-12);
        assert_eq!(device.fusion().settings(), &settings);

        // Bypassed filter leaves the history as it was.
        device.process_report(&turning(2));
        assert!(!device.fusion().filter().enabled);
        assert_eq!(device.fusion().filter().history, history);

        // Re-enabling resumes from the retained history.
        settings.filter_prediction = true;
        device.set_fusion_settings(settings);
        device.process_report(&turning(3));
        assert_eq!(device.fusion().filter().history[1], history[0]);
        Ok(())
    }

    #[test]
    fn test_temperature_and_reset() -> TestResult {
        let mock = dk1("/dev/hidraw1");
        let mut device = open_mock(&mock)?;
        let report = TrackerReportBuilder::new()
            .sample_count(1)
            .timestamp(1)
            .temperature(3_150)
            .sample(0, [0, 0, 0], [0, 0, 20_000])
            .build();
        device.process_report(&report);
        assert!((device.temperature() - 31.5).abs() < 1e-9);
        assert_ne!(device.orientation(), UnitQuaternion::identity());

        device.reset_orientation();
        assert_eq!(device.orientation(), UnitQuaternion::identity());
        assert_eq!(device.last_timestamp(), None);
        Ok(())
    }
}
