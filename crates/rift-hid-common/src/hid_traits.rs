//! HID device traits

use crate::{HidCommonError, HidCommonResult, HidDeviceInfo};

/// An open HID endpoint.
///
/// All calls are blocking and are expected to come from a single thread at a
/// time; `Send` lets a session move the transport onto its sampling thread.
pub trait HidTransport: Send {
    /// Send a feature report. `data[0]` is the report ID.
    fn send_feature_report(&mut self, data: &[u8]) -> HidCommonResult<usize>;

    /// Fetch a feature report. The caller sets `buf[0]` to the report ID;
    /// returns the number of bytes written into `buf`.
    fn get_feature_report(&mut self, buf: &mut [u8]) -> HidCommonResult<usize>;

    /// Read one interrupt report, waiting at most `timeout_ms`
    /// (`0` = poll, `-1` = block). `Ok(0)` means no report arrived.
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> HidCommonResult<usize>;

    /// Non-blocking read.
    fn read(&mut self, buf: &mut [u8]) -> HidCommonResult<usize> {
        self.read_timeout(buf, 0)
    }

    fn device_info(&self) -> &HidDeviceInfo;
}

/// Enumerates and opens HID endpoints.
pub trait HidBackend {
    type Transport: HidTransport;

    /// List endpoints matching `vendor_id`/`product_id`, in a stable order.
    fn enumerate(&self, vendor_id: u16, product_id: u16) -> HidCommonResult<Vec<HidDeviceInfo>>;

    fn open(&self, info: &HidDeviceInfo) -> HidCommonResult<Self::Transport>;
}

pub mod mock {
    //! Scripted in-memory transport for tests and simulations.

    use super::*;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// One scripted outcome for [`HidTransport::read_timeout`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MockRead {
        Report(Vec<u8>),
        /// The read times out with no data.
        Timeout,
        /// The read fails with a transport error.
        Fail(String),
    }

    /// Cloning shares the underlying queues, so a test can keep one handle
    /// while a session owns another.
    #[derive(Debug, Clone)]
    pub struct MockHidDevice {
        info: HidDeviceInfo,
        read_queue: Arc<Mutex<VecDeque<MockRead>>>,
        feature_responses: Arc<Mutex<HashMap<u8, Vec<u8>>>>,
        feature_history: Arc<Mutex<Vec<Vec<u8>>>>,
        fail_feature_writes: Arc<Mutex<bool>>,
        connected: Arc<Mutex<bool>>,
        idle_wait: Duration,
    }

    impl MockHidDevice {
        pub fn new(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
            Self::with_info(HidDeviceInfo::new(vendor_id, product_id, path))
        }

        pub fn with_info(info: HidDeviceInfo) -> Self {
            Self {
                info,
                read_queue: Arc::new(Mutex::new(VecDeque::new())),
                feature_responses: Arc::new(Mutex::new(HashMap::new())),
                feature_history: Arc::new(Mutex::new(Vec::new())),
                fail_feature_writes: Arc::new(Mutex::new(false)),
                connected: Arc::new(Mutex::new(true)),
                idle_wait: Duration::ZERO,
            }
        }

        /// Sleep up to `wait` on reads that find the queue empty, so a polling
        /// loop does not spin.
        pub fn with_idle_wait(mut self, wait: Duration) -> Self {
            self.idle_wait = wait;
            self
        }

        pub fn queue_read(&self, data: Vec<u8>) {
            self.push_read(MockRead::Report(data));
        }

        pub fn queue_timeout(&self) {
            self.push_read(MockRead::Timeout);
        }

        pub fn queue_read_error(&self, message: impl Into<String>) {
            self.push_read(MockRead::Fail(message.into()));
        }

        pub fn push_read(&self, read: MockRead) {
            let mut queue = self.read_queue.lock().unwrap_or_else(|e| e.into_inner());
            queue.push_back(read);
        }

        pub fn pending_reads(&self) -> usize {
            self.read_queue
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .len()
        }

        /// Respond to `get_feature_report` for `report[0]` with `report`.
        pub fn set_feature_response(&self, report: Vec<u8>) {
            if let Some(&id) = report.first() {
                let mut responses = self
                    .feature_responses
                    .lock()
                    .unwrap_or_else(|e| e.into_inner());
                responses.insert(id, report);
            }
        }

        pub fn set_feature_write_failure(&self, fail: bool) {
            *self
                .fail_feature_writes
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = fail;
        }

        /// Every feature report sent so far, in order.
        pub fn get_feature_history(&self) -> Vec<Vec<u8>> {
            let history = self
                .feature_history
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            history.clone()
        }

        pub fn disconnect(&self) {
            let mut connected = self.connected.lock().unwrap_or_else(|e| e.into_inner());
            *connected = false;
        }

        pub fn reconnect(&self) {
            let mut connected = self.connected.lock().unwrap_or_else(|e| e.into_inner());
            *connected = true;
        }

        pub fn is_connected(&self) -> bool {
            *self.connected.lock().unwrap_or_else(|e| e.into_inner())
        }

        fn ensure_connected(&self) -> HidCommonResult<()> {
            if self.is_connected() {
                Ok(())
            } else {
                Err(HidCommonError::Disconnected)
            }
        }
    }

    impl HidTransport for MockHidDevice {
        fn send_feature_report(&mut self, data: &[u8]) -> HidCommonResult<usize> {
            self.ensure_connected()?;
            if *self
                .fail_feature_writes
                .lock()
                .unwrap_or_else(|e| e.into_inner())
            {
                return Err(HidCommonError::WriteError(
                    "scripted feature write failure".to_string(),
                ));
            }

            let mut history = self
                .feature_history
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            history.push(data.to_vec());
            Ok(data.len())
        }

        fn get_feature_report(&mut self, buf: &mut [u8]) -> HidCommonResult<usize> {
            self.ensure_connected()?;
            let id = buf
                .first()
                .copied()
                .ok_or_else(|| HidCommonError::InvalidReport("empty buffer".to_string()))?;

            let responses = self
                .feature_responses
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            let report = responses.get(&id).ok_or_else(|| {
                HidCommonError::ReadError(format!("no feature report {id:#04x}"))
            })?;
            let n = report.len().min(buf.len());
            buf[..n].copy_from_slice(&report[..n]);
            Ok(n)
        }

        fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> HidCommonResult<usize> {
            self.ensure_connected()?;
            let next = self
                .read_queue
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front();

            match next {
                Some(MockRead::Report(data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    Ok(n)
                }
                Some(MockRead::Timeout) => Ok(0),
                Some(MockRead::Fail(message)) => Err(HidCommonError::ReadError(message)),
                None => {
                    if timeout_ms != 0 && !self.idle_wait.is_zero() {
                        let requested = Duration::from_millis(u64::from(timeout_ms.unsigned_abs()));
                        let wait = if timeout_ms < 0 {
                            self.idle_wait
                        } else {
                            requested.min(self.idle_wait)
                        };
                        std::thread::sleep(wait);
                    }
                    Ok(0)
                }
            }
        }

        fn device_info(&self) -> &HidDeviceInfo {
            &self.info
        }
    }

    /// Backend over a fixed set of [`MockHidDevice`]s.
    #[derive(Debug, Default)]
    pub struct MockHidBackend {
        devices: Vec<MockHidDevice>,
        denied_paths: HashSet<String>,
    }

    impl MockHidBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_device(&mut self, device: MockHidDevice) {
            self.devices.push(device);
        }

        /// Opening `path` fails with [`HidCommonError::PermissionDenied`].
        pub fn deny_access(&mut self, path: impl Into<String>) {
            self.denied_paths.insert(path.into());
        }

        pub fn device_count(&self) -> usize {
            self.devices.len()
        }
    }

    impl HidBackend for MockHidBackend {
        type Transport = MockHidDevice;

        fn enumerate(
            &self,
            vendor_id: u16,
            product_id: u16,
        ) -> HidCommonResult<Vec<HidDeviceInfo>> {
            Ok(self
                .devices
                .iter()
                .filter(|d| d.info.matches(vendor_id, product_id))
                .map(|d| d.info.clone())
                .collect())
        }

        fn open(&self, info: &HidDeviceInfo) -> HidCommonResult<MockHidDevice> {
            if self.denied_paths.contains(&info.path) {
                return Err(HidCommonError::PermissionDenied(info.path.clone()));
            }
            self.devices
                .iter()
                .find(|d| d.info.path == info.path)
                .cloned()
                .ok_or_else(|| HidCommonError::DeviceNotFound(info.path.clone()))
        }
    }
}
