//! `hidapi`-backed transport.

use std::ffi::CString;

use hidapi::{HidApi, HidError};
use tracing::{debug, warn};

use crate::{HidBackend, HidCommonError, HidCommonResult, HidDeviceInfo, HidTransport};

pub struct HidApiBackend {
    api: HidApi,
}

impl HidApiBackend {
    pub fn new() -> HidCommonResult<Self> {
        let api = HidApi::new().map_err(|e| HidCommonError::OpenError(e.to_string()))?;
        Ok(Self { api })
    }

    /// Re-scan the system for HID devices.
    pub fn refresh(&mut self) -> HidCommonResult<()> {
        self.api
            .refresh_devices()
            .map_err(|e| HidCommonError::OpenError(e.to_string()))
    }
}

fn classify_open_error(path: &str, err: &HidError) -> HidCommonError {
    let message = err.to_string();
    if HidCommonError::looks_like_permission_error(&message) {
        HidCommonError::PermissionDenied(format!("{path}: {message}"))
    } else {
        HidCommonError::OpenError(format!("{path}: {message}"))
    }
}

fn classify_io_error(err: &HidError, write: bool) -> HidCommonError {
    let message = err.to_string();
    let lower = message.to_ascii_lowercase();
    if lower.contains("no such device") || lower.contains("disconnected") {
        HidCommonError::Disconnected
    } else if write {
        HidCommonError::WriteError(message)
    } else {
        HidCommonError::ReadError(message)
    }
}

impl HidBackend for HidApiBackend {
    type Transport = HidApiTransport;

    fn enumerate(&self, vendor_id: u16, product_id: u16) -> HidCommonResult<Vec<HidDeviceInfo>> {
        let mut found: Vec<HidDeviceInfo> = self
            .api
            .device_list()
            .filter(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .map(|d| HidDeviceInfo {
                vendor_id: d.vendor_id(),
                product_id: d.product_id(),
                serial_number: d.serial_number().map(str::to_owned),
                manufacturer: d.manufacturer_string().map(str::to_owned),
                product_name: d.product_string().map(str::to_owned),
                path: d.path().to_string_lossy().into_owned(),
            })
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(vendor_id, product_id, count = found.len(), "enumerated HID devices");
        Ok(found)
    }

    fn open(&self, info: &HidDeviceInfo) -> HidCommonResult<HidApiTransport> {
        let path = CString::new(info.path.as_str())
            .map_err(|e| HidCommonError::InvalidReport(format!("bad device path: {e}")))?;
        let device = self.api.open_path(&path).map_err(|e| {
            let err = classify_open_error(&info.path, &e);
            warn!(path = %info.path, error = %err, "failed to open HID device");
            err
        })?;
        Ok(HidApiTransport {
            device,
            info: info.clone(),
        })
    }
}

pub struct HidApiTransport {
    device: hidapi::HidDevice,
    info: HidDeviceInfo,
}

impl HidTransport for HidApiTransport {
    fn send_feature_report(&mut self, data: &[u8]) -> HidCommonResult<usize> {
        self.device
            .send_feature_report(data)
            .map_err(|e| classify_io_error(&e, true))?;
        Ok(data.len())
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> HidCommonResult<usize> {
        self.device
            .get_feature_report(buf)
            .map_err(|e| classify_io_error(&e, false))
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> HidCommonResult<usize> {
        self.device
            .read_timeout(buf, timeout_ms)
            .map_err(|e| classify_io_error(&e, false))
    }

    fn device_info(&self) -> &HidDeviceInfo {
        &self.info
    }
}
