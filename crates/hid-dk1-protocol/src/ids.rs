//! Oculus VR USB vendor and product ID constants.

/// Oculus VR USB Vendor ID.
pub const VENDOR_ID: u16 = 0x2833;

/// Rift Development Kit 1 head tracker.
pub const PID_DK1: u16 = 0x0001;

/// Returns `true` if the VID/PID pair identifies a DK1 head tracker.
pub fn is_rift_dk1(vid: u16, pid: u16) -> bool {
    vid == VENDOR_ID && pid == PID_DK1
}
