//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use nalgebra::UnitQuaternion;
use rift_hid_common::HidDeviceInfo;
use rift_hid_dk1_protocol::DisplayInfo;
use rift_sensor::{CounterSnapshot, TrackingSnapshot};
use serde::Serialize;
use serde_json::json;

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format output as JSON: {e}"),
    }
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    print_json(&json!({
        "success": false,
        "error": { "message": error.to_string() }
    }));
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

pub fn print_device_list(devices: &[HidDeviceInfo], json: bool) {
    if json {
        print_json(&json!({ "success": true, "devices": devices }));
        return;
    }

    if devices.is_empty() {
        println!("{}", "No Rift DK1 trackers found".yellow());
        return;
    }

    println!("{}", "Attached trackers:".bold());
    for (index, device) in devices.iter().enumerate() {
        println!(
            "  [{}] {} {} ({})",
            index,
            device.display_name().bold(),
            device.serial_number.as_deref().unwrap_or("-"),
            device.path.dimmed()
        );
    }
}

/// Distortion record as printed by `info`.
#[derive(Debug, Serialize)]
struct DisplayReport {
    distortion_type: u8,
    h_resolution: u16,
    v_resolution: u16,
    h_screen_size: f32,
    v_screen_size: f32,
    v_center: f32,
    lens_separation: f32,
    eye_to_screen_distance: [f32; 2],
    distortion_k: [f32; 6],
}

impl From<&DisplayInfo> for DisplayReport {
    fn from(info: &DisplayInfo) -> Self {
        Self {
            distortion_type: info.distortion_type,
            h_resolution: info.h_resolution,
            v_resolution: info.v_resolution,
            h_screen_size: info.h_screen_size,
            v_screen_size: info.v_screen_size,
            v_center: info.v_center,
            lens_separation: info.lens_separation,
            eye_to_screen_distance: info.eye_to_screen_distance,
            distortion_k: info.distortion_k,
        }
    }
}

pub fn print_device_info(identity: &HidDeviceInfo, display: &DisplayInfo, json: bool) {
    if json {
        print_json(&json!({
            "success": true,
            "device": identity,
            "display": DisplayReport::from(display),
        }));
        return;
    }

    println!("{}", identity.display_name().bold());
    println!("  Manufacturer: {}", identity.manufacturer.as_deref().unwrap_or("-"));
    println!("  Serial:       {}", identity.serial_number.as_deref().unwrap_or("-"));
    println!(
        "  USB id:       {:04X}:{:04X}",
        identity.vendor_id, identity.product_id
    );
    println!("  Path:         {}", identity.path);

    if display.is_empty() {
        println!("  {}", "No display calibration reported".yellow());
        return;
    }
    println!(
        "  Resolution:   {}x{} ({:.4} m x {:.4} m)",
        display.h_resolution, display.v_resolution, display.h_screen_size, display.v_screen_size
    );
    println!(
        "  Lenses:       separation {:.4} m, eye-to-screen {:.4}/{:.4} m",
        display.lens_separation, display.eye_to_screen_distance[0], display.eye_to_screen_distance[1]
    );
    println!(
        "  Distortion:   {:?} K = {:?}",
        display.distortion_base(),
        display.distortion_k
    );
}

/// Y-up decomposition `q = Ry(yaw) * Rx(pitch) * Rz(roll)`, in radians.
fn yaw_pitch_roll(q: &UnitQuaternion<f64>) -> [f64; 3] {
    let rotation = q.to_rotation_matrix();
    let m = rotation.matrix();
    let pitch = (-m[(1, 2)]).clamp(-1.0, 1.0).asin();
    let yaw = m[(0, 2)].atan2(m[(2, 2)]);
    let roll = m[(1, 0)].atan2(m[(1, 1)]);
    [yaw, pitch, roll]
}

/// One `track` sample line.
#[derive(Debug, Clone, Serialize)]
pub struct TrackReading {
    pub elapsed_ms: u64,
    /// `[w, x, y, z]`
    pub orientation: [f64; 4],
    /// `[yaw, pitch, roll]` in degrees.
    pub euler_deg: [f64; 3],
    pub temperature: f64,
    pub timestamp: Option<u16>,
    pub updates: u64,
}

impl TrackReading {
    pub fn new(elapsed_ms: u64, snapshot: &TrackingSnapshot, predicted: bool) -> Self {
        let q = if predicted {
            snapshot.predicted
        } else {
            snapshot.orientation
        };
        Self {
            elapsed_ms,
            orientation: [q.w, q.i, q.j, q.k],
            euler_deg: yaw_pitch_roll(&q).map(f64::to_degrees),
            temperature: snapshot.temperature,
            timestamp: snapshot.last_timestamp,
            updates: snapshot.updates,
        }
    }
}

pub fn print_reading(reading: &TrackReading, json: bool) {
    if json {
        match serde_json::to_string(reading) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Failed to format reading as JSON: {e}"),
        }
        return;
    }
    let [yaw, pitch, roll] = reading.euler_deg;
    println!(
        "[{:>7} ms] yaw {:>8.2}  pitch {:>8.2}  roll {:>8.2}  {:>5.1} °C",
        reading.elapsed_ms, yaw, pitch, roll, reading.temperature
    );
}

pub fn print_counters(counters: &CounterSnapshot, json: bool) {
    if json {
        print_json(&json!({ "success": true, "counters": counters }));
        return;
    }
    println!("{}", "Session counters:".bold());
    println!("  reports processed:   {}", counters.reports_processed);
    println!("  reports dropped:     {}", counters.reports_dropped);
    println!("  frames processed:    {}", counters.frames_processed);
    println!("  catch-up frames:     {}", counters.synthesized_frames);
    println!("  empty reads:         {}", counters.empty_reads);
    println!("  read errors:         {}", counters.read_errors);
    println!(
        "  keep-alives:         {} sent, {} failed",
        counters.keep_alives_sent, counters.keep_alive_failures
    );
}
