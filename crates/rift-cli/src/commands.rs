//! Subcommand implementations.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rift_hid_common::HidApiBackend;
use rift_hid_dk1_protocol::SensorRange;
use rift_sensor::{Device, Sampler, TrackerConfig, list_devices};
use tracing::info;

use crate::error::CliError;
use crate::output::{self, TrackReading};

/// Options for `riftctl track`.
#[derive(Debug, Clone)]
pub struct TrackOptions {
    pub index: usize,
    pub duration: Duration,
    pub interval: Duration,
    pub predicted: bool,
    pub range: Option<SensorRange>,
}

/// Load a JSON [`TrackerConfig`], or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<TrackerConfig> {
    let Some(path) = path else {
        return Ok(TrackerConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: TrackerConfig = serde_json::from_str(&text)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    config.validate().map_err(CliError::from)?;
    Ok(config)
}

fn backend() -> Result<HidApiBackend> {
    HidApiBackend::new().context("Failed to initialise the HID API")
}

pub fn list(json: bool) -> Result<()> {
    let backend = backend()?;
    let devices = list_devices(&backend).map_err(CliError::from)?;
    output::print_device_list(&devices, json);
    Ok(())
}

pub fn info(index: usize, config: TrackerConfig, json: bool) -> Result<()> {
    let backend = backend()?;
    let device = Device::open(&backend, index, config).map_err(CliError::from)?;
    output::print_device_info(device.identity(), device.display_info(), json);
    Ok(())
}

pub fn track(options: &TrackOptions, config: TrackerConfig, json: bool) -> Result<()> {
    let backend = backend()?;
    let mut device = Device::open(&backend, options.index, config).map_err(CliError::from)?;

    if let Some(range) = &options.range {
        device
            .set_range(range)
            .map_err(CliError::from)
            .context("Failed to set sensor range")?;
    }

    let handle = Sampler::spawn(device).map_err(CliError::from)?;
    info!(duration_s = options.duration.as_secs_f64(), "tracking");

    let start = Instant::now();
    while start.elapsed() < options.duration && handle.is_running() {
        thread::sleep(options.interval);
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let reading = TrackReading::new(elapsed_ms, &handle.snapshot(), options.predicted);
        output::print_reading(&reading, json);
    }

    let disconnected = !handle.is_running();
    let counters = handle.counters();
    drop(handle.stop());
    output::print_counters(&counters, json);

    if disconnected {
        anyhow::bail!("tracker stopped responding before the tracking window ended");
    }
    Ok(())
}
