//! riftctl - Rift DK1 tracker CLI
//!
//! Lists attached DK1 head trackers, prints their identity and display
//! calibration, and streams the fused orientation.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rift_hid_dk1_protocol::SensorRange;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::TrackOptions;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "riftctl")]
#[command(about = "Rift DK1 tracker CLI - list trackers, read calibration, stream orientation")]
#[command(version)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Tracker configuration file (JSON)
    #[arg(long, global = true, env = "RIFTCTL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List attached DK1 trackers
    List,

    /// Show identity and display calibration of one tracker
    Info {
        /// Enumeration index
        #[arg(short, long, default_value = "0")]
        index: usize,
    },

    /// Stream orientation from one tracker
    Track {
        /// Enumeration index
        #[arg(short, long, default_value = "0")]
        index: usize,

        /// Tracking time in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Milliseconds between printed readings
        #[arg(long, default_value = "100")]
        interval_ms: u64,

        /// Print the predicted orientation instead of the current one
        #[arg(long)]
        predicted: bool,

        /// Requested accelerometer range in m/s²
        #[arg(long, requires_all = ["max_gyro", "max_mag"])]
        max_accel: Option<f32>,

        /// Requested gyroscope range in rad/s
        #[arg(long, requires_all = ["max_accel", "max_mag"])]
        max_gyro: Option<f32>,

        /// Requested magnetometer range in gauss
        #[arg(long, requires_all = ["max_accel", "max_gyro"])]
        max_mag: Option<f32>,
    },
}

impl Commands {
    fn track_options(&self) -> Option<TrackOptions> {
        match *self {
            Commands::Track {
                index,
                duration,
                interval_ms,
                predicted,
                max_accel,
                max_gyro,
                max_mag,
            } => {
                let range = match (max_accel, max_gyro, max_mag) {
                    (Some(max_acceleration), Some(max_rotation_rate), Some(max_magnetic_field)) => {
                        Some(SensorRange {
                            max_acceleration,
                            max_rotation_rate,
                            max_magnetic_field,
                        })
                    }
                    _ => None,
                };
                Some(TrackOptions {
                    index,
                    duration: Duration::from_secs(duration),
                    interval: Duration::from_millis(interval_ms.max(1)),
                    predicted,
                    range,
                })
            }
            _ => None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("riftctl={log_level},rift_sensor={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match execute_command(&cli) {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            std::process::exit(exit_code(&e));
        }
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    error.downcast_ref::<CliError>().map_or(1, CliError::exit_code)
}

fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::List => commands::list(cli.json),
        Commands::Info { index } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::info(*index, config, cli.json)
        }
        track @ Commands::Track { .. } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let options = track
                .track_options()
                .ok_or_else(|| anyhow::anyhow!("track options unavailable"))?;
            commands::track(&options, config, cli.json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rift_sensor::SensorError;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_list_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["riftctl", "list"])?;
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
        assert!(matches!(cli.command, Commands::List));
        Ok(())
    }

    #[test]
    fn parse_info_index() -> TestResult {
        let cli = Cli::try_parse_from(["riftctl", "info", "--index", "2", "--json"])?;
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Info { index: 2 }));
        Ok(())
    }

    #[test]
    fn parse_track_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["riftctl", "-vv", "track"])?;
        assert_eq!(cli.verbose, 2);
        let options = cli.command.track_options().ok_or("no track options")?;
        assert_eq!(options.index, 0);
        assert_eq!(options.duration, Duration::from_secs(10));
        assert_eq!(options.interval, Duration::from_millis(100));
        assert!(!options.predicted);
        assert!(options.range.is_none());
        Ok(())
    }

    #[test]
    fn parse_track_with_range() -> TestResult {
        let cli = Cli::try_parse_from([
            "riftctl",
            "track",
            "--duration",
            "3",
            "--predicted",
            "--max-accel",
            "39.24",
            "--max-gyro",
            "8.7",
            "--max-mag",
            "1.3",
            "--config",
            "tracker.json",
        ])?;
        assert_eq!(cli.config, Some(PathBuf::from("tracker.json")));
        let options = cli.command.track_options().ok_or("no track options")?;
        assert!(options.predicted);
        let range = options.range.ok_or("range not parsed")?;
        assert!((range.max_rotation_rate - 8.7).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn partial_range_is_rejected() {
        let result = Cli::try_parse_from(["riftctl", "track", "--max-accel", "20"]);
        assert!(result.is_err());
    }

    #[test]
    fn exit_codes_follow_error_kind() {
        let not_found = anyhow::Error::new(CliError::from(SensorError::DeviceNotFound {
            index: 0,
            found: 0,
        }));
        let denied =
            anyhow::Error::new(CliError::from(SensorError::PermissionDenied("x".into())));
        let other = anyhow::anyhow!("boom");

        assert_eq!(exit_code(&not_found), 2);
        assert_eq!(exit_code(&denied), 6);
        assert_eq!(exit_code(&other), 1);
    }
}
