//! Prints the available accelerators and fails when there are none.
//!
//! ```text
//! $ list-accelerators
//! GPU: ["NVIDIA GeForce RTX 3080"]
//! ```
//!
//! Exit status is 1 if no accelerator is found. Logs go to stderr and
//! follow `RUST_LOG` (default `info`).

use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use ml_hardware::{BackendSet, ProbeConfig, accelerator_names, list_devices};
use serde::Serialize;

/// List the GPUs available for training.
#[derive(Parser)]
#[command(name = "list-accelerators")]
#[command(about = "List available accelerators", long_about = None)]
#[command(version)]
struct Cli {
    /// Print a JSON report instead of the one-line list
    #[arg(long)]
    json: bool,

    /// Graphics APIs to probe
    #[arg(long, value_enum, default_value_t = Backends::Primary)]
    backends: Backends,

    /// Count virtual (hypervisor) GPUs as accelerators
    #[arg(long)]
    include_virtual: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backends {
    Primary,
    Secondary,
    All,
}

impl From<Backends> for BackendSet {
    fn from(backends: Backends) -> Self {
        match backends {
            Backends::Primary => Self::Primary,
            Backends::Secondary => Self::Secondary,
            Backends::All => Self::All,
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    accelerators: &'a [String],
    devices: &'a [ml_hardware::DeviceInfo],
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let config = ProbeConfig::default()
        .with_backends(cli.backends.into())
        .with_include_virtual(cli.include_virtual);

    let devices = list_devices(&config);
    let accelerators = accelerator_names(&devices, &config);

    if cli.json {
        let report = Report {
            accelerators: &accelerators,
            devices: &devices,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("GPU: {accelerators:?}");
    }

    if accelerators.is_empty() {
        tracing::warn!(devices = devices.len(), "no accelerator found");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let ansi_enabled = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(ansi_enabled)
        .init();
}
