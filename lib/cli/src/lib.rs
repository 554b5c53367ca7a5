use clap::{command, Args, Parser, Subcommand};
use getset::Getters;
use std::path::PathBuf;

/// sysmon: periodic system metrics sampler
#[derive(Debug, Parser, Getters)]
#[command(name = "sysmon", version)]
#[command(about = "sysmon: samples CPU, memory and disk usage and hands each sample to plugins", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    #[getset(get = "pub")]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sample the host periodically until interrupted with Ctrl+C
    Run(RunArgs),
    /// Collect a single sample, print it as JSON and exit
    Sample(SampleArgs),
}

#[derive(Debug, Args, Getters)]
#[getset(get = "pub")]
pub struct RunArgs {
    /// Path to a TOML configuration file (defaults to ./sysmon.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Sampling interval in seconds, overrides `monitoring.interval_seconds`
    #[arg(short, long, allow_negative_numbers = true)]
    interval: Option<i64>,
    /// API endpoint receiving each sample, overrides `api_integration.endpoint`
    #[arg(short, long)]
    endpoint: Option<String>,
    /// `tracing` filter directive, e.g. `debug` or `monitor=trace`
    #[arg(long)]
    log_filter: Option<String>,
}

#[derive(Debug, Args, Getters)]
#[getset(get = "pub")]
pub struct SampleArgs {
    /// Path to a TOML configuration file (defaults to ./sysmon.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Mount point whose disk is reported, overrides `monitoring.disk_mount_point`
    #[arg(short, long)]
    mount_point: Option<PathBuf>,
}
