use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, RunArgs, SampleArgs};
use common::config::DEFAULT_CONFIG_FILE;
use common::util::trace::initialize_tracing;
use common::MonitorConfig;
use metrics::{MetricsSource, SystemMetricsSource};
use monitor::shutdown::cancel_on_ctrl_c;
use monitor::{CancellationToken, Dispatcher, MonitorLoop, TracingSink};
use plugin::{ApiReporterPlugin, PluginRegistry};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Cli::parse();

    match args.command() {
        Commands::Run(args) => run(args).await,
        Commands::Sample(args) => sample(args).await,
    }
}

/// Load the config file named on the command line, or `sysmon.toml` in the
/// working directory when it exists.
fn load_config(path: Option<&Path>) -> Result<MonitorConfig> {
    let config = match path {
        Some(path) => MonitorConfig::load(path, true),
        None => MonitorConfig::load(Path::new(DEFAULT_CONFIG_FILE), false),
    };

    config.context("Configuration error")
}

async fn run(args: &RunArgs) -> Result<()> {
    let mut config = load_config(args.config().as_deref())?;
    config.apply_overrides(
        *args.interval(),
        args.endpoint().as_deref(),
        args.log_filter().as_deref(),
    );

    let _log_guard = initialize_tracing(
        config.logging().filter(),
        config.logging().directory().as_deref(),
    )?;
    info!("sysmon started");

    config.validate().context("Configuration error")?;
    let interval_seconds = config.sampling_interval()?;

    let mut registry = PluginRegistry::new();
    if let Some(api) = config.api_integration() {
        let reporter = ApiReporterPlugin::new(
            api.endpoint(),
            Duration::from_secs(*api.timeout_seconds()),
        )?;
        registry.register(reporter);
    }

    let events = Arc::new(TracingSink);
    let source = Arc::new(SystemMetricsSource::new(
        config.monitoring().disk_mount_point().clone(),
    ));
    let dispatcher = Dispatcher::new(Arc::new(registry), events.clone());
    let monitor = MonitorLoop::new(source, dispatcher, events);

    let cancel = CancellationToken::new();
    let watcher = cancel_on_ctrl_c(cancel.clone());

    let result = monitor.run(interval_seconds, &cancel).await;

    cancel.cancel();
    watcher.await?;

    result.context("Configuration error")?;
    info!("sysmon stopped");
    Ok(())
}

async fn sample(args: &SampleArgs) -> Result<()> {
    let config = load_config(args.config().as_deref())?;
    let mount_point = args
        .mount_point()
        .clone()
        .or_else(|| config.monitoring().disk_mount_point().clone());

    let source = SystemMetricsSource::new(mount_point);
    let sample = source
        .sample(&CancellationToken::new())
        .await
        .context("Error collecting metrics")?;

    println!("{}", serde_json::to_string_pretty(&sample)?);
    Ok(())
}
