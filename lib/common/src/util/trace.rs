use super::time::elapsed_subsec;
use anyhow::Result;
use indicatif::ProgressStyle;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::fmt::{
    self,
    format::{DefaultFields, Format},
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Name of the rolling log file; the appender suffixes it with the date.
pub const LOG_FILE_PREFIX: &str = "system-monitor.log";

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter` when it is set. Long
/// running spans (a slow sample, a slow plugin) are rendered as progress
/// spinners by the indicatif layer. With a `log_directory`, events are also
/// appended to a daily rolling file there; keep the returned guard alive until
/// shutdown, dropping it flushes the file.
pub fn initialize_tracing(
    default_filter: &str,
    log_directory: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)?,
    };

    let indicatif_layer = IndicatifLayer::new()
        .with_progress_style(
            ProgressStyle::with_template(
                "{span_child_prefix}{span_fields} -- {span_name} {wide_msg} {elapsed_subsec}",
            )?
            .with_key("elapsed_subsec", elapsed_subsec),
        )
        .with_span_child_prefix_symbol("↳ ")
        .with_span_child_prefix_indent(" ");

    let (file_layer, guard) = match log_directory {
        Some(directory) => {
            let (layer, guard) = rolling_file_layer(directory);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(indicatif_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// Plain-text fmt layer writing to `directory/system-monitor.log.<date>`
/// through a background worker.
pub fn rolling_file_layer<S>(
    directory: &Path,
) -> (fmt::Layer<S, DefaultFields, Format, NonBlocking>, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer().with_writer(writer).with_ansi(false);
    (layer, guard)
}
