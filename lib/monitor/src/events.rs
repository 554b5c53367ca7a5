//! Telemetry emitted by the monitor loop and the dispatcher.
//!
//! The loop and dispatcher never log directly: they report to an
//! [`EventSink`] handed to them at construction. [`TracingSink`] forwards every
//! event to `tracing`; tests substitute a recording sink.

use common::util::time::format_duration;
use core::fmt;
use metrics::{CollectError, Sample};
use shrinkwraprs::Shrinkwrap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// 1-based position of a tick within one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Shrinkwrap)]
pub struct TickNumber(pub u64);

impl TickNumber {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TickNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a plugin in reports: its name plus its position in the registry,
/// so two plugins sharing a name can still be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginId {
    pub index: usize,
    pub name: String,
}

impl PluginId {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.index)
    }
}

/// A reference-counted reference to an [`EventSink`].
pub type EventSinkRef = Arc<dyn EventSink>;

/// Receives the structured events of a monitoring run. Implementations must
/// not panic and should return quickly; they are called from the loop's task.
pub trait EventSink: Send + Sync {
    /// The interval was accepted and the first tick is about to start.
    fn loop_started(&self, interval: Duration);

    fn tick_started(&self, tick: TickNumber);

    fn sample_collected(&self, tick: TickNumber, sample: &Sample);

    fn sample_failed(&self, tick: TickNumber, error: &CollectError);

    fn plugin_succeeded(&self, plugin: &PluginId, elapsed: Duration);

    fn plugin_failed(&self, plugin: &PluginId, error: &anyhow::Error);

    /// `ticks` is the number of ticks that were started during the run.
    fn loop_stopped(&self, ticks: u64);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn loop_started(&self, interval: Duration) {
        info!(?interval, "Monitoring started");
    }

    fn tick_started(&self, tick: TickNumber) {
        debug!(%tick, "Tick started");
    }

    fn sample_collected(&self, tick: TickNumber, sample: &Sample) {
        info!(%tick, "System Metrics: {}", sample);
    }

    fn sample_failed(&self, tick: TickNumber, error: &CollectError) {
        error!(%tick, "Error collecting metrics: {}", error);
    }

    fn plugin_succeeded(&self, plugin: &PluginId, elapsed: Duration) {
        debug!(%plugin, "Plugin processed sample in {}", format_duration(elapsed));
    }

    fn plugin_failed(&self, plugin: &PluginId, error: &anyhow::Error) {
        error!(%plugin, "Error in plugin {}: {:#}", plugin.name, error);
    }

    fn loop_stopped(&self, ticks: u64) {
        info!(ticks, "Monitoring stopped");
    }
}
