//! In-memory plugins for tests.

use crate::Plugin;
use anyhow::bail;
use async_trait::async_trait;
use metrics::Sample;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared view of the samples a [`RecordingPlugin`] has received.
pub type RecordedSamples = Arc<Mutex<Vec<Sample>>>;

/// Records every sample it is given.
#[derive(Debug, Clone)]
pub struct RecordingPlugin {
    name: String,
    seen: RecordedSamples,
}

impl RecordingPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle that stays readable after the plugin is moved into a registry.
    pub fn recorded(&self) -> RecordedSamples {
        self.seen.clone()
    }
}

#[async_trait]
impl Plugin for RecordingPlugin {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn process(&self, sample: &Sample) -> anyhow::Result<()> {
        self.seen.lock().push(*sample);
        Ok(())
    }
}

/// Fails on every call.
#[derive(Debug, Clone)]
pub struct FailingPlugin {
    name: String,
    calls: Arc<AtomicUsize>,
}

impl FailingPlugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle to the call counter.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl Plugin for FailingPlugin {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn process(&self, _sample: &Sample) -> anyhow::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        bail!("{} failed on call {}", self.name, call)
    }
}
