//! Deterministic [`MetricsSource`] for tests: replays a script of samples and
//! failures instead of touching the host.

use crate::sample::Sample;
use crate::source::{CollectError, MetricsSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One scripted outcome of [`ScriptedSource::sample`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Sample(Sample),
    Fail(String),
    /// Report [`CollectError::Cancelled`] without the run's token being cancelled.
    Cancelled,
    /// Cancel the run's token, then return the sample anyway.
    CancelAndSample(Sample),
}

#[derive(Debug)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Step>>,
    // Returned forever once the script runs out; `None` fails instead.
    repeat: Option<Sample>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            repeat: None,
            latency: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A source that returns `sample` on every call.
    pub fn repeating(sample: Sample) -> Self {
        Self {
            repeat: Some(sample),
            ..Self::new(Vec::<Step>::new())
        }
    }

    /// Sleep for `latency` (cancellably) before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of times `sample` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsSource for ScriptedSource {
    fn name(&self) -> String {
        "ScriptedSource".to_string()
    }

    async fn sample(&self, cancel: &CancellationToken) -> Result<Sample, CollectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CollectError::Cancelled),
                _ = tokio::time::sleep(latency) => {}
            }
        }

        let next = self.script.lock().pop_front();
        match next {
            Some(Step::Sample(sample)) => Ok(sample),
            Some(Step::Fail(reason)) => Err(CollectError::Unavailable(reason)),
            Some(Step::Cancelled) => Err(CollectError::Cancelled),
            Some(Step::CancelAndSample(sample)) => {
                cancel.cancel();
                Ok(sample)
            }
            None => self
                .repeat
                .ok_or_else(|| CollectError::Unavailable("script exhausted".to_string())),
        }
    }
}
