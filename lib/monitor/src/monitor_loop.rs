use crate::dispatcher::Dispatcher;
use crate::error::MonitorError;
use crate::events::{EventSinkRef, TickNumber};
use core::fmt;
use metrics::{CollectError, MetricsSourceRef, Sample};
use std::ops::ControlFlow;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use typed_builder::TypedBuilder;

/// Periodic sampler: collect, dispatch, wait, until cancelled.
///
/// Ticks never overlap. Cancellation is checked before each tick, raced
/// against the inter-tick wait, and handed to the source so a slow read can
/// bail out as well. A failed collection skips dispatch for that tick only.
#[derive(TypedBuilder)]
pub struct MonitorLoop {
    source: MetricsSourceRef,
    dispatcher: Dispatcher,
    events: EventSinkRef,
}

impl MonitorLoop {
    pub fn new(source: MetricsSourceRef, dispatcher: Dispatcher, events: EventSinkRef) -> Self {
        MonitorLoop::builder()
            .source(source)
            .dispatcher(dispatcher)
            .events(events)
            .build()
    }

    /// Run until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Only [`MonitorError::InvalidInterval`], returned before the first tick
    /// when `interval_seconds` is not positive. Cancellation ends the run with
    /// `Ok(())`.
    pub async fn run(
        &self,
        interval_seconds: i64,
        cancel: &CancellationToken,
    ) -> Result<(), MonitorError> {
        let interval = interval_from_secs(interval_seconds)?;

        debug!(
            source = %self.source.name(),
            plugins = self.dispatcher.registry().len(),
            "Starting monitor loop"
        );
        self.events.loop_started(interval);

        let mut tick = TickNumber::default();
        while !cancel.is_cancelled() {
            tick = tick.next();
            if self.tick(tick, cancel).await.is_break() {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        self.events.loop_stopped(*tick);
        Ok(())
    }

    /// One collect-and-dispatch pass. Breaks when the run's token was cancelled
    /// while collecting; a source that gives up on its own is a failed tick.
    #[instrument(skip_all, fields(tick = %tick))]
    async fn tick(&self, tick: TickNumber, cancel: &CancellationToken) -> ControlFlow<()> {
        self.events.tick_started(tick);

        let sample = match self.collect(cancel).await {
            Ok(sample) => sample,
            Err(CollectError::Cancelled) if cancel.is_cancelled() => {
                return ControlFlow::Break(())
            }
            Err(error) => {
                self.events.sample_failed(tick, &error);
                return ControlFlow::Continue(());
            }
        };

        if cancel.is_cancelled() {
            return ControlFlow::Break(());
        }

        self.events.sample_collected(tick, &sample);
        self.dispatcher.notify(&sample).await;
        ControlFlow::Continue(())
    }

    async fn collect(&self, cancel: &CancellationToken) -> Result<Sample, CollectError> {
        let sample = self.source.sample(cancel).await?;
        sample.validate()?;
        Ok(sample)
    }
}

impl fmt::Debug for MonitorLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorLoop")
            .field("source", &self.source.name())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

fn interval_from_secs(interval_seconds: i64) -> Result<Duration, MonitorError> {
    u64::try_from(interval_seconds)
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or(MonitorError::InvalidInterval(interval_seconds))
}
