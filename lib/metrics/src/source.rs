use crate::sample::{Sample, SampleError};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Metrics collection was cancelled")]
    Cancelled,
    #[error("Metrics collection task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Metrics source unavailable: {0}")]
    Unavailable(String),
    #[error("Collected sample is invalid: {0}")]
    Invalid(#[from] SampleError),
}

/// A reference-counted reference to a [`MetricsSource`].
pub type MetricsSourceRef = Arc<dyn MetricsSource>;

/// Produces one [`Sample`] on demand.
///
/// Implementations may block on OS calls, but must hand the blocking part to a
/// worker and join it before returning, so that at most one sample is ever in
/// flight. A field that cannot be read is reported as `0` rather than failing
/// the whole sample; an `Err` means no sample exists for this tick.
///
/// The cancellation token is passed so that a slow read can give up early with
/// [`CollectError::Cancelled`].
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Returns the name of the source, used in logs.
    fn name(&self) -> String;

    async fn sample(&self, cancel: &CancellationToken) -> Result<Sample, CollectError>;
}
