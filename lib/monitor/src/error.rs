use thiserror::Error;

/// Errors that escape [`crate::MonitorLoop::run`]. Everything that goes wrong
/// inside a tick is reported to the event sink instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("Monitoring interval must be a positive number of seconds, got {0}")]
    InvalidInterval(i64),
}
