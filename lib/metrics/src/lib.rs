//! Host metrics: the [`Sample`] data model, the [`MetricsSource`] capability,
//! a `sysinfo` backed source for the running host, and a scripted source for
//! tests.

pub mod collector;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod sample;
pub mod source;

pub use collector::SystemMetricsSource;
pub use sample::{Resource, Sample, SampleError};
pub use source::{CollectError, MetricsSource, MetricsSourceRef};
