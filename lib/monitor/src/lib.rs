//! The monitoring core: a cancellable periodic loop that pulls a
//! [`metrics::Sample`] from a [`metrics::MetricsSource`] and fans it out to
//! every registered [`plugin::Plugin`] with per-plugin failure isolation.

pub mod dispatcher;
pub mod error;
pub mod events;
pub mod monitor_loop;
pub mod shutdown;

pub use dispatcher::Dispatcher;
pub use error::MonitorError;
pub use events::{EventSink, EventSinkRef, PluginId, TickNumber, TracingSink};
pub use monitor_loop::MonitorLoop;
pub use tokio_util::sync::CancellationToken;
