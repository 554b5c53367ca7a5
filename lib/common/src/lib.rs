//! Shared plumbing for the sysmon workspace: configuration loading, tracing
//! initialisation and small time helpers.

pub mod config;
pub mod util;

pub use config::{ConfigError, MonitorConfig};
