//! Plugins consume one [`Sample`] per tick. Each plugin is its own failure
//! domain: an error returned from [`Plugin::process`] is reported by the caller
//! and never affects the other plugins.

use async_trait::async_trait;
use metrics::Sample;
use thiserror::Error;

pub mod api;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod registry;

pub use api::ApiReporterPlugin;
pub use registry::{PluginRegistry, PluginRegistryRef};

#[derive(Debug, Error)]
pub enum PluginError {
    #[error(transparent)]
    Config(#[from] common::ConfigError),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// The `Plugin` trait is the interface every sample consumer implements.
///
/// Plugins are called sequentially, in registration order, once per tick, and
/// always with a freshly collected sample. A plugin may keep state between
/// calls but must not assume it does. Retries and timeouts are the plugin's own
/// business: the caller neither retries a failed call nor bounds its duration,
/// so a plugin that never returns stalls every tick after it.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Returns the name of the plugin, used to tag its failures in reports.
    fn name(&self) -> String;

    /// Consume one sample.
    ///
    /// # Errors
    ///
    /// Any error is reported together with the plugin's name and then
    /// discarded; it does not stop other plugins or the next tick.
    async fn process(&self, sample: &Sample) -> anyhow::Result<()>;
}
