use crate::Plugin;
use core::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

/// A reference-counted reference to a [`PluginRegistry`].
///
/// Once shared, the registry is read-only: there is no way to add or remove
/// plugins through the `Arc`.
pub type PluginRegistryRef = Arc<PluginRegistry>;

/// Ordered collection of plugins, populated at startup.
///
/// Plugins are invoked in the order they were registered.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    pub fn register<P: Plugin + 'static>(&mut self, plugin: P) {
        self.register_boxed(Box::new(plugin));
    }

    pub fn register_boxed(&mut self, plugin: Box<dyn Plugin>) {
        let start = Instant::now();
        let name = plugin.name();
        self.plugins.push(plugin);
        trace!(
            "Registered plugin {} at position {} in {:?}",
            name,
            self.plugins.len() - 1,
            start.elapsed()
        );
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins.iter().map(|plugin| plugin.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.iter().map(|plugin| plugin.name()).collect()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}
