use crate::events::{EventSinkRef, PluginId};
use anyhow::anyhow;
use core::fmt;
use futures::FutureExt;
use metrics::Sample;
use plugin::PluginRegistryRef;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::instrument;
use typed_builder::TypedBuilder;

/// Fans one sample out to every registered plugin.
///
/// Plugins run sequentially in registry order. A plugin that returns an error
/// or panics is reported to the event sink under its [`PluginId`], and the
/// remaining plugins still run; nothing escapes [`Dispatcher::notify`].
#[derive(Clone, TypedBuilder)]
pub struct Dispatcher {
    registry: PluginRegistryRef,
    events: EventSinkRef,
}

impl Dispatcher {
    pub fn new(registry: PluginRegistryRef, events: EventSinkRef) -> Self {
        Dispatcher::builder()
            .registry(registry)
            .events(events)
            .build()
    }

    pub fn registry(&self) -> &PluginRegistryRef {
        &self.registry
    }

    /// Invoke every plugin exactly once with `sample`.
    ///
    /// Completing means every plugin was attempted, not that every plugin
    /// succeeded.
    #[instrument(skip_all, fields(plugins = self.registry.len()))]
    pub async fn notify(&self, sample: &Sample) {
        for (index, plugin) in self.registry.iter().enumerate() {
            let id = PluginId::new(index, plugin.name());
            let start = Instant::now();

            match AssertUnwindSafe(plugin.process(sample)).catch_unwind().await {
                Ok(Ok(())) => self.events.plugin_succeeded(&id, start.elapsed()),
                Ok(Err(error)) => self.events.plugin_failed(&id, &error),
                Err(panic) => self.events.plugin_failed(
                    &id,
                    &anyhow!("plugin panicked: {}", panic_message(panic.as_ref())),
                ),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::{Event, RecordingSink};
    use async_trait::async_trait;
    use plugin::fake::{FailingPlugin, RecordingPlugin};
    use plugin::{Plugin, PluginRegistry};
    use pretty_assertions_sorted::assert_eq;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    struct PanickingPlugin;

    #[async_trait]
    impl Plugin for PanickingPlugin {
        fn name(&self) -> String {
            "PanickingPlugin".to_string()
        }

        async fn process(&self, _sample: &Sample) -> anyhow::Result<()> {
            panic!("counter overflow");
        }
    }

    fn sample() -> Sample {
        Sample::builder()
            .cpu_usage_percent(12.5)
            .ram_used_mb(1_024)
            .ram_total_mb(4_096)
            .disk_used_mb(10_000)
            .disk_total_mb(20_000)
            .build()
    }

    fn build_dispatcher(registry: PluginRegistry) -> (Dispatcher, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(Arc::new(registry), sink.clone());
        (dispatcher, sink)
    }

    #[tokio::test]
    async fn failing_plugin_does_not_stop_its_siblings() {
        let first = RecordingPlugin::new("first");
        let second = FailingPlugin::new("second");
        let third = RecordingPlugin::new("third");
        let (first_seen, second_calls, third_seen) =
            (first.recorded(), second.calls(), third.recorded());

        let mut registry = PluginRegistry::new();
        registry.register(first);
        registry.register(second);
        registry.register(third);
        let (dispatcher, sink) = build_dispatcher(registry);

        for call in 1..=3 {
            dispatcher.notify(&sample()).await;

            assert_eq!(first_seen.lock().len(), call);
            assert_eq!(second_calls.load(Ordering::SeqCst), call);
            assert_eq!(third_seen.lock().len(), call);
            assert_eq!(
                sink.plugin_failures(),
                vec![PluginId::new(1, "second"); call]
            );
        }
    }

    #[tokio::test]
    async fn plugins_run_in_registry_order() {
        let mut registry = PluginRegistry::new();
        registry.register(RecordingPlugin::new("a"));
        registry.register(FailingPlugin::new("b"));
        registry.register(RecordingPlugin::new("c"));
        let (dispatcher, sink) = build_dispatcher(registry);

        dispatcher.notify(&sample()).await;

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], Event::PluginSucceeded(PluginId::new(0, "a")));
        assert!(matches!(&events[1], Event::PluginFailed(id, message)
            if *id == PluginId::new(1, "b") && message == "b failed on call 1"));
        assert_eq!(events[2], Event::PluginSucceeded(PluginId::new(2, "c")));
    }

    #[tokio::test]
    async fn same_sample_twice_reaches_each_plugin_twice_unchanged() {
        let first = RecordingPlugin::new("first");
        let second = RecordingPlugin::new("second");
        let (first_seen, second_seen) = (first.recorded(), second.recorded());

        let mut registry = PluginRegistry::new();
        registry.register(first);
        registry.register(second);
        let (dispatcher, _sink) = build_dispatcher(registry);

        let sample = sample();
        let original = sample;
        dispatcher.notify(&sample).await;
        dispatcher.notify(&sample).await;

        assert_eq!(sample, original);
        assert_eq!(*first_seen.lock(), vec![original, original]);
        assert_eq!(*second_seen.lock(), vec![original, original]);
    }

    #[tokio::test]
    async fn panicking_plugin_is_reported_and_isolated() {
        let after = RecordingPlugin::new("after");
        let after_seen = after.recorded();

        let mut registry = PluginRegistry::new();
        registry.register(PanickingPlugin);
        registry.register(after);
        let (dispatcher, sink) = build_dispatcher(registry);

        dispatcher.notify(&sample()).await;

        assert_eq!(after_seen.lock().len(), 1);
        let events = sink.events();
        assert!(matches!(&events[0], Event::PluginFailed(id, message)
            if *id == PluginId::new(0, "PanickingPlugin")
                && message == "plugin panicked: counter overflow"));
    }

    #[tokio::test]
    async fn unavailable_sample_is_dispatched_normally() {
        let recorder = RecordingPlugin::new("recorder");
        let seen = recorder.recorded();

        let mut registry = PluginRegistry::new();
        registry.register(recorder);
        let (dispatcher, sink) = build_dispatcher(registry);

        dispatcher.notify(&Sample::unavailable()).await;

        assert_eq!(*seen.lock(), vec![Sample::unavailable()]);
        assert!(sink.plugin_failures().is_empty());
    }

    #[tokio::test]
    async fn empty_registry_is_a_no_op() {
        let (dispatcher, sink) = build_dispatcher(PluginRegistry::new());

        dispatcher.notify(&sample()).await;

        assert!(sink.events().is_empty());
    }
}
