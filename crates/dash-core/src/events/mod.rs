use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// Dashboard-wide event bus
///
/// Handlers run synchronously inside [`EventBus::publish`]. A handler must
/// not publish on the same bus.
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Events emitted by the dashboard
pub mod events {
    use super::Event;

    /// Two or more charts entered a synced comparison
    #[derive(Debug, Clone)]
    pub struct ComparisonStarted {
        pub charts: Vec<usize>,
    }

    /// The comparison view closed and local state resumed
    #[derive(Debug, Clone)]
    pub struct ComparisonClosed {
        pub charts: Vec<usize>,
    }

    /// The filter rule set changed
    #[derive(Debug, Clone)]
    pub struct FiltersChanged {
        pub rule_count: usize,
        pub matched_rows: usize,
    }

    /// A cleaning run finished and was handed to re-analysis
    #[derive(Debug, Clone)]
    pub struct DatasetCleaned {
        pub rows_before: usize,
        pub rows_after: usize,
    }

    /// An export could not be produced
    #[derive(Debug, Clone)]
    pub struct ExportFailed {
        pub target: String,
        pub error: String,
    }

    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        ComparisonStarted,
        ComparisonClosed,
        FiltersChanged,
        DatasetCleaned,
        ExportFailed
    );
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of type `E`
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_default().push(handler);
    }

    /// Subscribe a typed closure to events of type `E`
    pub fn on<E, F>(&self, mut f: F)
    where
        E: Event,
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.subscribe::<E>(handler_from_fn(move |event: &dyn Event| {
            if let Some(event) = event.as_any().downcast_ref::<E>() {
                f(event);
            }
        }));
    }

    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();

        if let Some(event_handlers) = handlers.get_mut(&type_id) {
            for handler in event_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapter turning a closure into an [`EventHandler`]
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

#[cfg(test)]
mod tests {
    use super::events::{ComparisonStarted, ExportFailed};
    use super::*;

    #[test]
    fn test_typed_subscription() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.on::<ComparisonStarted, _>(move |e| sink.lock().push(e.charts.clone()));

        bus.publish(ComparisonStarted { charts: vec![0, 2] });
        bus.publish(ExportFailed {
            target: "chart".into(),
            error: "detached".into(),
        });

        assert_eq!(*seen.lock(), vec![vec![0, 2]]);
    }
}
