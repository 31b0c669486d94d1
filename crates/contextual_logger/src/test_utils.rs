//! A [`tracing_subscriber::Layer`] that captures emitted events, and an in-memory writer, for
//! asserting on what a [`TracingLogger`] actually emits.

use std::{
    io,
    sync::{Arc, Mutex},
};

use serde_json::{Map, Value};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::MakeWriter,
    layer::{Context, SubscriberExt},
    Layer,
};

use crate::{
    formatter::{keys, EventStorage},
    TracingLogger,
};

/// An event observed by [`CaptureLayer`].
#[derive(Clone, Debug)]
pub(crate) struct CapturedEvent {
    pub(crate) level: Level,
    pub(crate) target: String,
    pub(crate) message: Option<String>,
    values: Map<String, Value>,
}

impl CapturedEvent {
    /// The context fields attached to the event, parsed back from their JSON rendering.
    pub(crate) fn fields(&self) -> Option<&Value> {
        self.value(keys::FIELDS)
    }

    /// The value of any other event field.
    pub(crate) fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// A layer recording every event it sees, in order.
#[derive(Clone, Debug, Default)]
pub(crate) struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureLayer {
    /// A snapshot of the events captured so far.
    pub(crate) fn events(&self) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .expect("capture lock poisoned")
            .clone()
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let (message, values) = EventStorage::from_event(event).into_parts();

        self.events
            .lock()
            .expect("capture lock poisoned")
            .push(CapturedEvent {
                level: *event.metadata().level(),
                target: event.metadata().target().to_string(),
                message,
                values,
            });
    }
}

/// Creates a logger whose dispatcher only feeds a fresh [`CaptureLayer`].
pub(crate) fn capturing_logger() -> (TracingLogger, CaptureLayer) {
    let layer = CaptureLayer::default();
    let logger = TracingLogger::from_subscriber(tracing_subscriber::registry().with(layer.clone()));
    (logger, layer)
}

/// A [`MakeWriter`] collecting everything written into a shared buffer.
#[derive(Clone, Debug, Default)]
pub(crate) struct BufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl BufferWriter {
    /// The lines written so far.
    pub(crate) fn lines(&self) -> Vec<String> {
        let buffer = self.buffer.lock().expect("buffer lock poisoned");
        String::from_utf8_lossy(&buffer)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("buffer lock poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
