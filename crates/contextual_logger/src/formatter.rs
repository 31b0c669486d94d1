//! Provides a [`tracing_subscriber::Layer`] ([`JsonFormattingLayer`]) writing every event as one
//! JSON object, with the context fields bound on a [`LoggerEntry`][crate::LoggerEntry] emitted
//! as JSON values rather than as an encoded string.

use std::{fmt, io::Write};

use serde_json::{Map, Value};
use time::format_description::well_known::Iso8601;
use tracing::{
    field::{Field, Visit},
    Event, Subscriber,
};
use tracing_subscriber::{fmt::MakeWriter, layer::Context, Layer};

pub(crate) mod keys {
    pub(crate) const MESSAGE: &str = "message";
    pub(crate) const LEVEL: &str = "level";
    pub(crate) const TARGET: &str = "target";
    pub(crate) const TIME: &str = "time";
    pub(crate) const FILE: &str = "file";
    pub(crate) const LINE: &str = "line";

    /// Event field carrying the bound context, rendered as a JSON object.
    pub(crate) const FIELDS: &str = "fields";

    /// Event fields carrying the location of the log call in the calling code.
    pub(crate) const CALLER_FILE: &str = "caller.file";
    pub(crate) const CALLER_LINE: &str = "caller.line";

    pub(crate) const IMPLICIT_KEYS: [&str; 6] = [MESSAGE, LEVEL, TARGET, TIME, FILE, LINE];
}

/// Defines how additional (non-implicit) fields are placed in the JSON log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdditionalFieldsPlacement {
    /// Log all additional fields at the top level of the JSON object. Fields named like one of
    /// the implicit keys (`message`, `level`, `target`, `time`, `file`, `line`) are skipped.
    TopLevel,

    /// Nest all additional fields under the specified key.
    Nested(String),
}

/// Holds the message and key-value data recorded for an event.
#[derive(Clone, Debug, Default)]
pub(crate) struct EventStorage {
    message: Option<String>,
    values: Map<String, Value>,
}

impl EventStorage {
    /// Records all fields of `event`.
    pub(crate) fn from_event(event: &Event<'_>) -> Self {
        let mut storage = Self::default();
        event.record(&mut storage);
        storage
    }

    fn record_value(&mut self, field: &Field, value: Value) {
        self.values.insert(field.name().to_string(), value);
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Map<String, Value>) {
        (self.message, self.values)
    }
}

impl Visit for EventStorage {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == keys::MESSAGE {
            self.message = Some(value.to_string()); // `record_str()` is preferred for `message`
        } else {
            self.record_value(field, Value::from(value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let rendered = format!("{value:?}");
        match field.name() {
            keys::MESSAGE => {
                if self.message.is_none() {
                    self.message = Some(rendered);
                }
            }
            // Bound context is rendered as a JSON object; keep it structured.
            keys::FIELDS => {
                let value = serde_json::from_str(&rendered).unwrap_or(Value::String(rendered));
                self.record_value(field, value);
            }
            name if name.starts_with("log.") => (),
            _ => self.record_value(field, Value::String(rendered)),
        }
    }
}

/// A [`tracing_subscriber::Layer`] that formats events into single-line JSON objects.
///
/// Each object carries the implicit keys `message`, `level`, `target`, `time`, `file` and
/// `line`. `file` and `line` point at the calling code when the event was emitted through a
/// [`Logger`][crate::Logger]. Context fields and any other event fields are placed according to
/// [`AdditionalFieldsPlacement`].
#[derive(Debug)]
pub struct JsonFormattingLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    dst_writer: W,
    additional_fields_placement: AdditionalFieldsPlacement,
}

impl<W> JsonFormattingLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    /// Creates a new [`JsonFormattingLayer`] writing to `dst_writer`.
    pub fn new(additional_fields_placement: AdditionalFieldsPlacement, dst_writer: W) -> Self {
        Self {
            dst_writer,
            additional_fields_placement,
        }
    }

    /// Serializes an event into a JSON object.
    fn event_serialize(&self, event: &Event<'_>) -> Result<Vec<u8>, serde_json::Error> {
        let metadata = event.metadata();
        let (message, mut values) = EventStorage::from_event(event).into_parts();

        let file = values
            .remove(keys::CALLER_FILE)
            .or_else(|| metadata.file().map(Value::from));
        let line = values
            .remove(keys::CALLER_LINE)
            .or_else(|| metadata.line().map(Value::from));

        let mut additional = Map::new();
        match values.remove(keys::FIELDS) {
            Some(Value::Object(bound)) => additional.extend(bound),
            Some(other) => {
                additional.insert(keys::FIELDS.to_string(), other);
            }
            None => (),
        }
        additional.extend(values);

        let mut object = Map::new();
        match &self.additional_fields_placement {
            AdditionalFieldsPlacement::TopLevel => object.extend(
                additional
                    .into_iter()
                    .filter(|(key, _)| !keys::IMPLICIT_KEYS.contains(&key.as_str())),
            ),
            AdditionalFieldsPlacement::Nested(field_name) => {
                if !additional.is_empty() {
                    object.insert(field_name.clone(), Value::Object(additional));
                }
            }
        }

        object.insert(
            keys::MESSAGE.to_string(),
            Value::from(message.as_deref().unwrap_or_else(|| metadata.target())),
        );
        object.insert(
            keys::LEVEL.to_string(),
            Value::from(metadata.level().to_string()),
        );
        object.insert(keys::TARGET.to_string(), Value::from(metadata.target()));
        if let Some(file) = file {
            object.insert(keys::FILE.to_string(), file);
        }
        if let Some(line) = line {
            object.insert(keys::LINE.to_string(), line);
        }
        if let Ok(time) = time::UtcDateTime::now().format(&Iso8601::DEFAULT) {
            object.insert(keys::TIME.to_string(), Value::from(time));
        }

        serde_json::to_vec(&object)
    }

    /// Flush memory buffer into an output stream with a trailing newline.
    ///
    /// Should be done by a single `write_all` call to avoid fragmentation of log because of
    /// multithreading.
    fn flush(&self, mut buffer: Vec<u8>) -> Result<(), std::io::Error> {
        buffer.write_all(b"\n")?;
        self.dst_writer.make_writer().write_all(&buffer)
    }
}

impl<S, W> Layer<S> for JsonFormattingLayer<W>
where
    S: Subscriber,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if let Ok(serialized) = self.event_serialize(event) {
            let _ = self.flush(serialized);
        }
    }
}
