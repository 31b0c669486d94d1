//! The [`TracingLogger`] adapter, exposing a [`tracing`] dispatcher through the [`Logger`] and
//! [`Contextual`] capabilities.

use std::{fmt, panic::Location};

use tracing::{dispatcher, Dispatch, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;

use crate::{
    config::{self, LoggerConfig, LoggerError},
    Contextual, FieldArg, Fields, Logger, LoggerEntry,
};

/// Message emitted once by every constructor, through the wrapped dispatcher.
pub(crate) const BACKEND_ANNOUNCEMENT: &str = "Now using tracing logger (via contextual_logger).";

/// Target of every event emitted through a [`TracingLogger`].
pub(crate) const TARGET: &str = "contextual_logger";

/// Emits an event at a level only known at runtime.
///
/// `tracing::event!` requires a constant level, so this expands to one callsite per level.
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::event!(target: TARGET, Level::ERROR, $($arg)+);
        } else if level == Level::WARN {
            tracing::event!(target: TARGET, Level::WARN, $($arg)+);
        } else if level == Level::INFO {
            tracing::event!(target: TARGET, Level::INFO, $($arg)+);
        } else if level == Level::DEBUG {
            tracing::event!(target: TARGET, Level::DEBUG, $($arg)+);
        } else {
            tracing::event!(target: TARGET, Level::TRACE, $($arg)+);
        }
    }};
}

/// A contextual logger wrapping a [`tracing`] [`Dispatch`].
///
/// The adapter holds exactly one dispatcher for its whole lifetime. Log calls made on the adapter,
/// or on any [`LoggerEntry`] derived from it, are emitted through that dispatcher regardless of
/// which dispatcher is the thread or global default at the time of the call.
///
/// Field binding is available on `&TracingLogger` through the [`Contextual`] trait: each
/// `with_field()`/`with_fields()` call returns a fresh [`LoggerEntry`] and leaves the adapter
/// untouched.
///
/// All events are emitted with the target `contextual_logger`; the location of the log call in
/// the calling code is attached as the `caller.file` and `caller.line` event fields.
#[derive(Debug)]
pub struct TracingLogger {
    dispatch: Dispatch,
}

impl TracingLogger {
    /// Wraps an existing, already configured dispatcher.
    ///
    /// Any configuration of the dispatcher must be done by the caller before wrapping it.
    pub fn new(dispatch: Dispatch) -> Self {
        let logger = Self { dispatch };
        logger.info(BACKEND_ANNOUNCEMENT);
        logger
    }

    /// Wraps a subscriber, see [`TracingLogger::new()`].
    pub fn from_subscriber<S>(subscriber: S) -> Self
    where
        S: Subscriber + Send + Sync + 'static,
    {
        Self::new(Dispatch::new(subscriber))
    }

    /// Creates a logger backed by a fresh [`tracing_subscriber::fmt`] subscriber with its
    /// built-in defaults: human-readable lines at `INFO` and above, written to standard error.
    pub fn with_defaults() -> Self {
        Self::with_default_writer(std::io::stderr)
    }

    /// Creates a logger backed by a default [`tracing_subscriber::fmt`] subscriber writing to
    /// `make_writer`.
    pub(crate) fn with_default_writer<W>(make_writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt().with_writer(make_writer).finish();
        Self::from_subscriber(subscriber)
    }

    /// Wraps the dispatcher currently in effect: the thread's scoped default if one is set,
    /// the global default otherwise.
    pub fn from_current() -> Self {
        Self::new(dispatcher::get_default(Dispatch::clone))
    }

    /// Creates a logger backed by a subscriber built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError`] if the configuration is invalid, see
    /// [`build_dispatch()`][crate::build_dispatch].
    pub fn from_config(config: LoggerConfig) -> Result<Self, LoggerError> {
        config::build_dispatch(config).map(Self::new)
    }

    /// The wrapped dispatcher.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Emits `message` at `level` through the wrapped dispatcher, attaching the caller's
    /// location, and `fields` as a single `fields` event field when present.
    pub(crate) fn emit(
        &self,
        level: Level,
        fields: Option<&Fields>,
        location: &'static Location<'static>,
        message: fmt::Arguments<'_>,
    ) {
        let file = location.file();
        let line = location.line();
        dispatcher::with_default(&self.dispatch, || match fields {
            Some(fields) => event_at!(
                level,
                caller.file = file,
                caller.line = line,
                fields = %fields,
                "{}",
                message
            ),
            None => event_at!(level, caller.file = file, caller.line = line, "{}", message),
        });
    }
}

impl Logger for TracingLogger {
    #[track_caller]
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        self.emit(level, None, Location::caller(), message);
    }
}

impl<'a> Contextual for &'a TracingLogger {
    type Entry = LoggerEntry<'a>;

    fn with_field<K, V>(self, key: K, value: V) -> Self::Entry
    where
        K: Into<String>,
        V: Into<FieldArg>,
    {
        let mut fields = Fields::new();
        fields.insert(key, value.into().into_value());
        LoggerEntry::new(self, fields)
    }

    fn with_fields<I>(self, fields: I) -> Self::Entry
    where
        I: IntoIterator<Item = FieldArg>,
    {
        LoggerEntry::new(self, Fields::from_args(fields))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::{
        field_args,
        formatter::keys,
        test_utils::{capturing_logger, BufferWriter},
    };

    fn assert_contextual<C: Contextual>(_: C) {}

    #[test]
    fn wrapping_a_dispatcher_announces_backend_once() {
        let (logger, capture) = capturing_logger();
        assert_contextual(&logger);

        let events = capture.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::INFO);
        assert_eq!(events[0].message.as_deref(), Some(BACKEND_ANNOUNCEMENT));
        assert!(events[0].fields().is_none());
    }

    #[test]
    fn default_logger_satisfies_capability() {
        let logger = TracingLogger::with_defaults();
        assert_contextual(&logger);

        let entry = logger.with_field("a", 1);
        assert_eq!(Value::from(entry.fields().clone()), json!({ "a": 1 }));
    }

    #[test]
    fn default_logger_announces_backend_once_at_info() {
        let buffer = BufferWriter::default();
        let logger = TracingLogger::with_default_writer(buffer.clone());

        let lines = buffer.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains(BACKEND_ANNOUNCEMENT));

        // Default max level is INFO.
        logger.debug("hidden");
        assert_eq!(buffer.lines().len(), 1);
    }

    #[test]
    fn events_carry_crate_target_and_caller_location() {
        let (logger, capture) = capturing_logger();

        logger.info("plain");
        let plain_line = line!() - 1;
        logger.with_field("k", 1).error("bound");
        let bound_line = line!() - 1;

        let events = capture.events();
        assert_eq!(events.len(), 3);
        for (event, line) in events[1..].iter().zip([plain_line, bound_line]) {
            assert_eq!(event.target, TARGET);
            assert_eq!(event.value(keys::CALLER_FILE), Some(&json!(file!())));
            assert_eq!(event.value(keys::CALLER_LINE), Some(&json!(line)));
        }
    }

    #[test]
    fn with_field_accepts_renderable_values() {
        let (logger, _capture) = capturing_logger();

        let entry = logger.with_field("addr", FieldArg::display(std::net::Ipv4Addr::LOCALHOST));
        assert_eq!(
            Value::from(entry.fields().clone()),
            json!({ "addr": "127.0.0.1" })
        );
    }

    #[test]
    fn current_dispatcher_is_wrapped() {
        let (inner, capture) = capturing_logger();
        let logger = dispatcher::with_default(inner.dispatch(), TracingLogger::from_current);

        logger.warn("through the scoped default");

        let events = capture.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].message.as_deref(), Some(BACKEND_ANNOUNCEMENT));
        assert_eq!(events[2].level, Level::WARN);
    }

    #[test]
    fn configured_logger_rejects_invalid_directive() {
        let config = LoggerConfig {
            filtering_directive: Some("my_crate=verbose".to_string()),
            ..LoggerConfig::default()
        };
        assert!(TracingLogger::from_config(config).is_err());
    }

    #[test]
    fn with_field_binds_exactly_one_field() {
        let (logger, _capture) = capturing_logger();

        let entry = logger.with_field("user", "alice");
        assert_eq!(Value::from(entry.fields().clone()), json!({ "user": "alice" }));

        let entry = logger.with_field("", json!([1, 2]));
        assert_eq!(Value::from(entry.fields().clone()), json!({ "": [1, 2] }));
    }

    #[test]
    fn with_fields_applies_pairing_policy() {
        let (logger, _capture) = capturing_logger();

        let entry = logger.with_fields(field_args!["a", 1, "a", 2]);
        assert_eq!(Value::from(entry.fields().clone()), json!({ "a": 2 }));

        let entry = logger.with_fields(field_args!["a", 1, "b"]);
        assert_eq!(Value::from(entry.fields().clone()), json!({ "a": 1 }));

        let entry = logger.with_fields(field_args![42, "x"]);
        assert!(entry.fields().is_empty());

        let entry = logger.with_fields(field_args![]);
        assert!(entry.fields().is_empty());
    }

    #[test]
    fn binding_leaves_adapter_emission_untouched() {
        let (logger, capture) = capturing_logger();

        let _entry = logger.with_field("request_id", "r-1");
        logger.error("plain");

        let events = capture.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].level, Level::ERROR);
        assert_eq!(events[1].message.as_deref(), Some("plain"));
        assert!(events[1].fields().is_none());
    }

    #[test]
    fn each_level_is_emitted_at_that_level() {
        let (logger, capture) = capturing_logger();

        logger.trace("t");
        logger.debug("d");
        logger.info("i");
        logger.warn("w");
        logger.error("e");
        logger.log(Level::INFO, format_args!("{}-{}", "formatted", 1));

        let levels = capture
            .events()
            .into_iter()
            .skip(1)
            .map(|event| (event.level, event.message.unwrap_or_default()))
            .collect::<Vec<_>>();

        assert_eq!(
            levels,
            vec![
                (Level::TRACE, "t".to_string()),
                (Level::DEBUG, "d".to_string()),
                (Level::INFO, "i".to_string()),
                (Level::WARN, "w".to_string()),
                (Level::ERROR, "e".to_string()),
                (Level::INFO, "formatted-1".to_string()),
            ]
        );
    }
}
