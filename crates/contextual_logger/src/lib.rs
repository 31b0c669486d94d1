//! `contextual_logger` exposes the [`tracing`] ecosystem through a small, stable contextual logger
//! capability, so that calling code can log messages enriched with key-value context without
//! depending on the API surface of the underlying logging library.
//!
//! It offers:
//! - The [`Logger`] trait for leveled emission, and the [`Contextual`] trait for binding context
//!   fields in a chain.
//! - [`TracingLogger`], an adapter wrapping a [`tracing::Dispatch`], created from an existing
//!   dispatcher, from library defaults or from a [`LoggerConfig`].
//! - [`LoggerEntry`], the logger returned by field binding, which carries the accumulated
//!   [`Fields`] into every message it emits.
//!
//! Events are emitted with the target `contextual_logger`. The location of the log call in the
//! calling code travels with every event as the `caller.file` and `caller.line` fields. The
//! [`JsonFormattingLayer`] used for [`LogFormat::CompactJson`] reports it as `file` and `line`,
//! and writes bound fields as JSON values.
//!
//! # Example
//!
//! ```
//! use contextual_logger::{Contextual, FieldArg, Logger, TracingLogger, field_args};
//!
//! let logger = TracingLogger::with_defaults();
//! logger.info("Service starting");
//!
//! logger
//!     .with_field("request_id", "5f0c9a")
//!     .with_fields(field_args!["attempt", 2, "cached", false])
//!     .warn("Upstream responded slowly");
//!
//! // Re-binding on an entry mutates it in place.
//! let mut entry = logger.with_field("tenant", "acme");
//! (&mut entry).with_fields(field_args![FieldArg::display('x'), 1]);
//! assert_eq!(entry.fields().len(), 2);
//! entry.error("Payment declined");
//! ```

mod adapter;
mod config;
mod entry;
mod fields;
mod formatter;
#[cfg(test)]
mod test_utils;

use std::fmt;

pub use tracing::Level;

pub use self::{
    adapter::TracingLogger,
    config::{build_dispatch, LogFormat, LoggerConfig, LoggerError, OutputTarget},
    entry::LoggerEntry,
    fields::{FieldArg, FieldKey, Fields},
    formatter::{AdditionalFieldsPlacement, JsonFormattingLayer},
};

/// Leveled log emission.
///
/// The convenience methods all forward to [`Logger::log()`]. All methods are
/// `#[track_caller]`, so emitted events point at the code making the call.
pub trait Logger {
    /// Emits `message` at `level`.
    #[track_caller]
    fn log(&self, level: Level, message: fmt::Arguments<'_>);

    /// Emits `message` at [`Level::TRACE`].
    #[track_caller]
    fn trace(&self, message: &str) {
        self.log(Level::TRACE, format_args!("{message}"));
    }

    /// Emits `message` at [`Level::DEBUG`].
    #[track_caller]
    fn debug(&self, message: &str) {
        self.log(Level::DEBUG, format_args!("{message}"));
    }

    /// Emits `message` at [`Level::INFO`].
    #[track_caller]
    fn info(&self, message: &str) {
        self.log(Level::INFO, format_args!("{message}"));
    }

    /// Emits `message` at [`Level::WARN`].
    #[track_caller]
    fn warn(&self, message: &str) {
        self.log(Level::WARN, format_args!("{message}"));
    }

    /// Emits `message` at [`Level::ERROR`].
    #[track_caller]
    fn error(&self, message: &str) {
        self.log(Level::ERROR, format_args!("{message}"));
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    #[track_caller]
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        (**self).log(level, message);
    }
}

impl<L: Logger + ?Sized> Logger for &mut L {
    #[track_caller]
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        (**self).log(level, message);
    }
}

/// A [`Logger`] able to bind context fields, yielding a logger that carries them.
///
/// Binding on an adapter produces a new entry; binding on an entry adds to that same entry.
/// Chaining is associative: every call merges into one mapping, and a later value for a key
/// overwrites an earlier one.
pub trait Contextual: Logger {
    /// The logger carrying bound fields.
    type Entry: Contextual;

    /// Binds a single field. Any text, including the empty string, is a valid name.
    ///
    /// The value accepts everything [`with_fields()`][Contextual::with_fields] accepts in value
    /// position, including renderable values wrapped with [`FieldArg::display()`].
    fn with_field<K, V>(self, key: K, value: V) -> Self::Entry
    where
        K: Into<String>,
        V: Into<FieldArg>;

    /// Binds fields given as a flat sequence of alternating keys and values, as built by
    /// [`field_args!`].
    ///
    /// Pairs whose key is neither text nor renderable are dropped, and a trailing element without
    /// a value is ignored, see [`Fields::from_args()`].
    fn with_fields<I>(self, fields: I) -> Self::Entry
    where
        I: IntoIterator<Item = FieldArg>;
}
