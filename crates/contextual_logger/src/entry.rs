//! [`LoggerEntry`], a logger carrying accumulated context fields.

use std::{fmt, panic::Location};

use tracing::Level;

use crate::{Contextual, FieldArg, Fields, Logger, TracingLogger};

/// A logger bound to a set of context fields, obtained from
/// [`TracingLogger`]'s [`Contextual`] implementation.
///
/// Every message emitted through the entry carries the accumulated fields. Binding more fields
/// onto an entry mutates it in place and hands the same entry back:
///
/// - on an owned entry, the entry is moved through the chain;
/// - on `&mut LoggerEntry`, the same mutable reference is returned.
///
/// In neither case is a new entry created. Clone the entry to branch off an independent copy.
#[derive(Clone, Debug)]
pub struct LoggerEntry<'a> {
    logger: &'a TracingLogger,
    fields: Fields,
}

impl<'a> LoggerEntry<'a> {
    pub(crate) fn new(logger: &'a TracingLogger, fields: Fields) -> Self {
        Self { logger, fields }
    }

    /// The fields accumulated so far.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// The adapter this entry was derived from.
    pub fn logger(&self) -> &'a TracingLogger {
        self.logger
    }
}

impl Logger for LoggerEntry<'_> {
    #[track_caller]
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        let fields = (!self.fields.is_empty()).then_some(&self.fields);
        self.logger.emit(level, fields, Location::caller(), message);
    }
}

impl Contextual for LoggerEntry<'_> {
    type Entry = Self;

    fn with_field<K, V>(mut self, key: K, value: V) -> Self::Entry
    where
        K: Into<String>,
        V: Into<FieldArg>,
    {
        self.fields.insert(key, value.into().into_value());
        self
    }

    fn with_fields<I>(mut self, fields: I) -> Self::Entry
    where
        I: IntoIterator<Item = FieldArg>,
    {
        self.fields.extend_from_args(fields);
        self
    }
}

impl<'a, 'e> Contextual for &'e mut LoggerEntry<'a> {
    type Entry = Self;

    fn with_field<K, V>(self, key: K, value: V) -> Self::Entry
    where
        K: Into<String>,
        V: Into<FieldArg>,
    {
        self.fields.insert(key, value.into().into_value());
        self
    }

    fn with_fields<I>(self, fields: I) -> Self::Entry
    where
        I: IntoIterator<Item = FieldArg>,
    {
        self.fields.extend_from_args(fields);
        self
    }
}
