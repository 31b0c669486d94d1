//! Configuration for building the [`Dispatch`] wrapped by a
//! [`TracingLogger`][crate::TracingLogger], for callers who do not bring their own subscriber.

use tracing::{Dispatch, Level};
use tracing_subscriber::{
    fmt::writer::BoxMakeWriter, layer::SubscriberExt, EnvFilter, Layer, Registry,
};

use crate::formatter::{AdditionalFieldsPlacement, JsonFormattingLayer};

/// Configuration for the subscriber built by
/// [`TracingLogger::from_config()`][crate::TracingLogger::from_config].
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Minimum log level, used as the default filtering directive.
    pub level: Level,

    /// Output format of emitted log lines.
    pub log_format: LogFormat,

    /// An [`EnvFilter`] directive (e.g., `"warn,contextual_logger=debug"`) applied on top of
    /// `level`.
    /// Events logged through a [`TracingLogger`][crate::TracingLogger] all have the target
    /// `contextual_logger`, whichever crate makes the call; other `tracing` events sharing the
    /// subscriber keep their own targets.
    pub filtering_directive: Option<String>,

    /// Stream that log lines are written to.
    pub output: OutputTarget,

    /// Placement of context fields in [`LogFormat::CompactJson`] output.
    pub additional_fields_placement: AdditionalFieldsPlacement,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_format: LogFormat::HumanReadable,
            filtering_directive: None,
            output: OutputTarget::Stderr,
            additional_fields_placement: AdditionalFieldsPlacement::TopLevel,
        }
    }
}

/// Defines the output format of emitted log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line, human-readable format.
    HumanReadable,

    /// Pretty-printed, human-readable, multi-line format.
    Pretty,

    /// Compact, single-line JSON format, see [`JsonFormattingLayer`].
    CompactJson,
}

/// Specifies which standard stream log lines are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output.
    Stdout,

    /// Standard error.
    Stderr,
}

/// Errors that can occur while building a logger from a [`LoggerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Represents an error due to an invalid filtering directive.
    #[error("Failed to parse filtering directive: {0}")]
    InvalidFilteringDirective(#[from] tracing_subscriber::filter::ParseError),
}

/// Builds a [`Dispatch`] writing to the configured stream in the configured format.
///
/// # Errors
///
/// Returns [`LoggerError::InvalidFilteringDirective`] if the filtering directive cannot be parsed.
pub fn build_dispatch(config: LoggerConfig) -> Result<Dispatch, LoggerError> {
    let writer = match config.output {
        OutputTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
        OutputTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
    };
    build_dispatch_with_writer(config, writer)
}

/// Builds a [`Dispatch`] as [`build_dispatch()`] does, writing to `writer` instead of
/// `config.output`.
pub(crate) fn build_dispatch_with_writer(
    config: LoggerConfig,
    writer: BoxMakeWriter,
) -> Result<Dispatch, LoggerError> {
    let filtering_directive = config.filtering_directive.as_deref().unwrap_or_default(); // Using an empty string causes it to use the default directive

    let filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .parse(filtering_directive)?;

    let layer: Box<dyn Layer<Registry> + Send + Sync + 'static> = match config.log_format {
        LogFormat::HumanReadable => tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_filter(filter)
            .boxed(),
        LogFormat::CompactJson => {
            JsonFormattingLayer::new(config.additional_fields_placement, writer)
                .with_filter(filter)
                .boxed()
        }
    };

    Ok(Dispatch::new(tracing_subscriber::registry().with(layer)))
}
