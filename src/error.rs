use std::error::Error;

/// Boxed error returned by [`ReportSink`](crate::sink::ReportSink)
/// implementations.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Error returned when a backend cannot confirm that pending reports were
/// drained.
///
/// This is the only error the reporting core propagates; everything on the
/// write path degrades silently.
#[derive(thiserror::Error, Debug)]
pub enum FlushError {
    #[error("report worker is no longer running")]
    Closed,

    #[error("report sink failed to drain: {0}")]
    Sink(#[source] BoxError),
}

/// Error returned when parsing a severity, merge policy or level mapping
/// from a configuration string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseError {
    kind: &'static str,
    value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        ParseError {
            kind,
            value: value.to_string(),
        }
    }
}
