use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::Level;

/// Severity of a log entry, ordered from least to most severe.
///
/// The first five variants correspond to [`tracing::Level`]. `DPanic`,
/// `Panic` and `Fatal` have no `tracing` macro of their own; events reach
/// them through the [`SEVERITY_FIELD`](crate::layer::SEVERITY_FIELD) field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    DPanic,
    Panic,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::DPanic => "dpanic",
            Severity::Panic => "panic",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "dpanic" => Ok(Severity::DPanic),
            "panic" => Ok(Severity::Panic),
            "fatal" => Ok(Severity::Fatal),
            _ => Err(ParseError::new("severity", s)),
        }
    }
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        if level == Level::TRACE {
            Severity::Trace
        } else if level == Level::DEBUG {
            Severity::Debug
        } else if level == Level::INFO {
            Severity::Info
        } else if level == Level::WARN {
            Severity::Warn
        } else {
            Severity::Error
        }
    }
}

/// Admits entries whose severity is at or above a fixed minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelGate {
    min_level: Severity,
}

impl LevelGate {
    pub const fn new(min_level: Severity) -> Self {
        LevelGate { min_level }
    }

    pub fn min_level(&self) -> Severity {
        self.min_level
    }

    /// Returns `true` iff `level >= min_level`.
    #[inline]
    pub fn enabled(&self, level: Severity) -> bool {
        level >= self.min_level
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        LevelGate::new(Severity::Warn)
    }
}
