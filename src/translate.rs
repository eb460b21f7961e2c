use crate::error::ParseError;
use crate::level::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity vocabulary of the reporting backend.
///
/// The backend has no separate fatal tier; every panic-family severity
/// collapses to `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl ReportLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportLevel::Debug => "debug",
            ReportLevel::Info => "info",
            ReportLevel::Warning => "warning",
            ReportLevel::Error => "error",
            ReportLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which severities are forwarded and under which backend level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelMapping {
    /// Debug through Fatal; panic-family severities become `Critical`.
    #[default]
    Full,
    /// Only Warn, Error and DPanic are forwarded.
    Narrow,
}

impl LevelMapping {
    /// Backend level for `severity`, or `None` if the entry is dropped.
    pub fn translate(self, severity: Severity) -> Option<ReportLevel> {
        match (self, severity) {
            (LevelMapping::Full, Severity::Debug) => Some(ReportLevel::Debug),
            (LevelMapping::Full, Severity::Info) => Some(ReportLevel::Info),
            (_, Severity::Warn) => Some(ReportLevel::Warning),
            (_, Severity::Error) => Some(ReportLevel::Error),
            (_, Severity::DPanic) => Some(ReportLevel::Critical),
            (LevelMapping::Full, Severity::Panic | Severity::Fatal) => Some(ReportLevel::Critical),
            _ => None,
        }
    }
}

impl FromStr for LevelMapping {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(LevelMapping::Full),
            "narrow" => Ok(LevelMapping::Narrow),
            _ => Err(ParseError::new("level mapping", s)),
        }
    }
}
