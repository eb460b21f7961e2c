use crate::fields::FieldSet;
use crate::level::Severity;
use crate::translate::ReportLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Source location of the call that produced an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: String,
    pub line: Option<u32>,
}

impl Caller {
    pub fn new(file: impl Into<String>, line: Option<u32>) -> Self {
        Caller {
            file: file.into(),
            line,
        }
    }

    /// The last two path components and the line, e.g. `src/main.rs:42`.
    ///
    /// Returns `None` when no file is known.
    pub fn location(&self) -> Option<String> {
        let file = self.file.trim_end_matches(['/', '\\']);
        if file.is_empty() {
            return None;
        }

        let mut cut = file.rfind(['/', '\\']);
        if let Some(last) = cut {
            cut = file[..last].rfind(['/', '\\']);
        }
        let trimmed = match cut {
            Some(idx) => &file[idx + 1..],
            None => file,
        };

        Some(match self.line {
            Some(line) => format!("{}:{}", trimmed, line),
            None => trimmed.to_string(),
        })
    }
}

/// A single log call as seen by the reporting core.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    /// Logger name; the `tracing` target for bridged events. May be empty.
    pub logger: String,
    pub caller: Option<Caller>,
    pub fields: FieldSet,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        LogEntry {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
            logger: String::new(),
            caller: None,
            fields: FieldSet::new(),
        }
    }

    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = logger.into();
        self
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Translated entry handed to a [`ReportSink`](crate::sink::ReportSink).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub level: ReportLevel,
    pub message: String,
    pub fields: FieldSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_keeps_last_two_components() {
        let caller = Caller::new("/home/dev/project/src/handlers/auth.rs", Some(42));
        assert_eq!(caller.location().as_deref(), Some("handlers/auth.rs:42"));

        let caller = Caller::new("src/main.rs", Some(7));
        assert_eq!(caller.location().as_deref(), Some("src/main.rs:7"));

        let caller = Caller::new("main.rs", None);
        assert_eq!(caller.location().as_deref(), Some("main.rs"));
    }

    #[test]
    fn empty_file_has_no_location() {
        assert_eq!(Caller::new("", Some(1)).location(), None);
    }

    #[test]
    fn report_serializes_flat_fields() {
        let mut fields = FieldSet::new();
        fields.insert("foo".into(), Value::from("bar"));
        let report = Report {
            timestamp: Utc::now(),
            level: ReportLevel::Error,
            message: "boom".into(),
            fields,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["message"], "boom");
        assert_eq!(json["fields"]["foo"], "bar");
    }
}
