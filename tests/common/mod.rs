use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_report_sink::error::FlushError;
use tracing_report_sink::fields::FieldSet;
use tracing_report_sink::translate::ReportLevel;
use tracing_report_sink::ReportBackend;

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub level: ReportLevel,
    pub message: String,
    pub fields: FieldSet,
}

/// Backend that keeps every report in memory.
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    waits: AtomicUsize,
}

impl RecordingBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    #[allow(dead_code)]
    pub fn waits(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }
}

impl ReportBackend for RecordingBackend {
    fn report(&self, level: ReportLevel, message: &str, fields: FieldSet) {
        self.calls.lock().push(Call {
            level,
            message: message.to_string(),
            fields,
        });
    }

    fn wait(&self) -> Result<(), FlushError> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
