use crate::error::FlushError;
use crate::fields::FieldSet;
use crate::translate::ReportLevel;

/// Process-wide client of the error-reporting service.
///
/// The reporting core calls [`report`](ReportBackend::report) on the logging
/// thread and never looks at the outcome: implementations either deliver
/// inline or queue the report and deliver it later. Endpoint, credentials
/// and environment are configured on the implementation, not here.
pub trait ReportBackend: Send + Sync {
    /// Hand one report to the backend. Must not panic or block for long.
    fn report(&self, level: ReportLevel, message: &str, fields: FieldSet);

    /// Block until every report handed over so far has been delivered.
    ///
    /// **Returns**
    /// - `Ok(())` once the backend confirmed the drain.
    /// - `Err(..)` if the backend could not confirm it.
    fn wait(&self) -> Result<(), FlushError>;

    fn debug(&self, message: &str, fields: FieldSet) {
        self.report(ReportLevel::Debug, message, fields);
    }

    fn info(&self, message: &str, fields: FieldSet) {
        self.report(ReportLevel::Info, message, fields);
    }

    fn warning(&self, message: &str, fields: FieldSet) {
        self.report(ReportLevel::Warning, message, fields);
    }

    fn error(&self, message: &str, fields: FieldSet) {
        self.report(ReportLevel::Error, message, fields);
    }

    fn critical(&self, message: &str, fields: FieldSet) {
        self.report(ReportLevel::Critical, message, fields);
    }
}
