use crate::error::BoxError;
use crate::record::Report;
use crate::sink::ReportSink;
use async_trait::async_trait;
use std::io::Write;

/// Prints each report to stdout as one JSON line.
///
/// Handy for local development where no reporting service is configured.
#[derive(Clone, Default)]
pub struct ConsoleSink;

#[async_trait]
impl ReportSink for ConsoleSink {
    async fn send(&self, report: &Report) -> Result<(), BoxError> {
        let line = serde_json::to_string(report)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), BoxError> {
        std::io::stdout().lock().flush()?;
        Ok(())
    }
}
