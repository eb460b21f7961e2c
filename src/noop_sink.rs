use crate::error::BoxError;
use crate::record::Report;
use crate::sink::ReportSink;
use async_trait::async_trait;

/// A sink that simply drops all reports.
///
/// Useful for measuring the overhead of the layer and client without any
/// external I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl ReportSink for NoopSink {
    async fn send(&self, _report: &Report) -> Result<(), BoxError> {
        Ok(())
    }
}
