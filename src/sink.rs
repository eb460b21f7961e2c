use crate::error::BoxError;
use crate::record::Report;
use async_trait::async_trait;

/// Asynchronous destination for [`Report`]s queued by a
/// [`ReportClient`](crate::client::ReportClient).
///
/// Implementations transport reports to a concrete service (an HTTP
/// ingestion endpoint, stdout, a test buffer). The client calls `send` from
/// its background task and never awaits it on the application thread.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Send a single report to the underlying service.
    ///
    /// **Returns**
    /// - `Ok(())` if the report was accepted.
    /// - `Err(..)` if delivery failed. The client treats this as transient
    ///   and retries the remaining batch with backoff.
    async fn send(&self, report: &Report) -> Result<(), BoxError>;

    /// Flush any reports buffered inside the sink itself.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), BoxError> {
        Ok(())
    }
}
