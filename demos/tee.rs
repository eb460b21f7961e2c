use std::error::Error;
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};
use tracing_report_sink::client::{ClientConfig, ReportClient};
use tracing_report_sink::console_sink::ConsoleSink;
use tracing_report_sink::init::init_tracing;

/// Tee every event to stdout and forward warnings and above to a report
/// client. The console sink stands in for a real reporting service.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let (client, _worker) = ReportClient::new(Arc::new(ConsoleSink), ClientConfig::default());
    let core = init_tracing(Arc::new(client))?;

    core.with([("service", json!("checkout")), ("region", json!("eu-west-1"))]);

    // Only printed by the fmt layer.
    info!(foo = "bar", "report layer teed up");

    // Printed and reported as "warning" with `foo`, `service` and `region`.
    warn!(foo = "bar", "warning message with fields");

    // Reported as "critical".
    error!(severity = "fatal", order_id = 1234, "payment backend unreachable");

    // `sync` blocks until the client drained its queue.
    tokio::task::spawn_blocking(move || core.sync()).await??;
    Ok(())
}
