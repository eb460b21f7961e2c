use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use tracing::error;
use tracing_report_sink::client::{ClientConfig, ReportClient};
use tracing_report_sink::init::{init_tracing_with_config, LayerConfig};
use tracing_report_sink::noop_sink::NoopSink;
use tokio::time::Duration;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let client_config = ClientConfig {
        channel_buffer: 50_000,
        batch_size: 1_000,
        flush_interval: Duration::from_millis(200),
        max_retries: 0,
    };
    let (client, _worker) = ReportClient::new(Arc::new(NoopSink), client_config);
    let client = Arc::new(client);

    let layer_config = LayerConfig {
        enable_stdout: false,
        ..LayerConfig::default()
    };
    let core = init_tracing_with_config(client.clone(), layer_config).expect("set global subscriber");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "load test error");
    }

    let elapsed = start.elapsed();
    println!(
        "sent {} events in {:?} (~{:.0} ev/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    tokio::task::spawn_blocking(move || core.sync())
        .await
        .expect("join sync task")
        .expect("drain reports");
    println!(
        "delivered {}, dropped {}",
        client.delivered_reports.load(Ordering::Relaxed),
        client.dropped_reports.load(Ordering::Relaxed)
    );
}
