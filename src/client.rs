use crate::backend::ReportBackend;
use crate::error::{BoxError, FlushError};
use crate::fields::FieldSet;
use crate::record::Report;
use crate::sink::ReportSink;
use crate::translate::ReportLevel;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Reply channel of a flush request, plus the number of reports the
/// client had enqueued when the request was made.
type FlushRequest = (u64, crossbeam_channel::Sender<Result<(), FlushError>>);

/// Tuning of a [`ReportClient`].
///
/// **Fields**
/// - `channel_buffer`: maximum number of queued reports before new ones
///   are dropped.
/// - `batch_size`: number of reports delivered to the sink in one go.
/// - `flush_interval`: maximum delay before a partial batch is delivered.
/// - `max_retries`: how many times a failed batch is retried with
///   exponential backoff before it is dropped.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            max_retries: 5,
        }
    }
}

/// [`ReportBackend`] that queues reports and delivers them to a
/// [`ReportSink`] from a background Tokio task.
///
/// `report` never blocks: when the queue is full the report is dropped and
/// counted. [`wait`](ReportBackend::wait) blocks the calling thread until
/// the worker delivered everything queued before the call, so it must not
/// run on a current-thread runtime; use a multi-threaded runtime or
/// `spawn_blocking`.
pub struct ReportClient {
    sender: mpsc::Sender<Report>,
    flush_requests: mpsc::UnboundedSender<FlushRequest>,
    /// Reports accepted into the queue.
    pub enqueued_reports: Arc<AtomicU64>,
    /// Dropped because the queue was full.
    pub dropped_reports: Arc<AtomicU64>,
    /// Accepted by the sink.
    pub delivered_reports: Arc<AtomicU64>,
    /// Dropped after exhausting retries.
    pub failed_reports: Arc<AtomicU64>,
}

impl ReportClient {
    /// Create a client and spawn the worker that drains its queue into
    /// `sink`. Must be called from within a Tokio runtime.
    ///
    /// Minimal thresholds are enforced for `channel_buffer`, `batch_size`
    /// and `flush_interval` to avoid degenerate configurations.
    pub fn new(sink: Arc<dyn ReportSink>, config: ClientConfig) -> (Self, JoinHandle<()>) {
        let buffer = config.channel_buffer.max(16);
        let batch_size = config.batch_size.max(1);
        let flush_interval = config.flush_interval.max(Duration::from_millis(10));

        let (tx, rx) = mpsc::channel::<Report>(buffer);
        let (flush_tx, flush_rx) = mpsc::unbounded_channel::<FlushRequest>();

        let client = Self {
            sender: tx,
            flush_requests: flush_tx,
            enqueued_reports: Arc::new(AtomicU64::new(0)),
            dropped_reports: Arc::new(AtomicU64::new(0)),
            delivered_reports: Arc::new(AtomicU64::new(0)),
            failed_reports: Arc::new(AtomicU64::new(0)),
        };

        let worker = Worker {
            sink,
            batch: Vec::with_capacity(batch_size),
            batch_size,
            max_retries: config.max_retries,
            received: 0,
            pending_error: None,
            delivered: Arc::clone(&client.delivered_reports),
            failed: Arc::clone(&client.failed_reports),
        };
        let handle = tokio::spawn(worker.run(rx, flush_rx, flush_interval));

        (client, handle)
    }
}

impl ReportBackend for ReportClient {
    fn report(&self, level: ReportLevel, message: &str, fields: FieldSet) {
        let report = Report {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            fields,
        };

        match self.sender.try_send(report) {
            Ok(()) => {
                self.enqueued_reports.fetch_add(1, Ordering::SeqCst);
            }
            Err(_) => {
                self.dropped_reports.fetch_add(1, Ordering::Relaxed);
                eprintln!("report queue full or closed, dropping report");
            }
        }
    }

    /// Reports whose `report` call returned before this call are part of
    /// the drain, whichever thread made them. Also returns the delivery
    /// error of any batch dropped since the previous `wait`.
    fn wait(&self) -> Result<(), FlushError> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        let enqueued = self.enqueued_reports.load(Ordering::SeqCst);
        self.flush_requests
            .send((enqueued, reply_tx))
            .map_err(|_| FlushError::Closed)?;
        reply_rx.recv().map_err(|_| FlushError::Closed)?
    }
}

struct Worker {
    sink: Arc<dyn ReportSink>,
    batch: Vec<Report>,
    batch_size: usize,
    max_retries: u32,
    /// Reports taken off the queue so far.
    received: u64,
    /// First batch failure since the last flush request.
    pending_error: Option<BoxError>,
    delivered: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl Worker {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<Report>,
        mut flush_rx: mpsc::UnboundedReceiver<FlushRequest>,
        flush_interval: Duration,
    ) {
        let mut ticker = interval(flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe_report = rx.recv() => {
                    let Some(report) = maybe_report else { break };
                    self.push(report);
                    if self.batch.len() >= self.batch_size {
                        self.send_in_background("sending").await;
                    }
                }
                Some((enqueued, reply)) = flush_rx.recv() => {
                    // Everything enqueued before the request belongs to this
                    // drain, even if its slot is still being written.
                    while self.received < enqueued {
                        match rx.recv().await {
                            Some(report) => self.push(report),
                            None => break,
                        }
                    }
                    while let Ok(report) = rx.try_recv() {
                        self.push(report);
                    }
                    let result = match (self.drain().await, self.pending_error.take()) {
                        (Err(e), _) => Err(e),
                        (Ok(()), Some(e)) => Err(FlushError::Sink(e)),
                        (Ok(()), None) => Ok(()),
                    };
                    let _ = reply.send(result);
                }
                _ = ticker.tick() => {
                    if !self.batch.is_empty() {
                        self.send_in_background("flushing").await;
                    }
                }
            }
        }

        if let Err(e) = self.drain().await {
            eprintln!("error draining reports on shutdown: {}", e);
        }
        while let Ok((_, reply)) = flush_rx.try_recv() {
            let _ = reply.send(Err(FlushError::Closed));
        }
    }

    fn push(&mut self, report: Report) {
        self.received += 1;
        self.batch.push(report);
    }

    /// Send the batch outside of a flush request. A failure is kept for the
    /// next request so `wait` reports it.
    async fn send_in_background(&mut self, action: &str) {
        if let Err(e) = self.send_batch().await {
            eprintln!("error {} report batch: {}", action, e);
            self.pending_error.get_or_insert(e);
        }
    }

    async fn drain(&mut self) -> Result<(), FlushError> {
        self.send_batch().await.map_err(FlushError::Sink)?;
        self.sink.flush().await.map_err(FlushError::Sink)
    }

    /// Deliver the pending batch in order, retrying the undelivered tail
    /// with exponential backoff. The batch is empty when this returns.
    async fn send_batch(&mut self) -> Result<(), BoxError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 0;

        loop {
            let mut sent = 0;
            let mut last_err: Option<BoxError> = None;
            for report in self.batch.iter() {
                match self.sink.send(report).await {
                    Ok(()) => sent += 1,
                    Err(e) => {
                        last_err = Some(e);
                        break;
                    }
                }
            }
            self.batch.drain(..sent);
            self.delivered.fetch_add(sent as u64, Ordering::Relaxed);

            let Some(err) = last_err else {
                return Ok(());
            };
            if attempt >= self.max_retries {
                self.failed.fetch_add(self.batch.len() as u64, Ordering::Relaxed);
                self.batch.clear();
                return Err(err);
            }

            attempt += 1;
            eprintln!("report sink send failed, retrying in {:?}", backoff);
            sleep(backoff).await;
            backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct MemorySink {
        reports: Mutex<Vec<Report>>,
        flushes: AtomicUsize,
    }

    #[async_trait]
    impl ReportSink for MemorySink {
        async fn send(&self, report: &Report) -> Result<(), BoxError> {
            self.reports.lock().push(report.clone());
            Ok(())
        }

        async fn flush(&self) -> Result<(), BoxError> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Fails the first `failures` sends, then accepts everything.
    struct FlakySink {
        failures: AtomicUsize,
        inner: MemorySink,
    }

    #[async_trait]
    impl ReportSink for FlakySink {
        async fn send(&self, report: &Report) -> Result<(), BoxError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err("service unavailable".into());
            }
            self.inner.send(report).await
        }
    }

    fn slow_flush_config() -> ClientConfig {
        ClientConfig {
            channel_buffer: 64,
            batch_size: 1000,
            flush_interval: Duration::from_secs(3600),
            max_retries: 0,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn wait_delivers_everything_queued_before_it() {
        let sink = Arc::new(MemorySink::default());
        let (client, _worker) = ReportClient::new(sink.clone(), slow_flush_config());

        client.warning("first", FieldSet::new());
        client.critical("second", FieldSet::new());
        client.wait().unwrap();

        let reports = sink.reports.lock();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].level, ReportLevel::Warning);
        assert_eq!(reports[1].level, ReportLevel::Critical);
        assert_eq!(client.delivered_reports.load(Ordering::Relaxed), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn repeated_wait_does_not_redeliver() {
        let sink = Arc::new(MemorySink::default());
        let (client, _worker) = ReportClient::new(sink.clone(), slow_flush_config());

        client.error("only", FieldSet::new());
        client.wait().unwrap();
        client.wait().unwrap();

        assert_eq!(sink.reports.lock().len(), 1);
        assert_eq!(sink.flushes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn full_batch_is_sent_without_wait() {
        let sink = Arc::new(MemorySink::default());
        let config = ClientConfig {
            batch_size: 2,
            ..slow_flush_config()
        };
        let (client, _worker) = ReportClient::new(sink.clone(), config);

        client.error("a", FieldSet::new());
        client.error("b", FieldSet::new());

        for _ in 0..100 {
            if sink.reports.lock().len() == 2 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sink.reports.lock().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failed_delivery_surfaces_through_wait() {
        let sink = Arc::new(FlakySink {
            failures: AtomicUsize::new(usize::MAX),
            inner: MemorySink::default(),
        });
        let (client, _worker) = ReportClient::new(sink, slow_flush_config());

        client.error("lost", FieldSet::new());
        let err = client.wait().unwrap_err();
        assert!(matches!(err, FlushError::Sink(_)));
        assert_eq!(client.failed_reports.load(Ordering::Relaxed), 1);

        // The failed batch was dropped; the next drain has nothing to send.
        assert!(client.wait().is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn transient_failure_is_retried() {
        let sink = Arc::new(FlakySink {
            failures: AtomicUsize::new(1),
            inner: MemorySink::default(),
        });
        let config = ClientConfig {
            max_retries: 2,
            ..slow_flush_config()
        };
        let (client, _worker) = ReportClient::new(sink.clone(), config);

        client.error("retried", FieldSet::new());
        client.wait().unwrap();

        assert_eq!(sink.inner.reports.lock().len(), 1);
        assert_eq!(client.failed_reports.load(Ordering::Relaxed), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn wait_after_worker_stopped_is_closed() {
        let sink = Arc::new(MemorySink::default());
        let (client, worker) = ReportClient::new(sink, slow_flush_config());

        worker.abort();
        let _ = worker.await;

        assert!(matches!(client.wait(), Err(FlushError::Closed)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failure_of_full_batch_surfaces_through_next_wait() {
        let sink = Arc::new(FlakySink {
            failures: AtomicUsize::new(usize::MAX),
            inner: MemorySink::default(),
        });
        let config = ClientConfig {
            batch_size: 1,
            ..slow_flush_config()
        };
        let (client, _worker) = ReportClient::new(sink, config);

        client.error("dropped before wait", FieldSet::new());
        for _ in 0..100 {
            if client.failed_reports.load(Ordering::Relaxed) == 1 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(client.failed_reports.load(Ordering::Relaxed), 1);

        assert!(matches!(client.wait(), Err(FlushError::Sink(_))));
        // Reported once; the next drain starts clean.
        assert!(client.wait().is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn wait_covers_reports_from_other_threads() {
        let sink = Arc::new(MemorySink::default());
        let config = ClientConfig {
            channel_buffer: 4096,
            ..slow_flush_config()
        };
        let (client, _worker) = ReportClient::new(sink.clone(), config);
        let client = Arc::new(client);

        let producers: Vec<_> = (0..4)
            .map(|t| {
                let client = Arc::clone(&client);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        client.error(&format!("producer {t} report {i}"), FieldSet::new());
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        client.wait().unwrap();
        assert_eq!(sink.reports.lock().len(), 1000);
    }

    #[tokio::test]
    async fn core_sync_from_blocking_task_on_current_thread_runtime() {
        use crate::core::{ReportConfig, ReportCore};
        use crate::level::Severity;
        use crate::record::LogEntry;

        let sink = Arc::new(MemorySink::default());
        let (client, _worker) = ReportClient::new(sink.clone(), slow_flush_config());
        let core = Arc::new(ReportCore::new(Arc::new(client), ReportConfig::default()));

        core.write(&LogEntry::new(Severity::Error, "drained"));
        let sync_core = Arc::clone(&core);
        tokio::task::spawn_blocking(move || sync_core.sync())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sink.reports.lock().len(), 1);
    }
}
