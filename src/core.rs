use crate::backend::ReportBackend;
use crate::error::FlushError;
use crate::fields::{FieldAccumulator, FieldSet};
use crate::level::{LevelGate, Severity};
use crate::merge::{FieldsEncoder, JsonEncoder, MergePolicy, NESTED_FIELDS_KEY};
use crate::record::{Caller, LogEntry};
use crate::translate::LevelMapping;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Payload key carrying the logger name.
pub const LOGGER_KEY: &str = "logger";

/// Payload key carrying the trimmed source location.
pub const FILE_KEY: &str = "file";

/// Configuration of a [`ReportCore`], fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportConfig {
    pub min_level: Severity,
    pub merge_policy: MergePolicy,
    pub level_mapping: LevelMapping,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            min_level: Severity::Warn,
            merge_policy: MergePolicy::Flat,
            level_mapping: LevelMapping::Full,
        }
    }
}

/// Outcome of [`ReportCore::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        self == Admission::Admitted
    }
}

/// Gates, enriches and translates log entries before handing them to a
/// [`ReportBackend`].
///
/// A core lives for the whole process and is usually shared through an
/// `Arc` between the [`ReportLayer`](crate::layer::ReportLayer) and the
/// code that attaches context with [`with`](ReportCore::with) or drains on
/// shutdown with [`sync`](ReportCore::sync).
pub struct ReportCore {
    gate: LevelGate,
    merge_policy: MergePolicy,
    level_mapping: LevelMapping,
    persistent: FieldAccumulator,
    encoder: Box<dyn FieldsEncoder>,
    backend: Arc<dyn ReportBackend>,
    encode_failures: AtomicU64,
}

impl ReportCore {
    pub fn new(backend: Arc<dyn ReportBackend>, config: ReportConfig) -> Self {
        ReportCore {
            gate: LevelGate::new(config.min_level),
            merge_policy: config.merge_policy,
            level_mapping: config.level_mapping,
            persistent: FieldAccumulator::new(),
            encoder: Box::new(JsonEncoder),
            backend,
            encode_failures: AtomicU64::new(0),
        }
    }

    /// Replace the encoder used for the nested persistent block.
    pub fn with_encoder(mut self, encoder: impl FieldsEncoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    pub fn enabled(&self, level: Severity) -> bool {
        self.gate.enabled(level)
    }

    pub fn min_level(&self) -> Severity {
        self.gate.min_level()
    }

    /// Attach persistent context. Every later [`write`](ReportCore::write)
    /// on this core sees the merged fields.
    pub fn with<I, K>(&self, fields: I) -> &Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.persistent.merge(fields);
        self
    }

    pub fn check(&self, entry: &LogEntry) -> Admission {
        if self.gate.enabled(entry.severity) {
            Admission::Admitted
        } else {
            Admission::Rejected
        }
    }

    /// Build the payload for `entry` and forward it to the backend.
    ///
    /// Does not consult the gate; callers are expected to have checked the
    /// entry already. Entries whose severity has no backend level are
    /// dropped without a backend call.
    pub fn write(&self, entry: &LogEntry) {
        let Some(level) = self.level_mapping.translate(entry.severity) else {
            return;
        };
        let payload = self.payload(entry);
        self.backend.report(level, &entry.message, payload);
    }

    /// Block until the backend drained every report written so far.
    ///
    /// This blocks the calling thread. From async code, run it on a blocking
    /// thread so the backend's worker can make progress, which matters on a
    /// current-thread runtime:
    ///
    /// ```ignore
    /// tokio::task::spawn_blocking(move || core.sync()).await??;
    /// ```
    pub fn sync(&self) -> Result<(), FlushError> {
        self.backend.wait()
    }

    /// Fields that would be sent for `entry`, per the configured policy.
    pub fn payload(&self, entry: &LogEntry) -> FieldSet {
        let mut payload = match self.merge_policy {
            MergePolicy::Flat => {
                let mut payload = self.persistent.snapshot();
                payload.extend(entry.fields.clone());
                payload
            }
            MergePolicy::Nested => {
                let mut payload = entry.fields.clone();
                self.attach_nested(&mut payload);
                payload
            }
        };

        if !entry.logger.is_empty() {
            payload.insert(LOGGER_KEY.to_string(), Value::String(entry.logger.clone()));
        }
        if let Some(location) = entry.caller.as_ref().and_then(Caller::location) {
            payload.insert(FILE_KEY.to_string(), Value::String(location));
        }
        payload
    }

    fn attach_nested(&self, payload: &mut FieldSet) {
        let persistent = self.persistent.snapshot();
        if persistent.is_empty() {
            return;
        }
        match self.encoder.encode(&persistent) {
            Ok(encoded) => {
                payload.insert(NESTED_FIELDS_KEY.to_string(), Value::String(encoded));
            }
            Err(e) => {
                self.encode_failures.fetch_add(1, Ordering::Relaxed);
                eprintln!("unable to encode persistent report fields: {}", e);
            }
        }
    }

    pub fn persistent_fields(&self) -> FieldSet {
        self.persistent.snapshot()
    }

    /// Number of times the nested persistent block could not be encoded.
    pub fn encode_failures(&self) -> u64 {
        self.encode_failures.load(Ordering::Relaxed)
    }
}
