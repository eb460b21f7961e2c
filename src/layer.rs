use crate::core::ReportCore;
use crate::fields::{FieldSet, FieldVisitor};
use crate::level::Severity;
use crate::record::{Caller, LogEntry};
use chrono::Utc;
use std::sync::Arc;
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Event field that raises an event's severity, e.g.
/// `error!(severity = "fatal", "disk gone")`.
///
/// The value must parse as a [`Severity`]; it is removed from the payload.
/// An override never lowers the level of the macro that emitted the event.
pub const SEVERITY_FIELD: &str = "severity";

/// `tracing_subscriber` layer that turns events into [`LogEntry`]s and
/// feeds them through a shared [`ReportCore`].
///
/// Events below the core's minimum level are discarded before any field is
/// recorded. Fields of the spans enclosing an event are merged into the
/// entry, root first, and the event's own fields win over them.
#[derive(Clone)]
pub struct ReportLayer {
    core: Arc<ReportCore>,
}

impl ReportLayer {
    pub fn new(core: Arc<ReportCore>) -> Self {
        Self { core }
    }

    pub fn core(&self) -> &Arc<ReportCore> {
        &self.core
    }
}

struct SpanFields(FieldSet);

impl<S> Layer<S> for ReportLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = FieldSet::new();
        attrs.record(&mut FieldVisitor::new(&mut fields));
        span.extensions_mut().insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        if let Some(SpanFields(fields)) = extensions.get_mut::<SpanFields>() {
            values.record(&mut FieldVisitor::new(fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = Severity::from(*meta.level());
        if !self.core.enabled(level) {
            return;
        }

        let mut fields = FieldSet::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(SpanFields(span_fields)) = extensions.get::<SpanFields>() {
                    fields.extend(span_fields.clone());
                }
            }
        }

        let mut message = None;
        event.record(&mut FieldVisitor::with_message(&mut fields, &mut message));

        let severity = take_severity_override(&mut fields).map_or(level, |o| o.max(level));
        let entry = LogEntry {
            timestamp: Utc::now(),
            severity,
            message: message.unwrap_or_default(),
            logger: meta.target().to_string(),
            caller: meta.file().map(|file| Caller::new(file, meta.line())),
            fields,
        };

        if self.core.check(&entry).is_admitted() {
            self.core.write(&entry);
        }
    }
}

fn take_severity_override(fields: &mut FieldSet) -> Option<Severity> {
    let severity = fields.get(SEVERITY_FIELD)?.as_str()?.parse::<Severity>().ok()?;
    fields.remove(SEVERITY_FIELD);
    Some(severity)
}
