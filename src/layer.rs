use crate::emoji::Severity;
use crate::record::LogRecord;
use crate::sink::LogSink;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Target of the crate's own delivery diagnostics.
pub const DELIVERY_TARGET: &str = "telegram_log_sink::delivery";

/// Targets never forwarded to the sink: our own diagnostics and the HTTP
/// stack used to deliver, which would otherwise feed back into the layer.
const IGNORED_TARGETS: &[&str] = &[DELIVERY_TARGET, "reqwest", "hyper", "h2", "rustls"];

/// Matches a listed target or any of its submodules, not mere name prefixes.
fn is_ignored_target(target: &str) -> bool {
    IGNORED_TARGETS.iter().any(|t| {
        target
            .strip_prefix(t)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Event field that overrides the severity derived from the `tracing` level.
pub const SEVERITY_FIELD: &str = "severity";

/// Counters shared between the layer and its delivery task.
#[derive(Debug, Default)]
pub struct SinkStats {
    /// Total events seen by the layer (before filtering by level).
    pub total_events: AtomicU64,
    /// Successfully enqueued into channel.
    pub enqueued_events: AtomicU64,
    /// Dropped because the channel was full.
    pub dropped_events: AtomicU64,
    pub delivered: AtomicU64,
    pub failed: AtomicU64,
}

impl SinkStats {
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }
}

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// forwards them to a [`LogSink`] via a bounded channel and background task.
///
/// By default only `ERROR` events are captured. The emitting thread only
/// pays for building the record and a `try_send`; if the queue is full
/// the record is dropped and counted. Each record gets a single delivery
/// attempt.
pub struct NotificationLayer {
    sender: mpsc::Sender<LogRecord>,
    stats: Arc<SinkStats>,
    min_level: Level,
    channel_name: Option<String>,
    include_location: bool,
}

impl NotificationLayer {
    /// Create a new layer and spawn the task that drains the queue into
    /// `sink`. Must be called from within a Tokio runtime.
    ///
    /// `buffer` is raised to at least 16.
    pub fn new(sink: Arc<dyn LogSink>, buffer: usize) -> (Self, JoinHandle<()>) {
        let buffer = buffer.max(16);
        let (tx, mut rx) = mpsc::channel::<LogRecord>(buffer);
        let stats = Arc::new(SinkStats::default());
        let stats_bg = Arc::clone(&stats);

        let handle = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                match sink.send(&record).await {
                    Ok(()) => {
                        stats_bg.delivered.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(target: DELIVERY_TARGET, channel = %record.channel, "log record delivered");
                    }
                    Err(e) => {
                        stats_bg.failed.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(target: DELIVERY_TARGET, error = %e, "failed to deliver log record");
                    }
                }
            }
        });

        (
            Self {
                sender: tx,
                stats,
                min_level: Level::ERROR,
                channel_name: None,
                include_location: false,
            },
            handle,
        )
    }

    /// Most verbose level still forwarded (default `ERROR`).
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Use a fixed channel name instead of the event target.
    pub fn with_channel_name(mut self, name: impl Into<String>) -> Self {
        self.channel_name = Some(name.into());
        self
    }

    /// Add the event's `file` and `line` to the record's `extra`.
    pub fn with_location(mut self, include: bool) -> Self {
        self.include_location = include;
        self
    }

    pub fn stats(&self) -> Arc<SinkStats> {
        Arc::clone(&self.stats)
    }
}

/// Fields recorded on a span, stored in its extensions.
struct SpanFields(BTreeMap<String, serde_json::Value>);

impl<S> Layer<S> for NotificationLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = BTreeMap::new();
        attrs.record(&mut SpanFieldVisitor(&mut fields));
        span.extensions_mut().insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        if let Some(SpanFields(fields)) = extensions.get_mut::<SpanFields>() {
            values.record(&mut SpanFieldVisitor(fields));
        }
    }

    fn on_event(&self, event: &Event, ctx: Context<'_, S>) {
        self.stats.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if *meta.level() > self.min_level {
            return;
        }
        if is_ignored_target(meta.target()) {
            return;
        }

        let mut context = BTreeMap::new();
        let mut message: Option<String> = None;
        let mut severity: Option<Severity> = None;
        event.record(&mut FieldVisitor {
            fields: &mut context,
            message: &mut message,
            severity: &mut severity,
        });

        // Outer spans first so inner spans win on duplicate keys.
        let mut extra = BTreeMap::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanFields(fields)) = span.extensions().get::<SpanFields>() {
                    extra.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
        }
        if self.include_location {
            if let Some(file) = meta.file() {
                extra.insert("file".to_string(), serde_json::Value::from(file));
            }
            if let Some(line) = meta.line() {
                extra.insert("line".to_string(), serde_json::Value::from(line));
            }
        }

        let severity = severity.unwrap_or_else(|| Severity::from_tracing(meta.level()));
        let record = LogRecord {
            datetime: Utc::now(),
            channel: self
                .channel_name
                .clone()
                .unwrap_or_else(|| meta.target().to_string()),
            level_name: severity.name().to_string(),
            level: severity.code(),
            message: message.unwrap_or_default(),
            context,
            extra,
        };

        match self.sender.try_send(record) {
            Ok(()) => {
                self.stats.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_e) => {
                self.stats.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("telegram log queue full, dropping log record");
            }
        }
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
    pub severity: &'a mut Option<Severity>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => *self.message = Some(value.to_string()),
            SEVERITY_FIELD => match value.parse::<Severity>() {
                Ok(s) => *self.severity = Some(s),
                Err(_) => {
                    self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
                }
            },
            name => {
                self.fields.insert(name.to_string(), serde_json::Value::from(value));
            }
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            *self.message = Some(rendered);
        } else {
            self.record_str(field, &rendered);
        }
    }
}

/// Span fields land in `extra` as they are: `message` and `severity`
/// have no special meaning on spans.
struct SpanFieldVisitor<'a>(&'a mut BTreeMap<String, serde_json::Value>);

impl<'a> SpanFieldVisitor<'a> {
    fn insert(&mut self, field: &Field, value: impl Into<serde_json::Value>) {
        self.0.insert(field.name().to_string(), value.into());
    }
}

impl<'a> Visit for SpanFieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, format!("{:?}", value));
    }
}
