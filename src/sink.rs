use crate::config::SinkConfig;
use crate::error::{ConfigError, DeliveryError};
use crate::format::format_message;
use crate::record::LogRecord;
use crate::transport::TelegramTransport;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Asynchronous destination for [`LogRecord`]s produced by the logging layer.
///
/// The layer calls `send` from a background task and never awaits it on
/// the application thread. Errors are reported back to the layer, which
/// counts and logs them; they never reach the code that emitted the event.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Deliver a single record. Implementations make at most one attempt.
    async fn send(&self, record: &LogRecord) -> Result<(), DeliveryError>;
}

/// [`LogSink`] posting each record as a text message to a Telegram chat.
#[derive(Clone)]
pub struct TelegramSink {
    config: SinkConfig,
    transport: TelegramTransport,
}

impl TelegramSink {
    /// Construct a sink and its HTTP client.
    ///
    /// **Errors**
    /// - [`ConfigError::Client`] if the client cannot be built from the
    ///   transport overrides (bad proxy URL, TLS backend failure).
    pub fn new(config: SinkConfig) -> Result<Self, ConfigError> {
        let transport = TelegramTransport::new(&config)?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Render `record` as it would be sent, stamped with `now`.
    pub fn format(&self, record: &LogRecord, now: DateTime<Utc>) -> String {
        format_message(record, &self.config, now)
    }

    /// Format `record` with its own timestamp and send it.
    pub async fn write(&self, record: &LogRecord) -> Result<(), DeliveryError> {
        let text = self.format(record, record.datetime);
        self.transport.deliver(&text).await
    }

    /// Send already formatted text.
    pub async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        self.transport.deliver(text).await
    }
}

#[async_trait]
impl LogSink for TelegramSink {
    async fn send(&self, record: &LogRecord) -> Result<(), DeliveryError> {
        self.write(record).await
    }
}
