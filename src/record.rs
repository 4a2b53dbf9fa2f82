use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::emoji::Severity;

/// A single log event as seen by the sink.
///
/// `level` holds the raw RFC 5424 severity code rather than a
/// [`Severity`] so that records coming from foreign pipelines with
/// unknown codes can still be formatted (see [`crate::emoji::resolve`]).
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub datetime: DateTime<Utc>,
    /// Logical channel, e.g. the subsystem or `tracing` target.
    pub channel: String,
    pub level_name: String,
    pub level: u8,
    pub message: String,
    pub context: BTreeMap<String, serde_json::Value>,
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Build a record stamped with the current time and empty
    /// `context` / `extra` maps.
    pub fn new(channel: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        LogRecord {
            datetime: Utc::now(),
            channel: channel.into(),
            level_name: severity.name().to_string(),
            level: severity.code(),
            message: message.into(),
            context: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_carries_severity_code_and_name() {
        let record = LogRecord::new("app", Severity::Critical, "db down")
            .with_context("attempt", 3)
            .with_extra("host", "web-1");

        assert_eq!(record.level, 2);
        assert_eq!(record.level_name, "CRITICAL");
        assert_eq!(record.context["attempt"], serde_json::json!(3));
        assert_eq!(record.extra["host"], serde_json::json!("web-1"));
    }
}
