//! Rendering of a [`LogRecord`] into the chat message text.
//!
//! Layout:
//!
//! ```text
//! <date> <channel>.<LEVEL>
//! <emoji> <message> <context-json> <extra-json>
//! ```
//!
//! An empty `context` renders as nothing while an empty `extra` renders
//! as `{}`, so a record without either ends in `"<message>  {}"`.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::config::SinkConfig;
use crate::emoji;
use crate::record::LogRecord;

/// Build the message text for `record`, stamping it with `now` in the
/// configured time zone and date pattern.
pub fn format_message(record: &LogRecord, config: &SinkConfig, now: DateTime<Utc>) -> String {
    let mut out = String::with_capacity(record.message.len() + 64);

    render_timestamp(&mut out, config, now);
    let _ = write!(
        out,
        " {}.{}\n{} {} {} {}",
        record.channel,
        record.level_name,
        emoji::resolve(record.level),
        record.message,
        stringify_context(&record.context),
        encode_extra(&record.extra),
    );

    out
}

fn render_timestamp(out: &mut String, config: &SinkConfig, now: DateTime<Utc>) {
    let local = now.with_timezone(&config.time_zone());
    // The pattern is validated when the config is built; a failure here
    // just leaves the timestamp empty.
    if write!(out, "{}", local.format(config.date_format())).is_err() {
        out.clear();
    }
}

/// Compact JSON for a non-empty context, empty string otherwise.
pub fn stringify_context(context: &BTreeMap<String, Value>) -> String {
    if context.is_empty() {
        return String::new();
    }
    serde_json::to_string(context).unwrap_or_default()
}

/// Compact JSON for `extra`; `{}` when empty.
pub fn encode_extra(extra: &BTreeMap<String, Value>) -> String {
    serde_json::to_string(extra).unwrap_or_else(|_| "{}".to_string())
}
