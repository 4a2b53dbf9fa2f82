//! Forward `tracing` events to a Telegram chat.
//!
//! Events pass through [`layer::NotificationLayer`], become
//! [`record::LogRecord`]s, get rendered by [`format::format_message`] and
//! are posted by [`sink::TelegramSink`] through the Bot API `SendMessage`
//! method. Delivery is a single best-effort attempt; failures are counted
//! and logged, never returned to the code that emitted the event.

pub mod error;
pub mod record;
pub mod emoji;
pub mod config;
pub mod env;
pub mod format;
pub mod transport;
pub mod sink;
pub mod layer;
pub mod init;
