use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};
use telegram_log_sink::{
    config::SinkConfig,
    error::DeliveryError,
    format::format_message,
    init::init_tracing,
    record::LogRecord,
    sink::LogSink,
};

/// Prints the message exactly as it would be posted to Telegram.
/// Handy for checking the layout without a bot token.
struct ConsolePreviewSink {
    config: SinkConfig,
}

#[async_trait]
impl LogSink for ConsolePreviewSink {
    async fn send(&self, record: &LogRecord) -> Result<(), DeliveryError> {
        println!("{}", format_message(record, &self.config, Utc::now()));
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SinkConfig::builder("unused", "unused").build()?;
    let sink: Arc<dyn LogSink> = Arc::new(ConsolePreviewSink { config });

    init_tracing(sink)?;

    info!("preview sink started");
    error!(db = "orders", "simulated error rendered for preview");

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    Ok(())
}
