use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::error;

use telegram_log_sink::config::SinkConfig;
use telegram_log_sink::init::init_tracing;
use telegram_log_sink::sink::TelegramSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Reads TELEGRAM_LOG_TOKEN, TELEGRAM_LOG_CHAT_ID and the optional
    // TELEGRAM_LOG_* settings.
    let config = SinkConfig::from_env()?;
    let sink = Arc::new(TelegramSink::new(config)?);
    init_tracing(sink)?;

    let span = tracing::error_span!("job", job_id = 1187);
    let _guard = span.enter();
    error!(disk = "/dev/sda1", "disk full");

    sleep(Duration::from_secs(2)).await;
    Ok(())
}
