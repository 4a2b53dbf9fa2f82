use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use telegram_log_sink::config::SinkConfig;
use telegram_log_sink::init::{init_tracing_with_config, LayerConfig};
use telegram_log_sink::sink::TelegramSink;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = SinkConfig::builder("123456:replace-me", "@my_alerts")
        .time_zone("Asia/Tehran")
        .date_format("%Y-%m-%d %H:%M:%S")
        .timeout(Duration::from_secs(10))
        .build()?;
    let sink = Arc::new(TelegramSink::new(config)?);

    let layer_config = LayerConfig {
        min_level: tracing::Level::WARN,
        channel_name: Some("auth-service".to_string()),
        ..LayerConfig::default()
    };
    let stats = init_tracing_with_config(sink, layer_config)?;

    info!("starting service");
    warn!(severity = "notice", user_id = 42, "password about to expire");
    error!(user_id = 42, reason = "invalid password", "authentication failed");

    // Give the delivery task time to post both messages.
    sleep(Duration::from_secs(3)).await;
    println!("delivered: {}, failed: {}", stats.delivered(), stats.failed());
    Ok(())
}
