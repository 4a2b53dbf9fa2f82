use crate::layer::{NotificationLayer, SinkStats};
use crate::sink::LogSink;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::Level;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Settings of the notification layer.
///
/// **Fields**
/// - `channel_buffer`: maximum number of [`LogRecord`]s waiting for
///   delivery before new ones are dropped.
/// - `min_level`: most verbose `tracing` level forwarded to the sink.
/// - `channel_name`: fixed channel shown in messages; `None` uses the
///   event target.
/// - `include_location`: add source `file` and `line` to `extra`.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to the notification layer.
///
/// [`LogRecord`]: crate::record::LogRecord
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub min_level: Level,
    pub channel_name: Option<String>,
    pub include_location: bool,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            min_level: Level::ERROR,
            channel_name: None,
            include_location: false,
            enable_stdout: true,
        }
    }
}

impl LayerConfig {
    /// Build the layer described by this config around `sink`.
    pub fn build_layer(&self, sink: Arc<dyn LogSink>) -> (NotificationLayer, JoinHandle<()>) {
        let (layer, handle) = NotificationLayer::new(sink, self.channel_buffer);
        let mut layer = layer
            .with_min_level(self.min_level)
            .with_location(self.include_location);
        if let Some(name) = &self.channel_name {
            layer = layer.with_channel_name(name.clone());
        }
        (layer, handle)
    }
}

/// Install the notification layer as part of the global subscriber.
///
/// **Parameters**
/// - `sink`: implementation of [`LogSink`] receiving the records.
/// - `config`: [`LayerConfig`] controlling queueing and filtering.
///
/// **Returns**
/// - The layer's [`SinkStats`] so callers can observe delivery failures.
/// - `Err(..)` if a global subscriber was already installed.
///
/// Must be called from within a Tokio runtime.
pub fn init_tracing_with_config(
    sink: Arc<dyn LogSink>,
    config: LayerConfig,
) -> Result<Arc<SinkStats>, SetGlobalDefaultError> {
    let (layer, _handle) = config.build_layer(sink);
    let stats = layer.stats();

    // The two branches produce different subscriber types.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(stats)
}

/// Initialize tracing with [`LayerConfig::default`].
pub fn init_tracing(sink: Arc<dyn LogSink>) -> Result<Arc<SinkStats>, SetGlobalDefaultError> {
    init_tracing_with_config(sink, LayerConfig::default())
}
