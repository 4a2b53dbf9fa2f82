use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{SinkConfig, TransportOptions};
use crate::error::{ConfigError, DeliveryError};

/// `sendMessage` form body. Field order is part of the wire format.
#[derive(Serialize)]
struct SendMessageForm<'a> {
    text: &'a str,
    chat_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// One-shot client for the Bot API `SendMessage` method.
///
/// Every [`deliver`](TelegramTransport::deliver) call makes exactly one
/// request; there is no retry and no state between calls.
#[derive(Clone)]
pub struct TelegramTransport {
    client: Client,
    url: String,
    chat_id: String,
}

impl TelegramTransport {
    /// Build the HTTP client from the config's resolved transport options.
    pub fn new(config: &SinkConfig) -> Result<Self, ConfigError> {
        let options = config.transport_options();
        let client = build_client(&options)?;
        let url = format!("{}/bot{}/SendMessage", options.api_base, config.bot_token());

        Ok(Self {
            client,
            url,
            chat_id: config.chat_id().to_string(),
        })
    }

    /// Post `text` to the configured chat.
    ///
    /// **Returns**
    /// - `Ok(())` if the API answered `"ok": true`.
    /// - `Err(DeliveryError::Transport)` on connection, TLS, DNS or
    ///   timeout failures.
    /// - `Err(DeliveryError::Rejected)` if the API answered `"ok": false`.
    /// - `Err(DeliveryError::MalformedResponse)` if the body is not the
    ///   expected JSON object.
    pub async fn deliver(&self, text: &str) -> Result<(), DeliveryError> {
        let form = SendMessageForm {
            text,
            chat_id: &self.chat_id,
        };
        let resp = self.client.post(&self.url).form(&form).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;

        let parsed: ApiResponse = serde_json::from_slice(&body)
            .map_err(|source| DeliveryError::MalformedResponse { status, source })?;

        if parsed.ok {
            Ok(())
        } else {
            Err(DeliveryError::Rejected {
                error_code: parsed.error_code,
                description: parsed.description.unwrap_or_default(),
            })
        }
    }
}

fn build_client(options: &TransportOptions) -> Result<Client, ConfigError> {
    let mut builder = Client::builder()
        .connect_timeout(options.connect_timeout)
        .timeout(options.timeout);

    #[cfg(any(feature = "rustls-tls", feature = "native-tls"))]
    {
        builder = builder.danger_accept_invalid_certs(options.accept_invalid_certs);
    }

    if let Some(proxy) = &options.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
    }
    if let Some(ua) = &options.user_agent {
        builder = builder.user_agent(ua.as_str());
    }

    Ok(builder.build()?)
}
