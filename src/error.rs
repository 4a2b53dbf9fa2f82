/// Error returned when building a [`crate::config::SinkConfig`] or the
/// HTTP client behind it.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("invalid date format pattern: {0}")]
    InvalidDateFormat(String),

    #[error("timeout must be at least one second")]
    InvalidTimeout,

    #[error("invalid transport override {name}={value}")]
    InvalidOverride { name: String, value: String },

    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why a single `sendMessage` call did not go through.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("telegram request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with `"ok": false`.
    #[error("telegram api response: {description}")]
    Rejected {
        error_code: Option<i64>,
        description: String,
    },

    #[error("malformed telegram response (status {status}): {source}")]
    MalformedResponse {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl DeliveryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeliveryError::Transport(e) if e.is_timeout())
    }
}
