use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_TIME_ZONE: &str = "UTC";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

/// A single caller-supplied change to the HTTP client settings.
///
/// Overrides are applied after the defaults, in the order they were
/// added; a later override of the same option wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOverride {
    Timeout(Duration),
    ConnectTimeout(Duration),
    /// Turns off TLS certificate and hostname verification.
    DangerAcceptInvalidCerts(bool),
    Proxy(String),
    /// Replaces `https://api.telegram.org`, e.g. for a local Bot API server.
    ApiBase(String),
    UserAgent(String),
}

impl TransportOverride {
    /// Parse the string-keyed form used by environment and file configs.
    ///
    /// Durations are given in whole seconds.
    pub fn parse(name: &str, value: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidOverride {
            name: name.to_string(),
            value: value.to_string(),
        };
        let secs = || value.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| invalid());

        match name.trim().to_ascii_lowercase().as_str() {
            "timeout" => Ok(TransportOverride::Timeout(secs()?)),
            "connect_timeout" => Ok(TransportOverride::ConnectTimeout(secs()?)),
            "danger_accept_invalid_certs" => value
                .trim()
                .parse::<bool>()
                .map(TransportOverride::DangerAcceptInvalidCerts)
                .map_err(|_| invalid()),
            "proxy" => Ok(TransportOverride::Proxy(value.to_string())),
            "api_base" => Ok(TransportOverride::ApiBase(value.to_string())),
            "user_agent" => Ok(TransportOverride::UserAgent(value.to_string())),
            _ => Err(invalid()),
        }
    }
}

/// Effective HTTP client settings after overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    pub api_base: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
}

impl TransportOptions {
    pub fn resolve(timeout: Duration, overrides: &[TransportOverride]) -> Self {
        let mut options = TransportOptions {
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout: timeout,
            timeout,
            accept_invalid_certs: false,
            proxy: None,
            user_agent: None,
        };

        for o in overrides {
            match o {
                TransportOverride::Timeout(d) => options.timeout = *d,
                TransportOverride::ConnectTimeout(d) => options.connect_timeout = *d,
                TransportOverride::DangerAcceptInvalidCerts(v) => options.accept_invalid_certs = *v,
                TransportOverride::Proxy(p) => options.proxy = Some(p.clone()),
                TransportOverride::ApiBase(b) => options.api_base = b.trim_end_matches('/').to_string(),
                TransportOverride::UserAgent(ua) => options.user_agent = Some(ua.clone()),
            }
        }

        options
    }
}

/// Immutable configuration of a Telegram sink.
///
/// Built once through [`SinkConfig::builder`]; there are no setters.
#[derive(Clone)]
pub struct SinkConfig {
    bot_token: String,
    chat_id: String,
    time_zone: Tz,
    date_format: String,
    timeout: Duration,
    overrides: Vec<TransportOverride>,
}

impl SinkConfig {
    /// Start building a config for `bot_token` posting into `chat_id`
    /// (a `@channel` handle or a numeric chat id).
    pub fn builder(bot_token: impl Into<String>, chat_id: impl Into<String>) -> SinkConfigBuilder {
        SinkConfigBuilder {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            overrides: Vec::new(),
        }
    }

    pub fn bot_token(&self) -> &str {
        &self.bot_token
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport_overrides(&self) -> &[TransportOverride] {
        &self.overrides
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions::resolve(self.timeout, &self.overrides)
    }
}

impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("time_zone", &self.time_zone)
            .field("date_format", &self.date_format)
            .field("timeout", &self.timeout)
            .field("overrides", &self.overrides)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SinkConfigBuilder {
    bot_token: String,
    chat_id: String,
    time_zone: String,
    date_format: String,
    timeout: Duration,
    overrides: Vec<TransportOverride>,
}

impl SinkConfigBuilder {
    /// IANA zone name such as `"Asia/Tehran"`.
    pub fn time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    /// strftime-style pattern, e.g. `"%Y-%m-%d"`.
    pub fn date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn transport_override(mut self, o: TransportOverride) -> Self {
        self.overrides.push(o);
        self
    }

    pub fn transport_overrides(mut self, overrides: impl IntoIterator<Item = TransportOverride>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    pub fn build(self) -> Result<SinkConfig, ConfigError> {
        let time_zone = self
            .time_zone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimeZone(self.time_zone.clone()))?;

        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidDateFormat(self.date_format));
        }

        if self.timeout < Duration::from_secs(1) {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(SinkConfig {
            bot_token: self.bot_token,
            chat_id: self.chat_id,
            time_zone,
            date_format: self.date_format,
            timeout: self.timeout,
            overrides: self.overrides,
        })
    }
}
