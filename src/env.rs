//! Environment variable names used by this crate for convenient
//! configuration of the sink from services.
//!
//! These are purely helpers; [`SinkConfig`] itself never reads the
//! environment unless [`SinkConfig::from_env`] is called.

use std::time::Duration;

use crate::config::{SinkConfig, TransportOverride, DEFAULT_DATE_FORMAT, DEFAULT_TIME_ZONE};
use crate::error::ConfigError;

/// Bot token issued by BotFather. Required.
pub const TELEGRAM_LOG_TOKEN_ENV: &str = "TELEGRAM_LOG_TOKEN";

/// Target chat: `@channel` handle or numeric id. Required.
pub const TELEGRAM_LOG_CHAT_ID_ENV: &str = "TELEGRAM_LOG_CHAT_ID";

/// IANA time zone for message timestamps.
pub const TELEGRAM_LOG_TIME_ZONE_ENV: &str = "TELEGRAM_LOG_TIME_ZONE";

/// strftime pattern for message timestamps.
pub const TELEGRAM_LOG_DATE_FORMAT_ENV: &str = "TELEGRAM_LOG_DATE_FORMAT";

/// Connect and total request timeout in seconds.
pub const TELEGRAM_LOG_TIMEOUT_SECS_ENV: &str = "TELEGRAM_LOG_TIMEOUT_SECS";

/// Optional replacement for `https://api.telegram.org`.
pub const TELEGRAM_LOG_API_BASE_ENV: &str = "TELEGRAM_LOG_API_BASE";

/// Optional proxy URL.
pub const TELEGRAM_LOG_PROXY_ENV: &str = "TELEGRAM_LOG_PROXY";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl SinkConfig {
    /// Build a config from the `TELEGRAM_LOG_*` variables.
    pub fn from_env() -> Result<SinkConfig, ConfigError> {
        SinkConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from `TELEGRAM_LOG_*` keys resolved by `lookup`
    /// instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<SinkConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::MissingEnv(key));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let mut builder = SinkConfig::builder(
            required(TELEGRAM_LOG_TOKEN_ENV)?,
            required(TELEGRAM_LOG_CHAT_ID_ENV)?,
        )
        .time_zone(or_default(TELEGRAM_LOG_TIME_ZONE_ENV, DEFAULT_TIME_ZONE))
        .date_format(or_default(TELEGRAM_LOG_DATE_FORMAT_ENV, DEFAULT_DATE_FORMAT));

        if let Some(secs) = lookup(TELEGRAM_LOG_TIMEOUT_SECS_ENV) {
            let secs = secs.trim().parse::<u64>().map_err(|_| ConfigError::InvalidTimeout)?;
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(base) = lookup(TELEGRAM_LOG_API_BASE_ENV) {
            builder = builder.transport_override(TransportOverride::ApiBase(base));
        }
        if let Some(proxy) = lookup(TELEGRAM_LOG_PROXY_ENV) {
            builder = builder.transport_override(TransportOverride::Proxy(proxy));
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn env_or_falls_back_for_unset_variable() {
        assert_eq!(env_or("TELEGRAM_LOG_NEVER_SET_IN_TESTS", "UTC"), "UTC");
    }

    #[test]
    fn missing_token_is_reported() {
        let result = SinkConfig::from_lookup(lookup_in(&[(TELEGRAM_LOG_CHAT_ID_ENV, "@alerts")]));
        assert!(matches!(result, Err(ConfigError::MissingEnv(TELEGRAM_LOG_TOKEN_ENV))));
    }

    #[test]
    fn reads_all_settings() {
        let config = SinkConfig::from_lookup(lookup_in(&[
            (TELEGRAM_LOG_TOKEN_ENV, "123:abc"),
            (TELEGRAM_LOG_CHAT_ID_ENV, "-100200300"),
            (TELEGRAM_LOG_TIME_ZONE_ENV, "Europe/Berlin"),
            (TELEGRAM_LOG_TIMEOUT_SECS_ENV, "5"),
            (TELEGRAM_LOG_API_BASE_ENV, "http://127.0.0.1:8081"),
        ]))
        .unwrap();

        assert_eq!(config.chat_id(), "-100200300");
        assert_eq!(config.time_zone(), chrono_tz::Europe::Berlin);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.date_format(), DEFAULT_DATE_FORMAT);
        assert_eq!(config.transport_options().api_base, "http://127.0.0.1:8081");
    }

    #[test]
    fn non_numeric_timeout_is_rejected() {
        let result = SinkConfig::from_lookup(lookup_in(&[
            (TELEGRAM_LOG_TOKEN_ENV, "123:abc"),
            (TELEGRAM_LOG_CHAT_ID_ENV, "@alerts"),
            (TELEGRAM_LOG_TIMEOUT_SECS_ENV, "soon"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidTimeout)));
    }
}
