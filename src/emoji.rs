//! Severity levels and the glyph shown in front of each chat message.

use std::fmt;
use std::str::FromStr;

/// Glyph used for severity codes outside the RFC 5424 range.
pub const FALLBACK_EMOJI: &str = "\u{1F514}";

/// The eight RFC 5424 severities, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    pub const ALL: [Severity; 8] = [
        Severity::Emergency,
        Severity::Alert,
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Notice,
        Severity::Info,
        Severity::Debug,
    ];

    /// Look up a severity by its RFC 5424 code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Upper-case name used as the level label in messages.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Emergency => "EMERGENCY",
            Severity::Alert => "ALERT",
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Notice => "NOTICE",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Severity::Debug => "\u{1F6A7}",
            // Leading zero-width joiner is part of the historical glyph.
            Severity::Info => "\u{200D}\u{1F5E8}",
            Severity::Notice => "\u{1F575}",
            Severity::Warning => "\u{26A1}\u{FE0F}",
            Severity::Error => "\u{1F6A8}",
            Severity::Critical => "\u{1F912}",
            Severity::Alert => "\u{1F440}",
            Severity::Emergency => "\u{1F915}",
        }
    }

    /// `tracing` only knows five levels; TRACE collapses into debug.
    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::DEBUG | tracing::Level::TRACE => Severity::Debug,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown severity name: {0}")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "emergency" | "emerg" => Ok(Severity::Emergency),
            "alert" => Ok(Severity::Alert),
            "critical" | "crit" => Ok(Severity::Critical),
            "error" | "err" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "notice" => Ok(Severity::Notice),
            "info" => Ok(Severity::Info),
            "debug" => Ok(Severity::Debug),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

/// Glyph for a raw severity code, falling back to [`FALLBACK_EMOJI`].
pub fn resolve(level: u8) -> &'static str {
    match Severity::from_code(level) {
        Some(severity) => severity.emoji(),
        None => FALLBACK_EMOJI,
    }
}
