//! Client settings.
//!
//! Loads configuration from environment variables (and an optional `.env`
//! file) with sensible defaults. The engine trusts a `Settings` value as-is;
//! all validation happens here.
//!
//! # Environment Variables
//!
//! - `FIREFLY_III_URL`: server base URL (required)
//! - `FIREFLY_III_TOKEN`: personal access token (required)
//! - `FIREFLY_TIMEOUT_MS`: per-attempt timeout (default: 30000)
//! - `FIREFLY_RETRY_ATTEMPTS`: retries after the first attempt (default: 3)
//! - `FIREFLY_RETRY_DELAY_MS`: base backoff delay (default: 1000)
//! - `FIREFLY_DEBUG`: request/response tracing (default: false)
//! - `FIREFLY_ENABLE_CACHE`: accepted but currently unused (default: false)

use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const URL_VAR: &str = "FIREFLY_III_URL";
pub const TOKEN_VAR: &str = "FIREFLY_III_TOKEN";
pub const TIMEOUT_VAR: &str = "FIREFLY_TIMEOUT_MS";
pub const RETRY_ATTEMPTS_VAR: &str = "FIREFLY_RETRY_ATTEMPTS";
pub const RETRY_DELAY_VAR: &str = "FIREFLY_RETRY_DELAY_MS";
pub const DEBUG_VAR: &str = "FIREFLY_DEBUG";
pub const CACHE_VAR: &str = "FIREFLY_ENABLE_CACHE";

const MIN_TOKEN_LEN: usize = 20;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Validated settings for one client session.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: Url,
    pub token: String,
    /// Deadline for each individual attempt.
    pub timeout: Duration,
    /// Retries after the initial attempt.
    pub retry_attempts: u32,
    /// Backoff base; attempt `n` waits `retry_delay * 2^n`.
    pub retry_delay: Duration,
    pub debug: bool,
    pub enable_cache: bool,
}

impl Settings {
    /// Settings with default timing for the given server and token.
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            base_url,
            token: token.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            debug: false,
            enable_cache: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> SettingsResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an explicit env file, then the process environment.
    pub fn from_env_file(path: &Path) -> SettingsResult<Self> {
        dotenvy::from_path(path).map_err(|e| SettingsError::Invalid {
            key: "env file",
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse settings from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> SettingsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = non_empty(&lookup, URL_VAR).ok_or(SettingsError::Missing(URL_VAR))?;
        let base_url = parse_base_url(&raw_url)?;

        let token = non_empty(&lookup, TOKEN_VAR).ok_or(SettingsError::Missing(TOKEN_VAR))?;
        if token.len() < MIN_TOKEN_LEN {
            return Err(SettingsError::Invalid {
                key: TOKEN_VAR,
                reason: format!("token looks truncated (expected at least {MIN_TOKEN_LEN} characters)"),
            });
        }

        let timeout_ms = load_number(&lookup, TIMEOUT_VAR, DEFAULT_TIMEOUT_MS, 1_000..=300_000)?;
        let retry_attempts = load_number(&lookup, RETRY_ATTEMPTS_VAR, DEFAULT_RETRY_ATTEMPTS.into(), 0..=10)?;
        let retry_delay_ms = load_number(&lookup, RETRY_DELAY_VAR, DEFAULT_RETRY_DELAY_MS, 0..=60_000)?;

        Ok(Self {
            base_url,
            token,
            timeout: Duration::from_millis(timeout_ms),
            // Bounded to 0..=10 above.
            retry_attempts: retry_attempts as u32,
            retry_delay: Duration::from_millis(retry_delay_ms),
            debug: load_flag(&lookup, DEBUG_VAR)?,
            enable_cache: load_flag(&lookup, CACHE_VAR)?,
        })
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("debug", &self.debug)
            .field("enable_cache", &self.enable_cache)
            .finish()
    }
}

fn non_empty<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<String> {
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_base_url(raw: &str) -> SettingsResult<Url> {
    let url = Url::parse(raw).map_err(|e| SettingsError::Invalid {
        key: URL_VAR,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SettingsError::Invalid {
            key: URL_VAR,
            reason: format!("unsupported scheme {:?}", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(SettingsError::Invalid {
            key: URL_VAR,
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

fn load_number<F>(
    lookup: &F,
    key: &'static str,
    default: u64,
    range: std::ops::RangeInclusive<u64>,
) -> SettingsResult<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = non_empty(lookup, key) else {
        return Ok(default);
    };
    let value = raw.parse::<u64>().map_err(|_| SettingsError::Invalid {
        key,
        reason: format!("{raw:?} is not a non-negative integer"),
    })?;
    if !range.contains(&value) {
        return Err(SettingsError::Invalid {
            key,
            reason: format!("{value} is outside {}..={}", range.start(), range.end()),
        });
    }
    Ok(value)
}

fn load_flag<F: Fn(&str) -> Option<String>>(lookup: &F, key: &'static str) -> SettingsResult<bool> {
    let Some(raw) = non_empty(lookup, key) else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SettingsError::Invalid {
            key,
            reason: format!("expected true/false, got {other:?}"),
        }),
    }
}
