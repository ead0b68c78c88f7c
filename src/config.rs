//! Client configuration.
//!
//! Values come from the process environment. On desktop a `.env` file is read
//! first; mobile and web builds fall back to the bundled `assets/config.env`,
//! which only fills variables that are not already set.

use std::env;
use std::time::Duration;

/// Bundled config for mobile and web builds
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

/// Compile-time base URL, used when nothing is configured at runtime.
const BUILD_SERVER_URL: Option<&str> = option_env!("CHATFRONT_SERVER_URL");
const FALLBACK_SERVER_URL: &str = "http://localhost:3000";

pub const SERVER_URL_VAR: &str = "CHATFRONT_SERVER_URL";
pub const TIMEOUT_VAR: &str = "CHATFRONT_REQUEST_TIMEOUT_SECS";
pub const ATTEMPTS_VAR: &str = "CHATFRONT_CHAT_CREATE_ATTEMPTS";
pub const BACKOFF_VAR: &str = "CHATFRONT_CHAT_BACKOFF_MS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CREATE_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF_MS: u64 = 250;
const MAX_BACKOFF: Duration = Duration::from_secs(4);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be at least 1")]
    ZeroAttempts { var: &'static str },
}

/// Bounded retry with exponential backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: MAX_BACKOFF,
        }
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (zero-based): `base * 2^attempt`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_CREATE_ATTEMPTS,
            Duration::from_millis(DEFAULT_BACKOFF_MS),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub request_timeout: Duration,
    pub chat_bootstrap: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: BUILD_SERVER_URL
                .unwrap_or(FALLBACK_SERVER_URL)
                .to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            chat_bootstrap: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Read the config from the process environment; see [`load_dotenv`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; the environment in production, a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server_url = lookup(SERVER_URL_VAR)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.server_url);

        let request_timeout = match read_number(&lookup, TIMEOUT_VAR)? {
            Some(secs) => Duration::from_secs(secs),
            None => defaults.request_timeout,
        };

        let max_attempts = match read_number(&lookup, ATTEMPTS_VAR)? {
            Some(0) => return Err(ConfigError::ZeroAttempts { var: ATTEMPTS_VAR }),
            Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
            None => defaults.chat_bootstrap.max_attempts,
        };

        let base_delay = match read_number(&lookup, BACKOFF_VAR)? {
            Some(ms) => Duration::from_millis(ms),
            None => defaults.chat_bootstrap.base_delay,
        };

        Ok(Self {
            server_url,
            request_timeout,
            chat_bootstrap: RetryPolicy::new(max_attempts, base_delay),
        })
    }
}

fn read_number<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_dotenv() {
    // First try to load from .env file (desktop dev)
    if dotenvy::dotenv().is_ok() {
        return;
    }

    // Fall back to bundled config (mobile builds)
    load_bundled_config();
}

#[cfg(target_arch = "wasm32")]
pub fn load_dotenv() {
    load_bundled_config();
}

fn load_bundled_config() {
    for (key, value) in parse_env_lines(BUNDLED_CONFIG) {
        // Only set if not already set (allow env override)
        if env::var(key).is_err() {
            // SAFETY: called once at startup before the runtime spawns any threads
            unsafe {
                env::set_var(key, value);
            }
        }
    }
}

/// `KEY=VALUE` pairs from an env file, skipping blanks and `#` comments.
fn parse_env_lines(source: &str) -> Vec<(&str, &str)> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}
