//! Runtime configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::biometrics::DEFAULT_TICK;
use crate::gemini::GEMINI_FLASH;

/// Checked in order; the first non-blank value is the credential
pub const API_KEY_VARS: [&str; 3] = ["VITALIS_API_KEY", "GEMINI_API_KEY", "API_KEY"];

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct CoachConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub request_timeout: Duration,
    pub tick_interval: Duration,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: GEMINI_FLASH.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            tick_interval: DEFAULT_TICK,
            log_dir: None,
        }
    }
}

impl CoachConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value lookup. Unparsable numbers keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = API_KEY_VARS.iter().find_map(|key| get(*key));
        if api_key.is_none() {
            tracing::warn!("API key not found in environment variables");
        }

        Self {
            api_key,
            model: get("VITALIS_MODEL").unwrap_or(defaults.model),
            temperature: parse_or(get("VITALIS_TEMPERATURE"), "VITALIS_TEMPERATURE", defaults.temperature),
            request_timeout: secs_or(get("VITALIS_TIMEOUT_SECS"), "VITALIS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            tick_interval: secs_or(get("VITALIS_TICK_SECS"), "VITALIS_TICK_SECS", defaults.tick_interval.as_secs()),
            log_dir: get("VITALIS_LOG_DIR").map(PathBuf::from),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            default
        }),
        None => default,
    }
}

// Zero-second intervals are bumped to one
fn secs_or(value: Option<String>, key: &str, default: u64) -> Duration {
    Duration::from_secs(parse_or(value, key, default).max(1))
}
