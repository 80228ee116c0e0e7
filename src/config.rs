use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::ItemCache;
use crate::error::{HnError, Result};

pub const DEFAULT_API_BASE: &str = "https://hacker-news.firebaseio.com";
pub const MAX_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub cache_capacity: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            cache_capacity: ItemCache::DEFAULT_CAPACITY,
            user_agent: concat!("hn_items/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base = lookup("HN_API_BASE").unwrap_or(defaults.api_base);
        if api_base.trim().is_empty() {
            return Err(HnError::Config("HN_API_BASE must not be empty".to_string()));
        }

        let request_timeout = parse_var(&lookup, "HN_REQUEST_TIMEOUT_SECS", defaults.request_timeout.as_secs())?;
        let connect_timeout = parse_var(&lookup, "HN_CONNECT_TIMEOUT_SECS", defaults.connect_timeout.as_secs())?;

        let cache_capacity = parse_var(&lookup, "HN_CACHE_CAPACITY", defaults.cache_capacity)?;
        if cache_capacity == 0 {
            return Err(HnError::Config("HN_CACHE_CAPACITY must be at least 1".to_string()));
        }

        let user_agent = lookup("HN_USER_AGENT").unwrap_or(defaults.user_agent);

        Ok(Self {
            api_base,
            request_timeout: timeout_from_secs("HN_REQUEST_TIMEOUT_SECS", request_timeout)?,
            connect_timeout: timeout_from_secs("HN_CONNECT_TIMEOUT_SECS", connect_timeout)?,
            cache_capacity,
            user_agent,
        })
    }

    /// Overrides the request timeout with the same bounds the env var gets.
    pub fn set_request_timeout_secs(&mut self, secs: u64) -> Result<()> {
        self.request_timeout = timeout_from_secs("request timeout", secs)?;
        Ok(())
    }

    /// Longest a caller should wait for one lookup to settle.
    pub fn lookup_budget(&self) -> Duration {
        self.request_timeout.saturating_add(self.connect_timeout)
    }
}

fn timeout_from_secs(name: &str, secs: u64) -> Result<Duration> {
    if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
        return Err(HnError::Config(format!(
            "{} must be between 1 and {} seconds, got {}",
            name, MAX_TIMEOUT_SECS, secs
        )));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| HnError::Config(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}
