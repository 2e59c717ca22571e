//! Runtime configuration.
//!
//! # Environment Variables
//!
//! | Setting | Primary Env Var | Fallback Env Var | Default |
//! |---------|-----------------|------------------|---------|
//! | FRED API key | `MACRODASH_FRED_API_KEY` | `FRED_API_KEY` | none, CSV export is used |
//! | Snapshot path | `MACRODASH_CACHE_PATH` | - | `.cache/macro-snapshot.json` |
//! | Cache TTL | `MACRODASH_CACHE_TTL_MINUTES` | - | 15 |
//!
//! Builder methods override whatever was read from the environment.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use time::macros::date;
use tracing::warn;

use crate::cache::DEFAULT_TTL;
use crate::domain::CalendarDate;

pub const DEFAULT_CACHE_PATH: &str = ".cache/macro-snapshot.json";

pub const DEFAULT_OBSERVATION_START: CalendarDate =
    CalendarDate::from_date(date!(2018 - 01 - 01));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    fred_api_key: Option<String>,
    cache_path: PathBuf,
    ttl: Duration,
    observation_start: CalendarDate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fred_api_key: None,
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            ttl: DEFAULT_TTL,
            observation_start: DEFAULT_OBSERVATION_START,
        }
    }
}

impl EngineConfig {
    /// Defaults only; the environment is not consulted.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.fred_api_key = env::var("MACRODASH_FRED_API_KEY")
            .or_else(|_| env::var("FRED_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        if let Ok(path) = env::var("MACRODASH_CACHE_PATH") {
            if !path.trim().is_empty() {
                config.cache_path = PathBuf::from(path);
            }
        }
        if let Ok(raw) = env::var("MACRODASH_CACHE_TTL_MINUTES") {
            match parse_ttl_minutes(&raw) {
                Some(ttl) => config.ttl = ttl,
                None => warn!(value = %raw, "ignoring unparsable MACRODASH_CACHE_TTL_MINUTES"),
            }
        }
        config
    }

    pub fn with_fred_api_key(mut self, key: impl Into<String>) -> Self {
        self.fred_api_key = Some(key.into());
        self
    }

    /// Forces the keyless CSV path even when a key is configured.
    pub fn without_fred_api_key(mut self) -> Self {
        self.fred_api_key = None;
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Whole-minute TTL; values past `u64::MAX` seconds saturate.
    pub fn with_ttl_minutes(self, minutes: u64) -> Self {
        self.with_ttl(ttl_from_minutes(minutes))
    }

    pub fn with_observation_start(mut self, start: CalendarDate) -> Self {
        self.observation_start = start;
        self
    }

    pub fn fred_api_key(&self) -> Option<&str> {
        self.fred_api_key.as_deref()
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn observation_start(&self) -> CalendarDate {
        self.observation_start
    }
}

fn ttl_from_minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

fn parse_ttl_minutes(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(ttl_from_minutes)
}
