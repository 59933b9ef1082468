use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use tokio_cron_scheduler::Job;

use crate::error::ConfigError;

/// Settings for the football-data client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub token: String,
    pub max_window_days: u32,
    /// Comma-separated status filter used for upcoming fixtures.
    pub statuses_upcoming: String,
    /// Comma-separated status filter that also covers matches in progress.
    pub statuses_active: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.football-data.org/v4".to_string(),
            token: String::new(),
            max_window_days: 10,
            statuses_upcoming: "SCHEDULED,TIMED".to_string(),
            statuses_active: "SCHEDULED,TIMED,IN_PLAY,PAUSED".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Settings for the periodic score fetcher.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub enabled: bool,
    pub window_days: u32,
    pub include_active: bool,
    pub min_interval: TimeDelta,
    pub max_teams_per_run: usize,
    pub spacing: Duration,
    /// Seconds-first cron expression, e.g. `0 * * * * *` for once a minute.
    pub cron: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_days: 2,
            include_active: true,
            min_interval: TimeDelta::seconds(1800),
            // 9 calls at 6.5s spacing keeps us under 10 calls/min
            max_teams_per_run: 9,
            spacing: Duration::from_millis(6500),
            cron: "0 * * * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub fetcher: FetcherConfig,
    pub database_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            fetcher: FetcherConfig::default(),
            database_path: "data/score-sync.db".to_string(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Missing or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let provider = ProviderConfig {
            base_url: get("FOOTBALLDATA_BASE_URL")
                .unwrap_or(defaults.provider.base_url)
                .trim_end_matches('/')
                .to_string(),
            token: get("FOOTBALLDATA_TOKEN").unwrap_or(defaults.provider.token),
            max_window_days: parse_or(&get, "FOOTBALLDATA_MAX_WINDOW_DAYS", defaults.provider.max_window_days)?,
            statuses_upcoming: get("FOOTBALLDATA_STATUSES_UPCOMING").unwrap_or(defaults.provider.statuses_upcoming),
            statuses_active: get("FOOTBALLDATA_STATUSES_ACTIVE").unwrap_or(defaults.provider.statuses_active),
            timeout: Duration::from_secs(parse_or(
                &get,
                "FOOTBALLDATA_TIMEOUT_SECS",
                defaults.provider.timeout.as_secs(),
            )?),
        };

        let min_interval_secs: u32 = parse_or(
            &get,
            "FETCHER_MIN_INTERVAL_SECONDS",
            defaults.fetcher.min_interval.num_seconds() as u32,
        )?;
        let fetcher = FetcherConfig {
            enabled: parse_or(&get, "FETCHER_ENABLED", defaults.fetcher.enabled)?,
            window_days: parse_or(&get, "FETCHER_WINDOW_DAYS", defaults.fetcher.window_days)?,
            include_active: parse_or(&get, "FETCHER_INCLUDE_ACTIVE", defaults.fetcher.include_active)?,
            min_interval: TimeDelta::seconds(i64::from(min_interval_secs)),
            max_teams_per_run: parse_or(&get, "FETCHER_MAX_TEAMS_PER_RUN", defaults.fetcher.max_teams_per_run)?,
            spacing: Duration::from_millis(parse_or(
                &get,
                "FETCHER_SPACING_MILLIS",
                defaults.fetcher.spacing.as_millis() as u64,
            )?),
            cron: get("FETCHER_CRON").unwrap_or(defaults.fetcher.cron),
        };

        let config = Config {
            provider,
            fetcher,
            database_path: get("DATABASE_PATH").unwrap_or(defaults.database_path),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.provider;
        let f = &self.fetcher;
        if p.base_url.is_empty() {
            return Err(ConfigError::OutOfRange { key: "FOOTBALLDATA_BASE_URL", what: "empty" });
        }
        if p.max_window_days == 0 {
            return Err(ConfigError::OutOfRange { key: "FOOTBALLDATA_MAX_WINDOW_DAYS", what: "zero" });
        }
        if p.timeout.is_zero() {
            return Err(ConfigError::OutOfRange { key: "FOOTBALLDATA_TIMEOUT_SECS", what: "zero" });
        }
        if p.statuses_upcoming.is_empty() {
            return Err(ConfigError::OutOfRange { key: "FOOTBALLDATA_STATUSES_UPCOMING", what: "empty" });
        }
        if p.statuses_active.is_empty() {
            return Err(ConfigError::OutOfRange { key: "FOOTBALLDATA_STATUSES_ACTIVE", what: "empty" });
        }
        if f.window_days == 0 {
            return Err(ConfigError::OutOfRange { key: "FETCHER_WINDOW_DAYS", what: "zero" });
        }
        if f.max_teams_per_run == 0 {
            return Err(ConfigError::OutOfRange { key: "FETCHER_MAX_TEAMS_PER_RUN", what: "zero" });
        }
        if f.min_interval < TimeDelta::zero() {
            return Err(ConfigError::OutOfRange { key: "FETCHER_MIN_INTERVAL_SECONDS", what: "negative" });
        }
        let fields = f.cron.split_whitespace().count();
        if !(6..=7).contains(&fields) {
            return Err(ConfigError::Cadence {
                expr: f.cron.clone(),
                reason: format!("expected 6 or 7 fields, got {fields}"),
            });
        }
        // same parser the cron driver uses
        Job::new(f.cron.as_str(), |_id, _jobs| {})
            .map_err(|e| ConfigError::Cadence { expr: f.cron.clone(), reason: e.to_string() })?;
        Ok(())
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.to_ascii_lowercase().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
