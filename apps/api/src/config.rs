use anyhow::{Context, Result};

use crate::feed::reveal::DEFAULT_PAGE_SIZE;
use crate::feed::scoring::RankingWeights;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value is invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Absent means notifications stay inside this process.
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub feed_page_size: usize,
    /// Offset from UTC, in minutes, of the midnight that starts a view day.
    pub view_day_offset_minutes: i32,
    pub onboarding_redirect: String,
    pub ranking: RankingWeights,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let feed_page_size = parse_env("FEED_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if feed_page_size == 0 {
            anyhow::bail!("FEED_PAGE_SIZE must be at least 1");
        }

        let view_day_offset_minutes = parse_env("VIEW_DAY_OFFSET_MINUTES", 0i32)?;
        if view_day_offset_minutes.abs() >= 24 * 60 {
            anyhow::bail!("VIEW_DAY_OFFSET_MINUTES must lie within ±1439");
        }

        let ranking = match std::env::var("RANKING_WEIGHTS") {
            Ok(raw) => serde_json::from_str(&raw)
                .context("RANKING_WEIGHTS must be a JSON object of ranking weights")?,
            Err(_) => RankingWeights::default(),
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: std::env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            feed_page_size,
            view_day_offset_minutes,
            onboarding_redirect: std::env::var("ONBOARDING_REDIRECT")
                .unwrap_or_else(|_| "/feed".to_string()),
            ranking,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/jobboard_test".to_string(),
            redis_url: None,
            port: 0,
            rust_log: "debug".to_string(),
            feed_page_size: DEFAULT_PAGE_SIZE,
            view_day_offset_minutes: 0,
            onboarding_redirect: "/feed".to_string(),
            ranking: RankingWeights::default(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
