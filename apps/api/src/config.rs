use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::autofill::classifier::ScoringWeights;
use crate::autofill::executor::ExecutorSettings;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub port: u16,
    pub rust_log: String,
    pub autofill: AutofillSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            port: optional_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            autofill: AutofillSettings::from_env()?,
        })
    }
}

/// Engine tuning. Every value has a default and can be overridden per deployment.
#[derive(Debug, Clone, Copy)]
pub struct AutofillSettings {
    pub confidence_threshold: f64,
    pub weights: ScoringWeights,
    pub upload_attempts: u32,
    pub upload_backoff_ms: u64,
    pub token_delay_ms: u64,
    pub watch_interval_ms: u64,
    pub watch_settle_ms: u64,
}

impl Default for AutofillSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            weights: ScoringWeights::default(),
            upload_attempts: 3,
            upload_backoff_ms: 1000,
            token_delay_ms: 100,
            watch_interval_ms: 1000,
            watch_settle_ms: 2000,
        }
    }
}

impl AutofillSettings {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let settings = Self {
            confidence_threshold: optional_env(
                "AUTOFILL_CONFIDENCE_THRESHOLD",
                d.confidence_threshold,
            )?,
            weights: ScoringWeights {
                keyword: optional_env("AUTOFILL_WEIGHT_KEYWORD", d.weights.keyword)?,
                pattern: optional_env("AUTOFILL_WEIGHT_PATTERN", d.weights.pattern)?,
                context: optional_env("AUTOFILL_WEIGHT_CONTEXT", d.weights.context)?,
                type_bonus: optional_env("AUTOFILL_WEIGHT_TYPE", d.weights.type_bonus)?,
            },
            upload_attempts: optional_env("AUTOFILL_UPLOAD_ATTEMPTS", d.upload_attempts)?,
            upload_backoff_ms: optional_env("AUTOFILL_UPLOAD_BACKOFF_MS", d.upload_backoff_ms)?,
            token_delay_ms: optional_env("AUTOFILL_TOKEN_DELAY_MS", d.token_delay_ms)?,
            watch_interval_ms: optional_env("AUTOFILL_WATCH_INTERVAL_MS", d.watch_interval_ms)?,
            watch_settle_ms: optional_env("AUTOFILL_WATCH_SETTLE_MS", d.watch_settle_ms)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!(
                "AUTOFILL_CONFIDENCE_THRESHOLD must be within [0, 1], got {}",
                self.confidence_threshold
            );
        }
        if self.upload_attempts == 0 {
            anyhow::bail!("AUTOFILL_UPLOAD_ATTEMPTS must be at least 1");
        }
        if self.watch_interval_ms == 0 {
            anyhow::bail!("AUTOFILL_WATCH_INTERVAL_MS must be positive");
        }
        Ok(())
    }

    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            upload_attempts: self.upload_attempts,
            upload_backoff: Duration::from_millis(self.upload_backoff_ms),
            token_delay: Duration::from_millis(self.token_delay_ms),
        }
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }

    pub fn watch_settle(&self) -> Duration {
        Duration::from_millis(self.watch_settle_ms)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
