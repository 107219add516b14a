//! Configuration loader

use chrono::{NaiveDate, NaiveTime};
use config::{Config, Environment, File};
use std::path::Path;
use std::time::Duration;

use super::types::AppConfig;
use crate::common::errors::{EngineError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP_)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    // Pick up a .env file if present
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| EngineError::Configuration(e.to_string()))?;

    let mut app: AppConfig = config
        .try_deserialize()
        .map_err(|e| EngineError::Configuration(e.to_string()))?;

    // A token supplied via env wins over the file
    if let Ok(token) = std::env::var("TUSHARE_TOKEN") {
        if !token.is_empty() {
            app.tushare.token = Some(token);
        }
    }

    validate(&app)?;
    Ok(app)
}

fn validate(cfg: &AppConfig) -> Result<()> {
    if cfg.engine.worker_pool_size == 0 {
        return Err(EngineError::Configuration(
            "engine.worker_pool_size must be at least 1".to_string(),
        ));
    }
    if cfg.engine.batch_size == 0 {
        return Err(EngineError::Configuration(
            "engine.batch_size must be at least 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&cfg.engine.degraded_threshold) {
        return Err(EngineError::Configuration(format!(
            "engine.degraded_threshold must be within [0, 1], got {}",
            cfg.engine.degraded_threshold
        )));
    }
    parse_fire_at(&cfg.scheduler.fire_at)?;
    parse_holidays(&cfg.scheduler.holidays)?;
    Ok(())
}

/// Parse the scheduler's "HH:MM" local fire time.
pub fn parse_fire_at(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|e| EngineError::Configuration(format!("invalid scheduler.fire_at {s:?}: {e}")))
}

/// Parse the configured holiday list.
pub fn parse_holidays(days: &[String]) -> Result<Vec<NaiveDate>> {
    days.iter()
        .map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|e| {
                EngineError::Configuration(format!("invalid scheduler.holidays entry {d:?}: {e}"))
            })
        })
        .collect()
}

/// Request timeout as a `Duration`
pub fn request_timeout(cfg: &AppConfig) -> Duration {
    Duration::from_secs(cfg.settings.request_timeout_seconds)
}
