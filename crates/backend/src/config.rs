// =============================================================================
// AdPace Backend - Configuration
// =============================================================================

use std::env;

use adpace_engine::EngineConfig;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1:4000")
    pub bind_address: String,

    /// Database URL (SQLite path)
    pub database_url: String,

    /// Reallocation policy tunables; defaults are the production constants,
    /// with a few common knobs overridable from the environment
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut engine = EngineConfig::default();
        if let Ok(marker) = env::var("REGION_MARKER") {
            engine.region_marker = marker;
        }
        if let Ok(value) = env::var("MIN_DAILY_BUDGET") {
            engine.min_daily_budget = value
                .parse()
                .map_err(|_| ConfigError::Invalid("MIN_DAILY_BUDGET"))?;
        }
        if let Ok(value) = env::var("DAYS_REMAINING") {
            engine.days_remaining = value
                .parse()
                .map_err(|_| ConfigError::Invalid("DAYS_REMAINING"))?;
        }
        if let Ok(value) = env::var("REGION_BUDGET_RATIO") {
            engine.region_budget_ratio = value
                .parse()
                .map_err(|_| ConfigError::Invalid("REGION_BUDGET_RATIO"))?;
        }

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:4000".into()),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:adpace.db".into()),
            engine,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
