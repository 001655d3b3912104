//! Process configuration read from the environment.
//!
//! Variables may be supplied by the shell, systemd, Docker, or a `.env`
//! file (loaded automatically in debug builds).

use std::env;
use std::path::PathBuf;

use crate::rate_limit::RateLimitConfig;

/// Minimum accepted length of `JWT_SECRET`.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("JWT_SECRET must be at least {MIN_SECRET_LEN} characters long")]
    WeakSecret,
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub frontend_url: String,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub enable_hsts: bool,
    pub rate_limit_enabled: bool,
    pub rate_limit: RateLimitConfig,
}

fn flag(name: &str) -> bool {
    env::var(name).map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let port = match env::var("PORT") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid { name: "PORT", value: v })?,
            Err(_) => 8080,
        };

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".into()),
            data_dir: env::var("CIVIC_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("data")),
            database_url: env::var("DATABASE_URL").ok(),
            enable_hsts: flag("ENABLE_HSTS"),
            rate_limit_enabled: !flag("RL_DISABLED"),
            rate_limit: RateLimitConfig::from_env(),
        })
    }
}
