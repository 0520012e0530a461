/*
 * Responsibility
 * - Load settings from the environment (PORT, DATABASE_URL, CORS_ORIGIN, ...)
 * - Validate them; a missing or malformed required value fails startup
 * - Build the CORS allow-list once, before any traffic is accepted
 */
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::services::origin_gate::AllowList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<&str>) -> Self {
        match raw
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub database_max_connections: u32,

    pub cors_allowed_origins: AllowList,

    pub request_body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (env, map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(s) => s.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 8080,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = parse_positive_or(
            "DATABASE_MAX_CONNECTIONS",
            lookup("DATABASE_MAX_CONNECTIONS"),
            5,
        )?;

        let cors_allowed_origins = AllowList::from_config(lookup("CORS_ORIGIN").as_deref());

        let request_body_limit_bytes = parse_positive_or(
            "REQUEST_BODY_LIMIT_BYTES",
            lookup("REQUEST_BODY_LIMIT_BYTES"),
            1024 * 1024,
        )?;

        let request_timeout_seconds: u64 =
            parse_positive_or("REQUEST_TIMEOUT_SECONDS", lookup("REQUEST_TIMEOUT_SECONDS"), 30)?;

        Ok(Self {
            addr,
            app_env,
            database_url,
            database_max_connections,
            cors_allowed_origins,
            request_body_limit_bytes,
            request_timeout: Duration::from_secs(request_timeout_seconds),
        })
    }
}

// Zero is rejected: a zero limit or timeout fails every request.
fn parse_positive_or<T>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
{
    let value = match raw {
        Some(s) => s.trim().parse().map_err(|_| ConfigError::Invalid(key))?,
        None => default,
    };
    if value == T::default() {
        return Err(ConfigError::Invalid(key));
    }
    Ok(value)
}
