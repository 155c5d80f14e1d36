use crate::rate_limit::RateLimit;

use http::HeaderValue;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set!")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    /// Shared secret for `X-API-Key`. `None` makes every `/api` call fail.
    pub api_key: Option<String>,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub log_level: Option<String>,
    /// Single allowed CORS origin; `None` allows any origin.
    pub cors_origin: Option<HeaderValue>,
    pub rate_limit: RateLimit,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let ip: IpAddr = parse_or(&get, "BIND_ADDR", IpAddr::from([0, 0, 0, 0]))?;
        let port: u16 = parse_or(&get, "PORT", 3000)?;
        let db_max_connections = parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?;
        let acquire_secs: u64 = parse_or(&get, "DATABASE_ACQUIRE_TIMEOUT_SECS", 5)?;

        let cors_origin = match get("CORS_ORIGIN") {
            Some(origin) if origin.trim() != "*" => Some(
                HeaderValue::from_str(origin.trim()).map_err(|_| ConfigError::Invalid {
                    name: "CORS_ORIGIN",
                    value: origin.clone(),
                })?,
            ),
            _ => None,
        };

        let defaults = RateLimit::default();
        let max_requests = parse_or(&get, "RATE_LIMIT_MAX", defaults.max_requests)?;
        let window_secs: u64 =
            parse_or(&get, "RATE_LIMIT_WINDOW_SECS", defaults.window.as_secs())?;
        if window_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "RATE_LIMIT_WINDOW_SECS",
                value: window_secs.to_string(),
            });
        }

        Ok(Self {
            database_url,
            api_key: get("API_KEY"),
            bind_addr: SocketAddr::new(ip, port),
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            log_level: get("LOG_LEVEL"),
            cors_origin,
            rate_limit: RateLimit {
                max_requests,
                window: Duration::from_secs(window_secs),
            },
        })
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
