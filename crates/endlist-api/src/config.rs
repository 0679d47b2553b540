//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `DATABASE_URL` | `postgres://localhost/endlist` |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `REQUEST_TIMEOUT_SECS` | `30` |
//! | `FETCH_CONCURRENCY` | `8` |
//! | `ALLOWED_ORIGINS` | `http://localhost:3000` |

use std::str::FromStr;
use std::time::Duration;

use endlist_core::defaults;
use endlist_core::{Error, Result};

/// Origins allowed when `ALLOWED_ORIGINS` is unset or blank.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub request_timeout: Duration,
    pub fetch_concurrency: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            db_max_connections: defaults::DB_MAX_CONNECTIONS,
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
            fetch_concurrency: defaults::FETCH_CONCURRENCY,
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = Self::default();

        let timeout_secs: u64 =
            parse_var(&lookup, "REQUEST_TIMEOUT_SECS", defaults::REQUEST_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(Error::Config(
                "REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        let fetch_concurrency: usize =
            parse_var(&lookup, "FETCH_CONCURRENCY", defaults::FETCH_CONCURRENCY)?;
        if fetch_concurrency == 0 {
            return Err(Error::Config(
                "FETCH_CONCURRENCY must be greater than zero".to_string(),
            ));
        }

        let allowed_origins = match lookup("ALLOWED_ORIGINS") {
            Some(value) if !value.trim().is_empty() => split_origins(&value),
            _ => base.allowed_origins,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(base.database_url),
            host: lookup("HOST").unwrap_or(base.host),
            port: parse_var(&lookup, "PORT", base.port)?,
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", base.db_max_connections)?,
            request_timeout: Duration::from_secs(timeout_secs),
            fetch_concurrency,
            allowed_origins,
        })
    }

    /// Address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, raw))),
        None => Ok(default),
    }
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
