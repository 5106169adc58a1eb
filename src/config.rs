use std::env;
use std::fmt;

use chrono::Duration;

use crate::auth::TokenCodec;

/// Reasons the environment cannot produce a usable `Config`.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid(key, value) => write!(f, "{} has an invalid value: {}", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    /// PostgreSQL connection string. When unset the server keeps data in memory.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// Allowed browser origin. Any origin is accepted when unset.
    pub cors_origin: Option<String>,
}

fn optional(key: &'static str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, value)),
        None => Ok(default),
    }
}

/// Longest accepted session lifetime: ten years.
pub const MAX_JWT_EXPIRY_HOURS: i64 = 10 * 365 * 24;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_expiry_hours = parsed("JWT_EXPIRY_HOURS", 24i64)?;
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&jwt_expiry_hours) {
            return Err(ConfigError::Invalid(
                "JWT_EXPIRY_HOURS",
                jwt_expiry_hours.to_string(),
            ));
        }

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            server_port: parsed("SERVER_PORT", 8080u16)?,
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt_secret: optional("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            jwt_expiry_hours,
            cors_origin: optional("CORS_ORIGIN"),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn token_codec(&self) -> TokenCodec {
        TokenCodec::new(&self.jwt_secret, Duration::hours(self.jwt_expiry_hours))
    }
}
