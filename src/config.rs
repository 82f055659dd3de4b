use std::env;
use std::fmt;
use std::str::FromStr;

const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 24;
const DEFAULT_RETENTION_DAYS: i64 = 30;
const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
const MAX_RETENTION_DAYS: i64 = 36_500;
const MAX_JWT_EXPIRATION_HOURS: i64 = 8_760;

/// Errors raised while reading configuration at startup.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
    OutOfRange {
        key: &'static str,
        min: i64,
        max: i64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
            ConfigError::OutOfRange { key, min, max } => {
                write!(f, "{} must be between {} and {}", key, min, max)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub bcrypt_cost: u32,
    /// How long a soft-deleted task is kept before the purge job removes it.
    pub retention_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let retention_days = in_range(
            "TASK_RETENTION_DAYS",
            parse_or(&lookup, "TASK_RETENTION_DAYS", DEFAULT_RETENTION_DAYS)?,
            1,
            MAX_RETENTION_DAYS,
        )?;
        let jwt_expiration_hours = in_range(
            "JWT_EXPIRATION_HOURS",
            parse_or(&lookup, "JWT_EXPIRATION_HOURS", DEFAULT_JWT_EXPIRATION_HOURS)?,
            1,
            MAX_JWT_EXPIRATION_HOURS,
        )?;
        let bcrypt_cost = in_range(
            "BCRYPT_COST",
            parse_or(&lookup, "BCRYPT_COST", i64::from(DEFAULT_BCRYPT_COST))?,
            4,
            31,
        )? as u32;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            server_port: parse_or(&lookup, "SERVER_PORT", DEFAULT_SERVER_PORT)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_hours,
            bcrypt_cost,
            retention_days,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn in_range(key: &'static str, value: i64, min: i64, max: i64) -> Result<i64, ConfigError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { key, min, max })
    }
}
