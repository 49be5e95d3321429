use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::Duration;

use crate::error::AppError;

const FALLBACK_JWT_SECRET: &str = "fallback-key";
const TOKEN_LIFETIME_DAYS: RangeInclusive<i64> = 1..=365;

/// Deployment environment, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(AppError::InternalServerError(format!(
                "APP_ENV must be development, production or test (got {})",
                other
            ))),
        }
    }
}

pub struct Config {
    pub environment: Environment,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub jwt_expires_in_days: i64,
    pub bcrypt_cost: u32,
    pub cors_origin: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// `JWT_SECRET` and `DATABASE_URL` are mandatory in production; elsewhere a
    /// fallback secret and the in-memory store are used.
    pub fn from_env() -> Result<Self, AppError> {
        let environment = match env::var("APP_ENV") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::Development,
        };

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment.is_production() => {
                return Err(AppError::InternalServerError(
                    "JWT_SECRET is required in production".into(),
                ))
            }
            _ => FALLBACK_JWT_SECRET.to_string(),
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        if database_url.is_none() && environment.is_production() {
            return Err(AppError::InternalServerError(
                "DATABASE_URL is required in production".into(),
            ));
        }

        Ok(Self {
            environment,
            database_url,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            server_port: parse_var("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret,
            jwt_expires_in_days: token_lifetime_days()?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    /// How long an issued token stays valid.
    pub fn token_lifetime(&self) -> Result<Duration, AppError> {
        Duration::try_days(self.jwt_expires_in_days).ok_or_else(|| {
            AppError::InternalServerError(format!(
                "JWT_EXPIRES_IN_DAYS is out of range (got {})",
                self.jwt_expires_in_days
            ))
        })
    }
}

fn token_lifetime_days() -> Result<i64, AppError> {
    let days = parse_var("JWT_EXPIRES_IN_DAYS", 7)?;
    if !TOKEN_LIFETIME_DAYS.contains(&days) {
        return Err(AppError::InternalServerError(format!(
            "JWT_EXPIRES_IN_DAYS must be between {} and {} (got {})",
            TOKEN_LIFETIME_DAYS.start(),
            TOKEN_LIFETIME_DAYS.end(),
            days
        )));
    }
    Ok(days)
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            AppError::InternalServerError(format!("{} must be a number (got {})", name, raw))
        }),
        Err(_) => Ok(default),
    }
}
