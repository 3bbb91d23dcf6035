//! Configuration module
//!
//! Configuration is loaded once at startup with [`Config::from_env`] and passed
//! explicitly to every component that needs it.

use std::env;

use crate::constants::{
    DEFAULT_RETENTION_DAYS, DEFAULT_TIMER_DAYS, MAX_CONFIGURABLE_DAYS, MAX_TIMER_DAYS,
};

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SERVER_PORT: u16 = 4000;
const MAX_UPLOAD_SIZE_MB: i64 = 2048;
const DEFAULT_PUSH_API_URL: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub local_storage_path: String,
    pub max_upload_size_bytes: i64,
    /// Days between distribution and expiration.
    pub retention_days: i64,
    pub default_timer_days: i64,
    pub max_timer_days: i64,
    // Push notifications
    pub push_enabled: bool,
    pub push_api_url: String,
    pub push_access_token: Option<String>,
    // Background sweeps
    pub jobs_enabled: bool,
    pub jobs_run_on_start: bool,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size_bytes = env::var("MAX_UPLOAD_SIZE_BYTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB * 1024 * 1024);

        Ok(Self {
            server_port: env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid SERVER_PORT: {}", e))?,
            environment,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| "./storage".to_string()),
            max_upload_size_bytes,
            retention_days: env_parse("RETENTION_DAYS", DEFAULT_RETENTION_DAYS),
            default_timer_days: env_parse("DEFAULT_TIMER_DAYS", DEFAULT_TIMER_DAYS),
            max_timer_days: env_parse("MAX_TIMER_DAYS", MAX_TIMER_DAYS),
            push_enabled: env_bool("PUSH_ENABLED", false),
            push_api_url: env::var("PUSH_API_URL")
                .unwrap_or_else(|_| DEFAULT_PUSH_API_URL.to_string()),
            push_access_token: env::var("PUSH_ACCESS_TOKEN").ok().filter(|s| !s.is_empty()),
            jobs_enabled: env_bool("JOBS_ENABLED", true),
            jobs_run_on_start: env_bool("JOBS_RUN_ON_START", false),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if !(1..=MAX_CONFIGURABLE_DAYS).contains(&self.retention_days) {
            return Err(anyhow::anyhow!(
                "RETENTION_DAYS must be between 1 and {}",
                MAX_CONFIGURABLE_DAYS
            ));
        }

        if !(1..=MAX_CONFIGURABLE_DAYS).contains(&self.max_timer_days) {
            return Err(anyhow::anyhow!(
                "MAX_TIMER_DAYS must be between 1 and {}",
                MAX_CONFIGURABLE_DAYS
            ));
        }

        if self.default_timer_days < 1 || self.default_timer_days > self.max_timer_days {
            return Err(anyhow::anyhow!(
                "DEFAULT_TIMER_DAYS must be between 1 and MAX_TIMER_DAYS ({})",
                self.max_timer_days
            ));
        }

        if self.max_upload_size_bytes <= 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_BYTES must be positive"));
        }

        if self.push_enabled && self.push_api_url.is_empty() {
            return Err(anyhow::anyhow!(
                "PUSH_ENABLED=true requires PUSH_API_URL to be set"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn local_storage_path(&self) -> &str {
        &self.local_storage_path
    }

    pub fn retention_days(&self) -> i64 {
        self.retention_days
    }

    pub fn max_timer_days(&self) -> i64 {
        self.max_timer_days
    }

    pub fn default_timer_days(&self) -> i64 {
        self.default_timer_days
    }

    pub fn max_upload_size_bytes(&self) -> i64 {
        self.max_upload_size_bytes
    }
}
