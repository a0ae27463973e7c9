use std::env;

use crate::models::session::SessionStatus;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    // Session generation defaults
    pub default_timezone: String,
    pub generation_batch_size: usize,
    pub default_attendance_status: SessionStatus,
    pub generation_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".into())
                .parse()?,
            jwt_secret: required("JWT_SECRET")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            default_timezone: env::var("DEFAULT_TIMEZONE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "UTC".into()),
            generation_batch_size: env::var("GENERATION_BATCH_SIZE")
                .unwrap_or_else(|_| "500".into())
                .parse()?,
            default_attendance_status: env::var("DEFAULT_ATTENDANCE_STATUS")
                .unwrap_or_else(|_| "open".into())
                .parse()?,
            generation_timeout_secs: env::var("GENERATION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".into())
                .parse()?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}
