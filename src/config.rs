use std::env;
use std::time::Duration;

use crate::db::RetryPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub dev_mode: bool,
    /// Maximum pooled SQLite connections (readers are unbounded within this; writers are serialized by SQLite)
    pub db_pool_size: u32,
    /// Backoff applied by the write gateway when SQLite reports contention
    pub write_retry: RetryPolicy,
    /// Admin account created on startup if it does not exist yet
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Sender address used when the active email settings leave it blank
    pub default_from_email: String,
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("KEYWARD_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = parse_var("PORT").unwrap_or(8080);

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let defaults = RetryPolicy::default();
        let write_retry = RetryPolicy {
            max_retries: parse_var("WRITE_RETRY_MAX").unwrap_or(defaults.max_retries),
            base_delay: parse_var("WRITE_RETRY_BASE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            max_delay: parse_var("WRITE_RETRY_MAX_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
            jitter: defaults.jitter,
        };

        let default_db = if dev_mode {
            "keyward_dev.db"
        } else {
            "keyward.db"
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| default_db.to_string()),
            dev_mode,
            db_pool_size: parse_var("DB_POOL_SIZE").unwrap_or(8),
            write_retry,
            admin_username: env::var("ADMIN_USERNAME").ok().filter(|s| !s.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
            default_from_email: env::var("DEFAULT_FROM_EMAIL")
                .unwrap_or_else(|_| "licenses@localhost".to_string()),
            public_base_url,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
