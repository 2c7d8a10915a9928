use anyhow::{bail, Context};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => bail!("LOG_FORMAT must be 'json' or 'pretty', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub ledger_lock_timeout_ms: u64,
    pub settings_refresh_secs: u64,
    pub admin_api_key: String,
    pub cors_allowed_origins: Vec<String>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let admin_api_key = lookup("ADMIN_API_KEY").context("ADMIN_API_KEY must be set")?;
        if admin_api_key.trim().is_empty() {
            bail!("ADMIN_API_KEY must not be empty");
        }

        let config = Config {
            server_port: or_default("SERVER_PORT", "3000")
                .parse::<u16>()
                .context("SERVER_PORT must be a port number")?,
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: or_default("DATABASE_MAX_CONNECTIONS", "5")
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            ledger_lock_timeout_ms: or_default("LEDGER_LOCK_TIMEOUT_MS", "2000")
                .parse::<u64>()
                .context("LEDGER_LOCK_TIMEOUT_MS must be a number of milliseconds")?,
            settings_refresh_secs: or_default("SETTINGS_REFRESH_SECS", "60")
                .parse::<u64>()
                .context("SETTINGS_REFRESH_SECS must be a number of seconds")?,
            admin_api_key,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
            log_format: or_default("LOG_FORMAT", "pretty").parse::<LogFormat>()?,
        };

        if config.database_max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }
        if config.ledger_lock_timeout_ms == 0 {
            bail!("LEDGER_LOCK_TIMEOUT_MS must be at least 1");
        }

        Ok(config)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_lock_timeout_ms)
    }

    pub fn settings_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.settings_refresh_secs.max(1))
    }
}
