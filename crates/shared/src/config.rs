//! Application configuration management.

use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::AppError;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Ledger configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending schema migrations on startup.
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_run_migrations() -> bool {
    true
}

/// Token settings. Tokens are issued elsewhere; this service only validates.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Shared HMAC secret.
    pub secret: String,
    /// Lifetime used when this service mints tokens (tests, tooling).
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// IANA timezone that decides which calendar month an entry is booked in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "Asia/Jakarta".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

impl LedgerConfig {
    /// Parses the configured timezone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the name is not a known IANA zone.
    pub fn tz(&self) -> Result<Tz, AppError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| AppError::Config(format!("ledger.timezone: {e}")))
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Later sources win: `config/default`, `config/{RUN_MODE}`, then
    /// `PETTYCASH__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PETTYCASH").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_default_timezone() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.tz().unwrap(), chrono_tz::Asia::Jakarta);
    }

    #[test]
    fn test_ledger_unknown_timezone() {
        let ledger = LedgerConfig {
            timezone: "Mars/Olympus".to_string(),
        };
        let err = ledger.tz().unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let cfg = config::Config::builder()
            .set_override("server.port", 9000)
            .unwrap()
            .set_override("database.url", "postgres://localhost/pettycash")
            .unwrap()
            .set_override("jwt.secret", "s3cret")
            .unwrap()
            .build()
            .unwrap();

        let app: AppConfig = cfg.try_deserialize().unwrap();
        assert_eq!(app.server.host, "0.0.0.0");
        assert_eq!(app.server.port, 9000);
        assert_eq!(app.database.max_connections, 10);
        assert!(app.database.run_migrations);
        assert_eq!(app.jwt.access_token_expiry_secs, 900);
        assert_eq!(app.ledger.timezone, "Asia/Jakarta");
    }
}
