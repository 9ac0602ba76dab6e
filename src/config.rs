//! Configuration management for the Firma server

use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub quota: QuotaConfig,
    pub signing: SigningConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    /// When false (the default) the quota is advisory: registration always
    /// succeeds and callers only surface the numbers. When true, exceeding
    /// the plan limit makes registration fail with 403.
    pub enforced: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SigningConfig {
    /// Viewport width assumed when a signing request carries neither a
    /// measured canvas box nor its own viewport hint. Keeps the degraded
    /// placement path available instead of failing the export.
    pub fallback_viewport_width: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./firma.db".to_string(),
            },
            quota: QuotaConfig { enforced: false },
            signing: SigningConfig {
                fallback_viewport_width: 1280.0,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            quota: QuotaConfig {
                enforced: env::var("QUOTA_ENFORCED")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.quota.enforced),
            },
            signing: SigningConfig {
                fallback_viewport_width: env::var("FALLBACK_VIEWPORT_WIDTH")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.signing.fallback_viewport_width),
            },
        }
    }
}
