//! Configuration management for the Artis inventory backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with ARTIS_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// External spreadsheet configuration
    pub sheets: SheetsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

/// Spreadsheet API credentials and the per-category spreadsheet ids.
///
/// Credential loading lives here, not in the sync engine: services receive an
/// already-constructed client.
#[derive(Debug, Deserialize, Clone)]
pub struct SheetsConfig {
    /// Sheets API base URL
    pub api_base_url: String,

    /// Bearer token for the Sheets API
    pub api_token: String,

    /// Spreadsheet holding monthly consumption rows
    pub consumption_id: String,

    /// Spreadsheet holding purchase rows
    pub purchases_id: String,

    /// Spreadsheet holding correction rows
    pub corrections_id: String,

    /// Spreadsheet holding initial stock rows
    pub initial_stock_id: String,
}

impl SheetsConfig {
    /// Spreadsheet id for a sync category
    pub fn spreadsheet_id(&self, sync_type: shared::SyncType) -> &str {
        match sync_type {
            shared::SyncType::Consumption => &self.consumption_id,
            shared::SyncType::Purchases => &self.purchases_id,
            shared::SyncType::Corrections => &self.corrections_id,
            shared::SyncType::InitialStock => &self.initial_stock_id,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("ARTIS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3001)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("sheets.api_base_url", "https://sheets.googleapis.com/v4")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (ARTIS_ prefix)
            .add_source(
                Environment::with_prefix("ARTIS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            host: "0.0.0.0".to_string(),
        }
    }
}
