//! Configuration loader for the `chargepoint-etl` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase, improving
//!
use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse an optional float environment variable with a default value.
macro_rules! parse_env_f64 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Postal-district prefixes covering central London. A fetched charge point
/// is kept only if its postcode belongs to one of these districts.
const DEFAULT_AREA_PREFIXES: &[&str] = &[
    "EC1", "EC2", "EC3", "EC4", "WC1", "WC2", "SE1", "SW1", "W1",
];

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// OpenChargeMap POI endpoint.
    pub ocm_api_url: String,

    /// OpenChargeMap API key, sent as the `key` query parameter.
    pub ocm_api_key: String,

    /// Client identifier sent as the `User-Agent` header on every fetch.
    pub user_agent: String,

    /// ISO country code for the geographic query.
    pub country_code: String,

    /// Center point of the search circle.
    pub latitude: f64,
    pub longitude: f64,

    /// Search radius in miles around the center point.
    pub distance_miles: f64,

    /// Upper bound on records returned by a single fetch.
    pub max_results: u32,

    /// Destination table receiving the full-replace load.
    pub table_name: String,

    /// Postal-district prefixes used by the area filter.
    pub area_prefixes: Vec<String>,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
/// - `OCM_API_KEY` – OpenChargeMap API key
///
/// Optional:
/// - `OCM_API_URL` – POI endpoint (default: the public v3 API)
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `OCM_MAX_RESULTS` – result cap per fetch (default: 5000)
/// - `OCM_LATITUDE` / `OCM_LONGITUDE` – search center (default: central London)
/// - `OCM_DISTANCE_MILES` – search radius (default: 5)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let ocm_api_key = require_env!("OCM_API_KEY");
    let ocm_api_url = env::var("OCM_API_URL")
        .unwrap_or_else(|_| "https://api.openchargemap.io/v3/poi/".to_string());
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let max_results = parse_env_u32!("OCM_MAX_RESULTS", 5000);
    let latitude = parse_env_f64!("OCM_LATITUDE", 51.5074);
    let longitude = parse_env_f64!("OCM_LONGITUDE", -0.1278);
    let distance_miles = parse_env_f64!("OCM_DISTANCE_MILES", 5.0);

    Ok(Config {
        db_url,
        db_pool_max,
        ocm_api_url,
        ocm_api_key,
        user_agent: "chargepoint-etl/1.0".to_string(),
        country_code: "GB".to_string(),
        latitude,
        longitude,
        distance_miles,
        max_results,
        table_name: "ev_chargepoints".to_string(),
        area_prefixes: DEFAULT_AREA_PREFIXES
            .iter()
            .map(|p| p.to_string())
            .collect(),
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords and the API key
    /// while showing all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        // Mask the password in the database URL for security
        let masked_db_url = if let Some(at_pos) = self.db_url.rfind('@') {
            if let Some(colon_pos) = self.db_url[..at_pos].rfind(':') {
                format!(
                    "{}:****{}",
                    &self.db_url[..colon_pos],
                    &self.db_url[at_pos..]
                )
            } else {
                self.db_url.clone()
            }
        } else {
            self.db_url.clone()
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL       : {}", masked_db_url);
        tracing::info!("  OCM_API_URL        : {}", self.ocm_api_url);
        tracing::info!("  OCM_API_KEY        : ****");
        tracing::info!("  DB_POOL_MAX        : {}", self.db_pool_max);
        tracing::info!("  OCM_MAX_RESULTS    : {}", self.max_results);
        tracing::info!(
            "  SEARCH CENTER      : ({}, {}) r={}mi",
            self.latitude,
            self.longitude,
            self.distance_miles
        );
        tracing::info!("  TABLE              : {}", self.table_name);
        tracing::info!("  AREA_PREFIXES      : {}", self.area_prefixes.join(", "));
    }
}
