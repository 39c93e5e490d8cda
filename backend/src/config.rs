//! Environment configuration.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `SUPPLY_CHAIN_DATA_DIR` | `.` |
//! | `SUPPLY_CHAIN_DB` | `supply_chain.db` |
//! | `SUPPLY_CHAIN_OUTPUT` | `processed_shipment_data.csv` |
//! | `SUPPLY_CHAIN_PORT` | `8000` |
//!
//! A `.env` file is picked up by the binary before [`Config::from_env`] runs.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DATA_DIR_VAR: &str = "SUPPLY_CHAIN_DATA_DIR";
pub const DB_VAR: &str = "SUPPLY_CHAIN_DB";
pub const OUTPUT_VAR: &str = "SUPPLY_CHAIN_OUTPUT";
pub const PORT_VAR: &str = "SUPPLY_CHAIN_PORT";

pub const DEFAULT_DB: &str = "supply_chain.db";
pub const DEFAULT_OUTPUT: &str = "processed_shipment_data.csv";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the five CSV extracts.
    pub data_dir: PathBuf,
    pub database: PathBuf,
    pub output: PathBuf,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            database: PathBuf::from(DEFAULT_DB),
            output: PathBuf::from(DEFAULT_OUTPUT),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolve from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(DATA_DIR_VAR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(db) = get(DB_VAR) {
            config.database = PathBuf::from(db);
        }
        if let Some(output) = get(OUTPUT_VAR) {
            config.output = PathBuf::from(output);
        }
        if let Some(port) = get(PORT_VAR) {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: PORT_VAR.to_string(),
                value: port.clone(),
            })?;
        }

        Ok(config)
    }
}
