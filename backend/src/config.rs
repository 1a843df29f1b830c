//! Configuration management for the Produce Trade Ledger
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PTL_ prefix

use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::RottenPolicy;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Ledger business-rule configuration
    pub ledger: LedgerConfig,
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

/// Rates and policies the derivation engine is parameterised with
#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    /// ISO 4217 currency code for display purposes
    pub currency: String,

    /// Cash-handling commission deducted from purchase invoices (fraction)
    pub cash_cutting_rate: Decimal,

    /// Commission added to sales invoices when the customer carries no
    /// per-customer override (fraction)
    pub default_commission_rate: Decimal,

    /// Whether rotten weight is merely recorded or deducted from line totals
    pub rotten_policy: RottenPolicy,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("PTL_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("ledger.currency", "INR")?
            .set_default("ledger.cash_cutting_rate", "0.02")?
            .set_default("ledger.default_commission_rate", "0.10")?
            .set_default("ledger.rotten_policy", "recorded")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PTL_ prefix)
            .add_source(
                Environment::with_prefix("PTL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            cash_cutting_rate: Decimal::new(2, 2),
            default_commission_rate: Decimal::new(10, 2),
            rotten_policy: RottenPolicy::Recorded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.cash_cutting_rate, Decimal::new(2, 2)); // 2%
        assert_eq!(ledger.default_commission_rate, Decimal::new(10, 2)); // 10%
        assert_eq!(ledger.rotten_policy, RottenPolicy::Recorded);
    }
}
