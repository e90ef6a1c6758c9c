//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 4000)
//! - `DATABASE_URL` - Postgres connection string; in-memory store when unset
//! - `NATS_URL` - NATS server for domain events; events are only logged when unset
//! - `UPLOAD_DIR` - Root for uploaded product assets (default: public)
//! - `TAX_RATE` - VAT fraction applied at checkout (default: 0.12)
//! - `SALE_THRESHOLD` - Products priced below this are on sale (default: 5000)
//! - `LOW_STOCK_THRESHOLD` - Dashboard low-stock cutoff (default: 5)
//! - `ADMIN_SEED_EMAIL`, `ADMIN_SEED_USERNAME`, `ADMIN_SEED_PASSWORD` - Default admin upserted at startup

use rust_decimal::Decimal;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use crate::auth::AdminSeed;
use crate::domain::TaxRate;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shop rules shared by the API and the checkout engine.
#[derive(Clone, Debug, PartialEq)]
pub struct ShopSettings {
    pub tax_rate: TaxRate,
    pub sale_threshold: Decimal,
    pub low_stock_threshold: i64,
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self { tax_rate: TaxRate::default(), sale_threshold: Decimal::from(5000), low_stock_threshold: 5 }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub upload_dir: PathBuf,
    pub shop: ShopSettings,
    pub admin_seed: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let tax_rate: Decimal = parse_or("TAX_RATE", Decimal::new(12, 2))?;
        let tax_rate = TaxRate::new(tax_rate).map_err(|e| ConfigError::InvalidEnvVar("TAX_RATE".into(), e.to_string()))?;
        let admin_seed = match (get_optional_env("ADMIN_SEED_EMAIL"), get_optional_env("ADMIN_SEED_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                username: get_optional_env("ADMIN_SEED_USERNAME").unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            host: parse_or("HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or("PORT", 4000)?,
            database_url: get_optional_env("DATABASE_URL"),
            nats_url: get_optional_env("NATS_URL"),
            upload_dir: get_optional_env("UPLOAD_DIR").map_or_else(|| PathBuf::from("public"), PathBuf::from),
            shop: ShopSettings {
                tax_rate,
                sale_threshold: parse_or("SALE_THRESHOLD", Decimal::from(5000))?,
                low_stock_threshold: parse_or("LOW_STOCK_THRESHOLD", 5)?,
            },
            admin_seed,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
