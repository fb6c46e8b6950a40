//! Environment-driven settings, read once at startup.

use std::{env, fmt::Display, net::IpAddr, str::FromStr};

use axum::http::HeaderValue;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid { key: &'static str, value: String, reason: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            host: try_load(&lookup, "HOST", "0.0.0.0")?,
            port: try_load(&lookup, "PORT", "3000")?,
            database_url: non_empty("DATABASE_URL"),
            database_max_connections: try_load(&lookup, "DATABASE_MAX_CONNECTIONS", "10")?,
            cors_origin: non_empty("CORS_ORIGIN"),
        })
    }

    /// Restricted to `CORS_ORIGIN` when set, permissive otherwise.
    pub fn cors_layer(&self) -> Result<CorsLayer, ConfigError> {
        let Some(origin) = &self.cors_origin else {
            return Ok(CorsLayer::permissive());
        };
        let value = HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
            key: "CORS_ORIGIN",
            value: origin.clone(),
            reason: e.to_string(),
        })?;
        Ok(CorsLayer::very_permissive().allow_origin(value))
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid { key, value: raw.clone(), reason: e.to_string() })
}
