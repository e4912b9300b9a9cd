//! # Configuration Module
//!
//! Connection settings for [`crate::Database`], read from the environment or
//! deserialized from any serde source.
//!
//! | variable | default |
//! |----------|---------|
//! | `SIMPLE_ORM_HOST` | `localhost` |
//! | `SIMPLE_ORM_PORT` | `3306` |
//! | `SIMPLE_ORM_USER` | `root` |
//! | `SIMPLE_ORM_PASSWORD` | empty |
//! | `SIMPLE_ORM_DATABASE` | none |
//! | `SIMPLE_ORM_USE_POOL` | `true` |
//! | `SIMPLE_ORM_POOL_LIMIT` | `10` |
//! | `SIMPLE_ORM_TIMEOUT` | `10000` (ms) |

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{str::FromStr, time::Duration};

use serde::Deserialize;
use sqlx::mysql::MySqlConnectOptions;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::errors::{Error, Result};

const ENV_PREFIX: &str = "SIMPLE_ORM_";

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub use_pool: bool,
    pub pool_limit: u32,
    pub timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: None,
            use_pool: true,
            pool_limit: 10,
            timeout_ms: 10_000,
        }
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid_argument(format!("{}{} has an invalid value: {}", ENV_PREFIX, key, raw)))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(Error::invalid_argument(format!(
            "{}{} is not a boolean: {}",
            ENV_PREFIX, key, raw
        ))),
    }
}

impl ConnectionConfig {
    /// Reads the `SIMPLE_ORM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which receives full variable names.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidArgument`] when a numeric or boolean variable does
    ///   not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(&format!("{}{}", ENV_PREFIX, key));
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host;
        }
        if let Some(port) = get("PORT") {
            config.port = parse("PORT", &port)?;
        }
        if let Some(user) = get("USER") {
            config.user = user;
        }
        if let Some(password) = get("PASSWORD") {
            config.password = password;
        }
        config.database = get("DATABASE").filter(|d| !d.is_empty());
        if let Some(use_pool) = get("USE_POOL") {
            config.use_pool = parse_bool("USE_POOL", &use_pool)?;
        }
        if let Some(limit) = get("POOL_LIMIT") {
            config.pool_limit = parse("POOL_LIMIT", &limit)?;
        }
        if let Some(timeout) = get("TIMEOUT") {
            config.timeout_ms = parse("TIMEOUT", &timeout)?;
        }

        Ok(config)
    }

    /// Maximum pool size: `pool_limit` when pooling, otherwise one.
    pub fn max_connections(&self) -> u32 {
        if self.use_pool { self.pool_limit.max(1) } else { 1 }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// sqlx connect options for these settings.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password);
        match &self.database {
            Some(database) => options.database(database),
            None => options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = ConnectionConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ConnectionConfig::default());
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
    }

    #[test]
    fn variables_override_defaults() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            ("SIMPLE_ORM_HOST", "db"),
            ("SIMPLE_ORM_PORT", "3307"),
            ("SIMPLE_ORM_DATABASE", "app"),
            ("SIMPLE_ORM_USE_POOL", "false"),
            ("SIMPLE_ORM_POOL_LIMIT", "20"),
        ]))
        .unwrap();

        assert_eq!(config.host, "db");
        assert_eq!(config.port, 3307);
        assert_eq!(config.database.as_deref(), Some("app"));
        assert_eq!(config.max_connections(), 1);
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = ConnectionConfig::from_lookup(lookup(&[("SIMPLE_ORM_PORT", "abc")])).unwrap_err();
        assert!(err.to_string().contains("SIMPLE_ORM_PORT"));
    }
}
