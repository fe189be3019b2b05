use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::creatures::Locale;
use crate::db::DbConfig;

/// Which store backs the creature records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(anyhow!(
                "unsupported POKEDEX_STORE '{other}' (expected 'postgres' or 'memory')"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub dev_mode: bool,
    pub store: StoreKind,
    pub locale: Locale,
    pub database: DbConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("POKEDEX_LISTEN_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8080".to_string())
            .parse()?;

        let log_level = lookup("POKEDEX_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let dev_mode = lookup("POKEDEX_DEV")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let store = match lookup("POKEDEX_STORE") {
            Some(v) => v.parse::<StoreKind>()?,
            None => StoreKind::Postgres,
        };

        let locale = match lookup("POKEDEX_LOCALE") {
            Some(v) => v.parse::<Locale>().map_err(|e| anyhow!(e))?,
            None => Locale::default(),
        };

        let database = DbConfig::from_lookup(&lookup);

        Ok(Self {
            listen_addr,
            log_level,
            dev_mode,
            store,
            locale,
            database,
        })
    }
}
