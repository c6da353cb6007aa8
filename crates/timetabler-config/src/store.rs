//! Document store selection.
//!
//! # Environment Variables
//!
//! - `STORE_BACKEND`: `memory` (default) or `postgres`
//! - `DATABASE_URL`: PostgreSQL connection string, required for `postgres`
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::env_or;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => f.write_str("memory"),
            StoreBackend::Postgres => f.write_str("postgres"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self {
            backend: env_or("STORE_BACKEND", StoreBackend::Memory),
            database_url: env::var("DATABASE_URL").ok(),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 5),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 5,
        }
    }
}
