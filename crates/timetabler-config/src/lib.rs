//! # Timetabler Config
//!
//! Configuration types for the Timetabler API, loaded from environment variables.
//!
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`jwt`]: Bearer token verification settings
//! - [`server`]: Listen address
//! - [`store`]: Document store backend selection
//! - [`timetable`]: Period list and slot commit policy
//!
//! # Example
//!
//! ```ignore
//! use timetabler_config::{JwtConfig, StoreConfig, TimetableConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let store_config = StoreConfig::from_env();
//! let timetable_config = TimetableConfig::from_env();
//! ```

pub mod cors;
pub mod jwt;
pub mod server;
pub mod store;
pub mod timetable;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;
pub use store::{StoreBackend, StoreConfig};
pub use timetable::{CommitPolicy, DEFAULT_PERIODS, TimetableConfig};

/// Reads `key` and parses it, falling back to `default` when unset or malformed.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring malformed configuration value");
            default
        }),
        Err(_) => default,
    }
}
