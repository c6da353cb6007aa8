//! # Timetabler Auth
//!
//! Bearer token handling for the Timetabler API.
//!
//! Users sign in with the department's identity provider, which mints an HS256
//! access token carrying the user's id, display name and [`Role`]. This crate
//! verifies those tokens and, for tooling and tests, can mint them too.
//!
//! - [`claims`]: The access token claim set
//! - [`jwt`]: Token creation and verification
//!
//! # Example
//!
//! ```ignore
//! use timetabler_auth::{create_access_token, verify_token};
//! use timetabler_config::JwtConfig;
//! use timetabler_models::Role;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token("uid-42", "Asha Rao", Role::Admin, &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert!(claims.is_admin());
//! ```
//!
//! [`Role`]: timetabler_models::Role

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
