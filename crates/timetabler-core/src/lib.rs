//! # Timetabler Core
//!
//! Core types shared by every Timetabler crate.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//!
//! # Example
//!
//! ```ignore
//! use timetabler_core::AppError;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Leave request not found"));
//! ```

pub mod errors;

pub use errors::AppError;
