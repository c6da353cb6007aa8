//! Leaves module.
//!
//! Teachers and students apply for leave; admins review or delete requests and
//! can watch the full list live.

pub mod controller;
pub mod router;
pub mod service;
