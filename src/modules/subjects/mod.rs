//! Subjects module.
//!
//! Subject reference data feeds the slot form and pre-fills a slot's teacher.

pub mod controller;
pub mod router;
pub mod service;
