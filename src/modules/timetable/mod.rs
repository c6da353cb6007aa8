//! Timetable module.
//!
//! Weekly schedules per (year, class) and the conflict-checked slot editing that
//! keeps a teacher from being booked twice at the same day and period.

pub mod conflict;
pub mod controller;
pub mod router;
pub mod service;
