//! # Timetabler Models
//!
//! Domain models and DTOs for the Timetabler API.
//!
//! # Modules
//!
//! - [`timetable`]: Days, slots, schedules and slot candidates
//! - [`subjects`]: Subject reference data and the static fallback list
//! - [`leaves`]: Leave requests and their review status
//! - [`users`]: Department roles
//! - [`ids`]: Strongly-typed ids for store-generated documents
//!
//! # Example
//!
//! ```ignore
//! use timetabler_models::timetable::{Day, Schedule, ScheduleKey};
//!
//! let schedule = Schedule::new("2025", "BE-B");
//! assert!(schedule.slots.is_empty());
//! assert_eq!(schedule.key().document_id(), "2025_BE-B");
//! ```

pub mod ids;
pub mod leaves;
pub mod subjects;
pub mod timetable;
pub mod users;
pub mod validation;

pub use ids::{LeaveId, SubjectId};
pub use leaves::{ApplyLeaveDto, Leave, LeaveStatus, ReviewLeaveDto};
pub use subjects::{
    CreateSubjectDto, Subject, SubjectList, SubjectQuery, SubjectSource, SubjectType,
    fallback_subjects,
};
pub use timetable::{
    Booking, ConflictReport, CreateSlotDto, Day, Schedule, ScheduleError, ScheduleKey, Slot,
    SlotCandidate, SlotId,
};
pub use users::Role;
