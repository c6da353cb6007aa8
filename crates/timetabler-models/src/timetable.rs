//! Timetable domain models.
//!
//! A [`Schedule`] is the weekly slot list of one (year, class) pair. It is persisted
//! as a single document keyed by `"<year>_<class>"` with the shape
//! `{ year, class, slots: Slot[] }`. Slot order inside the document is insertion
//! order; viewers re-sort by [`Day`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Teaching day. Declaration order is calendar order, so `Ord` sorts a week correctly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("day must be one of Monday, Tuesday, Wednesday, Thursday, Friday (got {0:?})")]
pub struct UnknownDay(pub String);

impl FromStr for Day {
    type Err = UnknownDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownDay(s.to_string()))
    }
}

/// Slot identifier, unique within its owning schedule only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct SlotId(pub String);

impl SlotId {
    /// Time-ordered token; two slots created in the same millisecond still differ.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SlotId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SlotId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One scheduled class occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Slot {
    pub id: SlotId,
    pub day: Day,
    /// Period label such as `"8:45-9:45"`. Compared by equality only.
    pub time: String,
    pub subject: String,
    /// Empty when the slot has no teacher assigned yet.
    #[serde(default)]
    pub teacher: String,
    #[serde(default)]
    pub room: String,
}

impl Slot {
    pub fn is_unassigned(&self) -> bool {
        self.teacher.trim().is_empty()
    }
}

/// Composite schedule key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScheduleKey {
    pub year: String,
    pub class: String,
}

impl ScheduleKey {
    pub fn new(year: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            class: class.into(),
        }
    }

    /// Document id in the `timetable` collection.
    ///
    /// Only unambiguous for keys that pass [`ScheduleKey::validate`]: the first `_`
    /// must be the separator.
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.year, self.class)
    }

    pub fn is_complete(&self) -> bool {
        !self.year.trim().is_empty() && !self.class.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        if !self.is_complete() {
            return Err(ScheduleError::IncompleteKey);
        }
        if self.year.contains(DOCUMENT_ID_SEPARATOR) {
            return Err(ScheduleError::SeparatorInYear(self.year.clone()));
        }
        Ok(())
    }
}

const DOCUMENT_ID_SEPARATOR: char = '_';

impl fmt::Display for ScheduleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("schedule year and class must not be empty")]
    IncompleteKey,
    #[error("year must not contain '_' (got {0:?})")]
    SeparatorInYear(String),
    #[error("duplicate slot id {0} in schedule")]
    DuplicateSlotId(SlotId),
}

/// Weekly slot list for one (year, class) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Schedule {
    pub year: String,
    pub class: String,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl Schedule {
    pub fn new(year: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            class: class.into(),
            slots: Vec::new(),
        }
    }

    pub fn empty_for(key: &ScheduleKey) -> Self {
        Self::new(key.year.clone(), key.class.clone())
    }

    pub fn key(&self) -> ScheduleKey {
        ScheduleKey::new(self.year.clone(), self.class.clone())
    }

    pub fn is_keyed_by(&self, key: &ScheduleKey) -> bool {
        self.year == key.year && self.class == key.class
    }

    /// Checked by every store adapter before a write.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        self.key().validate()?;

        let mut seen = HashSet::with_capacity(self.slots.len());
        for slot in &self.slots {
            if !seen.insert(&slot.id) {
                return Err(ScheduleError::DuplicateSlotId(slot.id.clone()));
            }
        }

        Ok(())
    }
}

/// Slot fields as entered by an admin, before validation and id assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotCandidate {
    pub day: String,
    pub time: String,
    pub subject: String,
    pub teacher: String,
    pub room: String,
}

/// Request body for adding a slot.
///
/// Omitting `teacher` lets the service pre-fill it from the subject's reference data;
/// an explicit empty string keeps the slot unassigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateSlotDto {
    #[serde(default)]
    #[schema(example = "Monday")]
    pub day: String,
    #[serde(default)]
    #[schema(example = "8:45-9:45")]
    pub time: String,
    #[serde(default)]
    #[schema(example = "DBMS")]
    pub subject: String,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub room: String,
}

impl CreateSlotDto {
    pub fn into_candidate(self, teacher: String) -> SlotCandidate {
        SlotCandidate {
            day: self.day,
            time: self.time,
            subject: self.subject,
            teacher,
            room: self.room,
        }
    }
}

/// One occupied placement of a doubly-booked teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Booking {
    pub class: String,
    pub slot_id: SlotId,
    pub subject: String,
}

/// A (teacher, day, time) triple booked more than once within a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConflictReport {
    pub teacher: String,
    pub day: Day,
    pub time: String,
    pub bookings: Vec<Booking>,
}
