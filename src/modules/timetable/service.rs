//! Conflict-aware slot editing.
//!
//! Adding a slot reads every schedule of the year, refuses the slot if its teacher
//! is already booked at that day and period anywhere, and otherwise writes the
//! target schedule back with the slot appended.
//!
//! With [`CommitPolicy::BestEffort`] the read and the write are not atomic: two
//! concurrent adds for the same teacher can both pass the scan. [`SlotManager::audit`]
//! finds double bookings left behind that way. [`CommitPolicy::Serialized`] closes
//! the window within one process by holding a per-year lock from scan to commit.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};

use timetabler_config::{CommitPolicy, TimetableConfig};
use timetabler_core::AppError;
use timetabler_models::{
    ConflictReport, Day, Schedule, ScheduleError, ScheduleKey, Slot, SlotCandidate, SlotId,
};
use timetabler_observability::{track_slot_added, track_slot_conflict, track_slot_removed};
use timetabler_store::{DynScheduleStore, StoreError};

use super::conflict;

#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("{0}")]
    Validation(String),

    #[error("{teacher} is already booked on {day} at {time} in {class}")]
    Conflict {
        teacher: String,
        day: Day,
        time: String,
        class: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SlotError {
    fn validation(message: impl Into<String>) -> Self {
        SlotError::Validation(message.into())
    }

    pub fn into_app_error(self) -> AppError {
        let message = self.to_string();
        match self {
            SlotError::Validation(_) => AppError::unprocessable(anyhow::anyhow!(message)),
            SlotError::Conflict {
                teacher,
                day,
                time,
                class,
            } => AppError::conflict(anyhow::anyhow!(message)).with_detail(
                "conflict",
                json!({
                    "teacher": teacher,
                    "day": day,
                    "time": time,
                    "class": class,
                }),
            ),
            SlotError::Store(err) => err.into_app_error(),
        }
    }
}

pub struct SlotManager {
    store: DynScheduleStore,
    periods: Vec<String>,
    policy: CommitPolicy,
    year_locks: YearLocks,
}

impl fmt::Debug for SlotManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotManager")
            .field("periods", &self.periods)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SlotManager {
    pub fn new(store: DynScheduleStore, config: &TimetableConfig) -> Self {
        Self {
            store,
            periods: config.periods.clone(),
            policy: config.commit_policy,
            year_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    /// Adds `candidate` to the schedule at `key` unless its teacher is already booked.
    #[instrument(skip(self, candidate), fields(schedule = %key))]
    pub async fn add_slot(&self, key: &ScheduleKey, candidate: SlotCandidate) -> Result<Slot, SlotError> {
        validate_key(key)?;
        let slot = self.build_slot(candidate)?;

        let _guard = self.year_guard(&key.year).await;

        let year_schedules = self.store.get_all(&key.year).await?;

        if let Some((owner, existing)) =
            conflict::find_clash(&year_schedules, &slot.teacher, slot.day, &slot.time)
        {
            warn!(
                teacher = %slot.teacher,
                day = %slot.day,
                time = %slot.time,
                booked_in = %owner.class,
                booked_slot = %existing.id,
                "Slot rejected: teacher already booked"
            );
            track_slot_conflict(&key.year);
            return Err(SlotError::Conflict {
                teacher: slot.teacher,
                day: slot.day,
                time: slot.time,
                class: owner.class.clone(),
            });
        }

        let mut schedule = year_schedules
            .into_iter()
            .find(|schedule| schedule.is_keyed_by(key))
            .unwrap_or_else(|| Schedule::empty_for(key));
        schedule.slots.push(slot.clone());

        self.store.upsert(&schedule).await?;

        info!(slot_id = %slot.id, teacher = %slot.teacher, day = %slot.day, time = %slot.time, "Slot added");
        track_slot_added(&key.year);
        Ok(slot)
    }

    /// Removes the slot with `slot_id`. Returns whether anything was removed;
    /// removing an unknown id still succeeds.
    #[instrument(skip(self), fields(schedule = %key))]
    pub async fn remove_slot(&self, key: &ScheduleKey, slot_id: &SlotId) -> Result<bool, SlotError> {
        validate_key(key)?;

        let _guard = self.year_guard(&key.year).await;

        let mut schedule = self.store.get(key).await?;
        let before = schedule.slots.len();
        schedule.slots.retain(|slot| &slot.id != slot_id);
        let removed = schedule.slots.len() != before;

        self.store.upsert(&schedule).await?;

        if removed {
            info!(slot_id = %slot_id, "Slot removed");
            track_slot_removed(&key.year);
        }
        Ok(removed)
    }

    /// Slots at `key` in weekly order: by day, then by period.
    pub async fn list_slots(&self, key: &ScheduleKey) -> Result<Vec<Slot>, SlotError> {
        Ok(self.schedule(key).await?.slots)
    }

    /// The schedule document at `key` with its slots in weekly order.
    #[instrument(skip(self), fields(schedule = %key))]
    pub async fn schedule(&self, key: &ScheduleKey) -> Result<Schedule, SlotError> {
        validate_key(key)?;

        let mut schedule = self.store.get(key).await?;
        self.sort_slots(&mut schedule.slots);
        Ok(schedule)
    }

    /// Double bookings currently stored for `year`.
    #[instrument(skip(self))]
    pub async fn audit(&self, year: &str) -> Result<Vec<ConflictReport>, SlotError> {
        if year.trim().is_empty() {
            return Err(SlotError::validation("year is required"));
        }

        let schedules = self.store.get_all(year).await?;
        let reports = conflict::audit(&schedules);
        if !reports.is_empty() {
            warn!(year, conflicts = reports.len(), "Timetable has double bookings");
        }
        Ok(reports)
    }

    /// Stable sort by day, then by position in the period list; unknown periods last.
    pub fn sort_slots(&self, slots: &mut [Slot]) {
        slots.sort_by_key(|slot| (slot.day, self.period_index(&slot.time)));
    }

    fn period_index(&self, time: &str) -> usize {
        self.periods
            .iter()
            .position(|period| period == time)
            .unwrap_or(self.periods.len())
    }

    fn build_slot(&self, candidate: SlotCandidate) -> Result<Slot, SlotError> {
        let mut missing = Vec::new();
        if candidate.day.trim().is_empty() {
            missing.push("day");
        }
        if candidate.time.trim().is_empty() {
            missing.push("time");
        }
        if candidate.subject.trim().is_empty() {
            missing.push("subject");
        }
        if !missing.is_empty() {
            return Err(SlotError::validation(format!(
                "{} required",
                match missing.as_slice() {
                    [one] => format!("{one} is"),
                    many => format!("{} are", many.join(", ")),
                }
            )));
        }

        let day: Day = candidate
            .day
            .parse()
            .map_err(|e| SlotError::validation(format!("{e}")))?;

        let time = candidate.time.trim();
        if !self.periods.iter().any(|period| period == time) {
            return Err(SlotError::validation(format!(
                "time must be one of {} (got {:?})",
                self.periods.join(", "),
                candidate.time
            )));
        }

        Ok(Slot {
            id: SlotId::generate(),
            day,
            time: time.to_string(),
            subject: candidate.subject.trim().to_string(),
            teacher: candidate.teacher.trim().to_string(),
            room: candidate.room.trim().to_string(),
        })
    }

    async fn year_guard(&self, year: &str) -> Option<YearGuard<'_>> {
        if self.policy != CommitPolicy::Serialized {
            return None;
        }

        let lock = self
            .year_locks
            .lock()
            .entry(year.to_string())
            .or_default()
            .clone();
        Some(YearGuard {
            locks: &self.year_locks,
            year: year.to_string(),
            guard: Some(lock.lock_owned().await),
        })
    }
}

type YearLocks = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// Holds a year's commit lock. On release the map entry is dropped unless
/// another caller holds or waits on it.
struct YearGuard<'a> {
    locks: &'a YearLocks,
    year: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for YearGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self.locks.lock();
        if locks
            .get(&self.year)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.year);
        }
    }
}

fn validate_key(key: &ScheduleKey) -> Result<(), SlotError> {
    key.validate().map_err(|err| match err {
        ScheduleError::IncompleteKey => SlotError::validation("year and class are required"),
        other => SlotError::validation(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use timetabler_store::MemoryScheduleStore;

    fn manager() -> SlotManager {
        SlotManager::new(Arc::new(MemoryScheduleStore::new()), &TimetableConfig::default())
    }

    fn candidate(day: &str, time: &str, subject: &str, teacher: &str) -> SlotCandidate {
        SlotCandidate {
            day: day.to_string(),
            time: time.to_string(),
            subject: subject.to_string(),
            teacher: teacher.to_string(),
            room: "101".to_string(),
        }
    }

    #[test]
    fn test_build_slot_canonicalises_fields() {
        let slot = manager()
            .build_slot(candidate(" monday ", "8:45-9:45", " DBMS ", " Dr. Rao "))
            .unwrap();
        assert_eq!(slot.day, Day::Monday);
        assert_eq!(slot.subject, "DBMS");
        assert_eq!(slot.teacher, "Dr. Rao");
    }

    #[test]
    fn test_build_slot_reports_missing_fields() {
        let err = manager().build_slot(candidate("", "", "DBMS", "")).unwrap_err();
        assert_eq!(err.to_string(), "day, time are required");

        let err = manager().build_slot(candidate("Monday", "8:45-9:45", " ", "")).unwrap_err();
        assert_eq!(err.to_string(), "subject is required");
    }

    #[test]
    fn test_build_slot_rejects_unknown_day_and_period() {
        assert!(matches!(
            manager().build_slot(candidate("Saturday", "8:45-9:45", "DBMS", "")),
            Err(SlotError::Validation(_))
        ));
        assert!(matches!(
            manager().build_slot(candidate("Monday", "7:00-8:00", "DBMS", "")),
            Err(SlotError::Validation(_))
        ));
    }

    #[test]
    fn test_sort_slots_by_day_then_period() {
        let manager = manager();
        let mut slots: Vec<Slot> = [
            ("1", Day::Friday, "8:45-9:45"),
            ("2", Day::Monday, "2:00-3:00"),
            ("3", Day::Monday, "8:45-9:45"),
            ("4", Day::Monday, "custom"),
            ("5", Day::Wednesday, "11:00-12:00"),
        ]
        .into_iter()
        .map(|(id, day, time)| Slot {
            id: SlotId::from(id),
            day,
            time: time.to_string(),
            subject: "X".to_string(),
            teacher: String::new(),
            room: String::new(),
        })
        .collect();

        manager.sort_slots(&mut slots);
        let ids: Vec<&str> = slots.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "4", "5", "1"]);
    }

    #[test]
    fn test_conflict_into_app_error_carries_details() {
        let err = SlotError::Conflict {
            teacher: "Dr. Rao".to_string(),
            day: Day::Monday,
            time: "8:45-9:45".to_string(),
            class: "BE-A".to_string(),
        }
        .into_app_error();

        assert_eq!(err.status.as_u16(), 409);
        let detail = &err.details.unwrap()["conflict"];
        assert_eq!(detail["teacher"], "Dr. Rao");
        assert_eq!(detail["day"], "Monday");
        assert_eq!(detail["class"], "BE-A");
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            SlotError::validation("day is required").into_app_error().status.as_u16(),
            422
        );
        let store = SlotError::from(StoreError::unavailable("get_all_schedules", "timeout"));
        assert_eq!(store.into_app_error().status.as_u16(), 503);
    }

    #[tokio::test]
    async fn test_serialized_policy_uses_one_lock_per_year() {
        let manager = SlotManager::new(
            Arc::new(MemoryScheduleStore::new()),
            &TimetableConfig::default().with_commit_policy(CommitPolicy::Serialized),
        );

        let guard = manager.year_guard("2025").await;
        assert!(guard.is_some());
        assert!(manager.year_guard("2024").await.is_some());

        let lock = manager.year_locks.lock().get("2025").cloned().unwrap();
        assert!(lock.try_lock().is_err());
        drop(guard);
        assert!(lock.try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_year_lock_entry_is_dropped_when_released() {
        let manager = Arc::new(SlotManager::new(
            Arc::new(MemoryScheduleStore::new()),
            &TimetableConfig::default().with_commit_policy(CommitPolicy::Serialized),
        ));

        for year in ["2023", "2024", "2025"] {
            drop(manager.year_guard(year).await);
        }
        assert!(manager.year_locks.lock().is_empty());

        // Held by the map and by `first`; the waiter makes three.
        let first = manager.year_guard("2025").await;
        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move {
                let _second = manager.year_guard("2025").await;
            })
        };
        while Arc::strong_count(manager.year_locks.lock().get("2025").unwrap()) < 3 {
            tokio::task::yield_now().await;
        }

        drop(first);
        assert!(manager.year_locks.lock().contains_key("2025"));

        waiter.await.unwrap();
        assert!(manager.year_locks.lock().is_empty());
    }

    #[test]
    fn test_validate_key_rejects_separator_in_year() {
        let err = validate_key(&ScheduleKey::new("2025_BE", "A")).unwrap_err();
        assert!(matches!(err, SlotError::Validation(_)));
        assert_eq!(
            validate_key(&ScheduleKey::new("2025", " ")).unwrap_err().to_string(),
            "year and class are required"
        );
        assert!(validate_key(&ScheduleKey::new("2025", "BE_A")).is_ok());
    }

    #[tokio::test]
    async fn test_best_effort_policy_takes_no_lock() {
        assert!(manager().year_guard("2025").await.is_none());
    }
}
