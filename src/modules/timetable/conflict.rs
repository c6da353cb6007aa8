//! Teacher double-booking detection over a year's schedules.

use std::collections::BTreeMap;

use timetabler_models::{Booking, ConflictReport, Day, Schedule, Slot};

/// First slot in `schedules` that books `teacher` at `day`/`time`.
///
/// Slots in the target class count too. An unassigned teacher never clashes.
pub fn find_clash<'a>(
    schedules: &'a [Schedule],
    teacher: &str,
    day: Day,
    time: &str,
) -> Option<(&'a Schedule, &'a Slot)> {
    if teacher.trim().is_empty() {
        return None;
    }

    schedules.iter().find_map(|schedule| {
        schedule
            .slots
            .iter()
            .find(|slot| slot.teacher == teacher && slot.day == day && slot.time == time)
            .map(|slot| (schedule, slot))
    })
}

/// Every (teacher, day, time) booked more than once, ordered by teacher, day, time.
pub fn audit(schedules: &[Schedule]) -> Vec<ConflictReport> {
    let mut bookings: BTreeMap<(&str, Day, &str), Vec<Booking>> = BTreeMap::new();

    for schedule in schedules {
        for slot in schedule.slots.iter().filter(|slot| !slot.is_unassigned()) {
            bookings
                .entry((slot.teacher.as_str(), slot.day, slot.time.as_str()))
                .or_default()
                .push(Booking {
                    class: schedule.class.clone(),
                    slot_id: slot.id.clone(),
                    subject: slot.subject.clone(),
                });
        }
    }

    bookings
        .into_iter()
        .filter(|(_, bookings)| bookings.len() > 1)
        .map(|((teacher, day, time), bookings)| ConflictReport {
            teacher: teacher.to_string(),
            day,
            time: time.to_string(),
            bookings,
        })
        .collect()
}
