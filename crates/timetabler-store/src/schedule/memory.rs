use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

use timetabler_models::{Schedule, ScheduleKey};

use super::ScheduleStore;
use crate::error::StoreResult;
use crate::feed::ChangeFeed;

/// Process-local schedule store, keyed by document id.
#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    documents: RwLock<BTreeMap<String, Schedule>>,
    feed: ChangeFeed<Schedule>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `schedules`. Invalid documents are skipped.
    pub fn with_schedules(schedules: impl IntoIterator<Item = Schedule>) -> Self {
        let store = Self::new();
        {
            let mut documents = store.documents.write();
            for schedule in schedules {
                if schedule.validate().is_ok() {
                    documents.insert(schedule.key().document_id(), schedule);
                }
            }
        }
        store
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn get(&self, key: &ScheduleKey) -> StoreResult<Schedule> {
        Ok(self
            .documents
            .read()
            .get(&key.document_id())
            .filter(|schedule| schedule.is_keyed_by(key))
            .cloned()
            .unwrap_or_else(|| Schedule::empty_for(key)))
    }

    async fn get_all(&self, year: &str) -> StoreResult<Vec<Schedule>> {
        Ok(self
            .documents
            .read()
            .values()
            .filter(|schedule| schedule.year == year)
            .cloned()
            .collect())
    }

    async fn upsert(&self, schedule: &Schedule) -> StoreResult<()> {
        schedule.validate()?;

        let mut documents = self.documents.write();
        documents.insert(schedule.key().document_id(), schedule.clone());
        debug!(schedule = %schedule.key(), slots = schedule.slots.len(), "Schedule stored");

        // Published under the write lock so the feed order matches the store order.
        self.feed.publish(schedule.clone());
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<Schedule> {
        self.feed.receiver()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;
    use timetabler_models::{Day, Slot, SlotId};

    fn slot(id: &str) -> Slot {
        Slot {
            id: SlotId::from(id),
            day: Day::Monday,
            time: "8:45-9:45".to_string(),
            subject: "DBMS".to_string(),
            teacher: "Dr. Rao".to_string(),
            room: "101".to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_missing_is_empty_schedule() {
        let store = MemoryScheduleStore::new();
        let found = store.get(&ScheduleKey::new("2025", "BE-B")).await.unwrap();
        assert_eq!(found, Schedule::new("2025", "BE-B"));
        assert!(store.get_all("2025").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_get_all_filters_by_year() {
        let store = MemoryScheduleStore::new();
        let mut schedule = Schedule::new("2025", "BE-B");
        schedule.slots.push(slot("a"));
        store.upsert(&schedule).await.unwrap();

        schedule.slots.clear();
        store.upsert(&schedule).await.unwrap();
        store.upsert(&Schedule::new("2025", "BE-A")).await.unwrap();
        store.upsert(&Schedule::new("2024", "BE-B")).await.unwrap();

        let stored = store.get(&schedule.key()).await.unwrap();
        assert!(stored.slots.is_empty());

        let year = store.get_all("2025").await.unwrap();
        assert_eq!(year.len(), 2);
        assert!(year.iter().all(|s| s.year == "2025"));
    }

    #[tokio::test]
    async fn test_upsert_rejects_duplicate_slot_ids() {
        let store = MemoryScheduleStore::new();
        let mut schedule = Schedule::new("2025", "BE-B");
        schedule.slots.push(slot("a"));
        schedule.slots.push(slot("a"));

        let err = store.upsert(&schedule).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(store.get_all("2025").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ambiguous_keys_do_not_share_a_document() {
        let store = MemoryScheduleStore::new();

        let mut first = Schedule::new("2025_BE", "A");
        first.slots.push(slot("a"));
        let err = store.upsert(&first).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));

        let mut second = Schedule::new("2025", "BE_A");
        second.slots.push(slot("b"));
        store.upsert(&second).await.unwrap();

        let found = store.get(&ScheduleKey::new("2025_BE", "A")).await.unwrap();
        assert_eq!(found, Schedule::new("2025_BE", "A"));
        assert!(store.get_all("2025_BE").await.unwrap().is_empty());

        let found = store.get(&ScheduleKey::new("2025", "BE_A")).await.unwrap();
        assert_eq!(found, second);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_feed_order_matches_store_order() {
        let store = Arc::new(MemoryScheduleStore::new());
        let key = ScheduleKey::new("2025", "BE-B");
        let mut receiver = store.changes();

        let writers: Vec<_> = (0..8)
            .map(|n| {
                let store = store.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    let mut schedule = Schedule::empty_for(&key);
                    for i in 0..n {
                        schedule.slots.push(slot(&format!("s{i}")));
                    }
                    store.upsert(&schedule).await.unwrap();
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let mut last = None;
        while let Ok(schedule) = receiver.try_recv() {
            last = Some(schedule);
        }
        assert_eq!(last, Some(store.get(&key).await.unwrap()));
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_then_updates_for_key_only() {
        let store = MemoryScheduleStore::new();
        let key = ScheduleKey::new("2025", "BE-B");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let subscription = store
            .subscribe(
                key.clone(),
                Arc::new(move |schedule: Schedule| sink.lock().push(schedule.slots.len())),
            )
            .await
            .unwrap();

        let mut schedule = Schedule::empty_for(&key);
        schedule.slots.push(slot("a"));
        store.upsert(&schedule).await.unwrap();
        store.upsert(&Schedule::new("2025", "BE-A")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*seen.lock(), vec![0, 1]);

        drop(subscription);
        schedule.slots.push(slot("b"));
        store.upsert(&schedule).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*seen.lock(), vec![0, 1]);
    }
}
