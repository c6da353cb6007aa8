//! Schedule document storage.

mod memory;
mod postgres;

pub use memory::MemoryScheduleStore;
pub use postgres::PgScheduleStore;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

use timetabler_models::{Schedule, ScheduleKey};

use crate::error::StoreResult;
use crate::feed::{Listener, Subscription};

/// Persistence for weekly schedules, one document per (year, class).
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// An empty schedule when no document exists for `key`.
    async fn get(&self, key: &ScheduleKey) -> StoreResult<Schedule>;

    /// Every schedule whose key has the given year.
    async fn get_all(&self, year: &str) -> StoreResult<Vec<Schedule>>;

    /// Replaces the whole document. Rejects documents that fail [`Schedule::validate`].
    async fn upsert(&self, schedule: &Schedule) -> StoreResult<()>;

    /// Raw feed of every schedule written through this store.
    fn changes(&self) -> broadcast::Receiver<Schedule>;

    /// Calls `listener` with the current schedule for `key` and again after each
    /// later write to that key.
    async fn subscribe(
        &self,
        key: ScheduleKey,
        listener: Listener<Schedule>,
    ) -> StoreResult<Subscription> {
        // Subscribe before reading so a write between the two is not missed.
        let receiver = self.changes();
        let current = match self.get(&key).await {
            Ok(schedule) => schedule,
            Err(err) => {
                warn!(schedule = %key, error = %err, "Initial schedule read failed");
                return Err(err);
            }
        };
        listener(current);

        let filter_key = key.clone();
        Ok(Subscription::spawn(
            receiver,
            move |schedule: &Schedule| schedule.is_keyed_by(&filter_key),
            listener,
        ))
    }
}

pub type DynScheduleStore = Arc<dyn ScheduleStore>;
