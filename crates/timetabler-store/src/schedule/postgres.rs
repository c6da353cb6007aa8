use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use tokio::sync::{Mutex, broadcast};
use tracing::instrument;

use timetabler_models::{Schedule, ScheduleKey, Slot};

use super::ScheduleStore;
use crate::error::{StoreError, StoreResult};
use crate::feed::ChangeFeed;

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    year: String,
    class_name: String,
    slots: Json<Vec<Slot>>,
}

impl From<ScheduleRow> for Schedule {
    fn from(row: ScheduleRow) -> Self {
        Schedule {
            year: row.year,
            class: row.class_name,
            slots: row.slots.0,
        }
    }
}

/// Schedules stored as JSONB documents in the `timetable` table.
///
/// Change notifications cover writes made through this instance only. Writes through
/// one instance are serialized so the feed sees them in commit order.
#[derive(Debug)]
pub struct PgScheduleStore {
    db: PgPool,
    feed: ChangeFeed<Schedule>,
    write_order: Mutex<()>,
}

impl PgScheduleStore {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            feed: ChangeFeed::default(),
            write_order: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ScheduleStore for PgScheduleStore {
    #[instrument(skip(self), fields(schedule = %key))]
    async fn get(&self, key: &ScheduleKey) -> StoreResult<Schedule> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            "SELECT year, class_name, slots FROM timetable WHERE year = $1 AND class_name = $2",
        )
        .bind(&key.year)
        .bind(&key.class)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx("get_schedule", key, e))?;

        Ok(row
            .map(Schedule::from)
            .unwrap_or_else(|| Schedule::empty_for(key)))
    }

    #[instrument(skip(self))]
    async fn get_all(&self, year: &str) -> StoreResult<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(
            "SELECT year, class_name, slots FROM timetable WHERE year = $1 ORDER BY class_name",
        )
        .bind(year)
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx("list_schedules", year, e))?;

        Ok(rows.into_iter().map(Schedule::from).collect())
    }

    #[instrument(skip(self, schedule), fields(schedule = %schedule.key()))]
    async fn upsert(&self, schedule: &Schedule) -> StoreResult<()> {
        schedule.validate()?;
        let key = schedule.key();
        let _ordered = self.write_order.lock().await;

        sqlx::query(
            r#"INSERT INTO timetable (id, year, class_name, slots, updated_at)
               VALUES ($1, $2, $3, $4, NOW())
               ON CONFLICT (id) DO UPDATE
               SET slots = EXCLUDED.slots, updated_at = NOW()"#,
        )
        .bind(key.document_id())
        .bind(&schedule.year)
        .bind(&schedule.class)
        .bind(Json(&schedule.slots))
        .execute(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx("upsert_schedule", &key, e))?;

        self.feed.publish(schedule.clone());
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<Schedule> {
        self.feed.receiver()
    }
}
