//! Leave request storage.
//!
//! Leave subscribers always receive the full request list, newest first, so an
//! admin view can replace its state wholesale on every notification.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use sqlx::PgPool;
use tokio::sync::{Mutex, broadcast};
use tracing::{instrument, warn};
use uuid::Uuid;

use timetabler_models::{Leave, LeaveId, LeaveStatus, Role};

use crate::error::{StoreError, StoreResult};
use crate::feed::{ChangeFeed, Listener, Subscription};

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn add(&self, leave: &Leave) -> StoreResult<()>;

    async fn get(&self, id: LeaveId) -> StoreResult<Leave>;

    /// All requests, newest first.
    async fn list(&self) -> StoreResult<Vec<Leave>>;

    /// Requests made by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<Leave>>;

    /// Moves a pending request to `status`. Fails with
    /// [`StoreError::Precondition`] when the request was already reviewed.
    async fn review(&self, id: LeaveId, status: LeaveStatus) -> StoreResult<Leave>;

    async fn delete(&self, id: LeaveId) -> StoreResult<()>;

    fn changes(&self) -> broadcast::Receiver<Vec<Leave>>;

    /// Calls `listener` with the current list and again after every write.
    async fn subscribe(&self, listener: Listener<Vec<Leave>>) -> StoreResult<Subscription> {
        let receiver = self.changes();
        listener(self.list().await?);
        Ok(Subscription::spawn(receiver, |_: &Vec<Leave>| true, listener))
    }
}

pub type DynLeaveStore = Arc<dyn LeaveStore>;

fn already_reviewed(leave: &Leave) -> StoreError {
    StoreError::Precondition(format!(
        "leave {} has already been {}",
        leave.id,
        leave.status.as_str().to_lowercase()
    ))
}

fn newest_first(leaves: &mut [Leave]) {
    leaves.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
}

fn sorted(leaves: &[Leave]) -> Vec<Leave> {
    let mut leaves = leaves.to_vec();
    newest_first(&mut leaves);
    leaves
}

#[derive(Debug, Default)]
pub struct MemoryLeaveStore {
    leaves: RwLock<Vec<Leave>>,
    feed: ChangeFeed<Vec<Leave>>,
}

impl MemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Vec<Leave> {
        sorted(&self.leaves.read())
    }

    /// Called with the write guard still held so the feed order matches the store order.
    fn notify(&self, leaves: &[Leave]) {
        self.feed.publish(sorted(leaves));
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn add(&self, leave: &Leave) -> StoreResult<()> {
        let mut leaves = self.leaves.write();
        leaves.push(leave.clone());
        self.notify(&leaves);
        Ok(())
    }

    async fn get(&self, id: LeaveId) -> StoreResult<Leave> {
        self.leaves
            .read()
            .iter()
            .find(|leave| leave.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("leave", id))
    }

    async fn list(&self) -> StoreResult<Vec<Leave>> {
        Ok(self.snapshot())
    }

    async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<Leave>> {
        let mut leaves: Vec<Leave> = self
            .leaves
            .read()
            .iter()
            .filter(|leave| leave.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut leaves);
        Ok(leaves)
    }

    async fn review(&self, id: LeaveId, status: LeaveStatus) -> StoreResult<Leave> {
        let mut leaves = self.leaves.write();
        let leave = leaves
            .iter_mut()
            .find(|leave| leave.id == id)
            .ok_or_else(|| StoreError::not_found("leave", id))?;
        if leave.status != LeaveStatus::Pending {
            return Err(already_reviewed(leave));
        }
        leave.status = status;
        let reviewed = leave.clone();

        self.notify(&leaves);
        Ok(reviewed)
    }

    async fn delete(&self, id: LeaveId) -> StoreResult<()> {
        let mut leaves = self.leaves.write();
        let before = leaves.len();
        leaves.retain(|leave| leave.id != id);
        if leaves.len() == before {
            return Err(StoreError::not_found("leave", id));
        }

        self.notify(&leaves);
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<Vec<Leave>> {
        self.feed.receiver()
    }
}

#[derive(sqlx::FromRow)]
struct LeaveRow {
    id: Uuid,
    user_id: String,
    name: String,
    role: String,
    reason: String,
    from_date: NaiveDate,
    to_date: NaiveDate,
    status: String,
    applied_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for Leave {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let corrupt = |message: String| StoreError::Corrupt {
            key: row.id.to_string(),
            message,
        };
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| corrupt(e.to_string()))?;
        let status = row
            .status
            .parse::<LeaveStatus>()
            .map_err(|e| corrupt(e.to_string()))?;

        Ok(Leave {
            id: LeaveId::from_uuid(row.id),
            user_id: row.user_id,
            name: row.name,
            role,
            reason: row.reason,
            from_date: row.from_date,
            to_date: row.to_date,
            status,
            applied_at: row.applied_at,
        })
    }
}

const LEAVE_COLUMNS: &str =
    "id, user_id, name, role, reason, from_date, to_date, status, applied_at";

/// Writes through one instance are serialized with their notification, so
/// subscribers never end on a list older than the last write.
#[derive(Debug)]
pub struct PgLeaveStore {
    db: PgPool,
    feed: ChangeFeed<Vec<Leave>>,
    write_order: Mutex<()>,
}

impl PgLeaveStore {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            feed: ChangeFeed::default(),
            write_order: Mutex::new(()),
        }
    }

    async fn notify(&self) {
        match self.list().await {
            Ok(leaves) => self.feed.publish(leaves),
            Err(err) => warn!(error = %err, "Could not refresh leave list for subscribers"),
        }
    }
}

#[async_trait]
impl LeaveStore for PgLeaveStore {
    #[instrument(skip(self, leave), fields(leave_id = %leave.id))]
    async fn add(&self, leave: &Leave) -> StoreResult<()> {
        let _ordered = self.write_order.lock().await;
        sqlx::query(
            r#"INSERT INTO leaves (id, user_id, name, role, reason, from_date, to_date, status, applied_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
        )
        .bind(leave.id.into_inner())
        .bind(&leave.user_id)
        .bind(&leave.name)
        .bind(leave.role.as_str())
        .bind(&leave.reason)
        .bind(leave.from_date)
        .bind(leave.to_date)
        .bind(leave.status.as_str())
        .bind(leave.applied_at)
        .execute(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx("add_leave", leave.id, e))?;

        self.notify().await;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: LeaveId) -> StoreResult<Leave> {
        let row = sqlx::query_as::<_, LeaveRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leaves WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx("get_leave", id, e))?
        .ok_or_else(|| StoreError::not_found("leave", id))?;

        Leave::try_from(row)
    }

    #[instrument(skip(self))]
    async fn list(&self) -> StoreResult<Vec<Leave>> {
        let rows = sqlx::query_as::<_, LeaveRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leaves ORDER BY applied_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx("list_leaves", "leaves", e))?;

        rows.into_iter().map(Leave::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: &str) -> StoreResult<Vec<Leave>> {
        let rows = sqlx::query_as::<_, LeaveRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leaves WHERE user_id = $1 ORDER BY applied_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx("list_user_leaves", user_id, e))?;

        rows.into_iter().map(Leave::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn review(&self, id: LeaveId, status: LeaveStatus) -> StoreResult<Leave> {
        let _ordered = self.write_order.lock().await;
        let row = sqlx::query_as::<_, LeaveRow>(&format!(
            "UPDATE leaves SET status = $2 WHERE id = $1 AND status = 'Pending' RETURNING {LEAVE_COLUMNS}"
        ))
        .bind(id.into_inner())
        .bind(status.as_str())
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::from_sqlx("review_leave", id, e))?;

        let Some(row) = row else {
            // Nothing updated: either missing or no longer pending.
            let existing = self.get(id).await?;
            return Err(already_reviewed(&existing));
        };

        let reviewed = Leave::try_from(row)?;
        self.notify().await;
        Ok(reviewed)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: LeaveId) -> StoreResult<()> {
        let _ordered = self.write_order.lock().await;
        let result = sqlx::query("DELETE FROM leaves WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.db)
            .await
            .map_err(|e| StoreError::from_sqlx("delete_leave", id, e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("leave", id));
        }

        self.notify().await;
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<Vec<Leave>> {
        self.feed.receiver()
    }
}
