use tracing::{info, instrument};

use timetabler_core::AppError;
use timetabler_models::{ApplyLeaveDto, Leave, LeaveId, LeaveStatus};
use timetabler_observability::{track_leave_applied, track_leave_reviewed};
use timetabler_store::LeaveStore;

use crate::middleware::auth::AuthUser;

pub struct LeaveService;

impl LeaveService {
    #[instrument(skip(store, user, dto), fields(user_id = %user.user_id()))]
    pub async fn apply(
        store: &dyn LeaveStore,
        user: &AuthUser,
        dto: ApplyLeaveDto,
    ) -> Result<Leave, AppError> {
        let leave = Leave::pending(
            user.user_id().to_string(),
            user.name().to_string(),
            user.role(),
            dto,
        );
        store.add(&leave).await.map_err(|e| e.into_app_error())?;

        info!(leave_id = %leave.id, "Leave requested");
        track_leave_applied(leave.role.as_str());
        Ok(leave)
    }

    pub async fn list_all(store: &dyn LeaveStore) -> Result<Vec<Leave>, AppError> {
        store.list().await.map_err(|e| e.into_app_error())
    }

    pub async fn list_for_user(store: &dyn LeaveStore, user_id: &str) -> Result<Vec<Leave>, AppError> {
        store
            .list_for_user(user_id)
            .await
            .map_err(|e| e.into_app_error())
    }

    /// Approves or rejects a pending request.
    #[instrument(skip(store))]
    pub async fn review(
        store: &dyn LeaveStore,
        id: LeaveId,
        status: LeaveStatus,
    ) -> Result<Leave, AppError> {
        if status == LeaveStatus::Pending {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "status must be Approved or Rejected"
            )));
        }

        let leave = store
            .review(id, status)
            .await
            .map_err(|e| e.into_app_error())?;

        info!(leave_id = %leave.id, status = %leave.status, "Leave reviewed");
        track_leave_reviewed(leave.status.as_str());
        Ok(leave)
    }

    #[instrument(skip(store))]
    pub async fn delete(store: &dyn LeaveStore, id: LeaveId) -> Result<(), AppError> {
        store.delete(id).await.map_err(|e| e.into_app_error())?;
        info!(leave_id = %id, "Leave deleted");
        Ok(())
    }
}
