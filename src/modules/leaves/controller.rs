use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio::sync::mpsc;
use tracing::{instrument, warn};
use uuid::Uuid;

use timetabler_core::AppError;
use timetabler_models::{ApplyLeaveDto, Leave, LeaveId, ReviewLeaveDto};

use crate::docs::ErrorResponse;
use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::modules::leaves::service::LeaveService;
use crate::state::AppState;
use crate::validator::{AppJson, ValidatedJson};

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/leaves",
    summary = "Apply for leave",
    request_body = ApplyLeaveDto,
    responses(
        (status = 201, description = "Leave request created as Pending", body = Leave),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Missing reason or toDate before fromDate", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn apply_leave(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ApplyLeaveDto>,
) -> Result<(StatusCode, Json<Leave>), AppError> {
    let leave = LeaveService::apply(state.stores.leaves.as_ref(), &auth_user, dto).await?;

    Ok((StatusCode::CREATED, Json(leave)))
}

/// List every leave request, newest first
#[utoipa::path(
    get,
    path = "/api/leaves",
    summary = "List leaves",
    responses(
        (status = 200, description = "All leave requests", body = Vec<Leave>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires the Admin role", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn list_leaves(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Leave>>, AppError> {
    Ok(Json(LeaveService::list_all(state.stores.leaves.as_ref()).await?))
}

/// List the caller's own leave requests
#[utoipa::path(
    get,
    path = "/api/leaves/mine",
    summary = "My leaves",
    responses(
        (status = 200, description = "Caller's leave requests, newest first", body = Vec<Leave>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn list_my_leaves(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Leave>>, AppError> {
    let leaves =
        LeaveService::list_for_user(state.stores.leaves.as_ref(), auth_user.user_id()).await?;

    Ok(Json(leaves))
}

/// Approve or reject a pending leave request
#[utoipa::path(
    patch,
    path = "/api/leaves/{id}/status",
    summary = "Review leave",
    params(("id" = Uuid, Path, description = "Leave id")),
    request_body = ReviewLeaveDto,
    responses(
        (status = 200, description = "Reviewed leave", body = Leave),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires the Admin role", body = ErrorResponse),
        (status = 404, description = "Leave not found", body = ErrorResponse),
        (status = 409, description = "Leave already reviewed", body = ErrorResponse),
        (status = 422, description = "Target status is not Approved or Rejected", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn review_leave(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<ReviewLeaveDto>,
) -> Result<Json<Leave>, AppError> {
    let leave =
        LeaveService::review(state.stores.leaves.as_ref(), LeaveId::from(id), dto.status).await?;

    Ok(Json(leave))
}

/// Delete a leave request
#[utoipa::path(
    delete,
    path = "/api/leaves/{id}",
    summary = "Delete leave",
    params(("id" = Uuid, Path, description = "Leave id")),
    responses(
        (status = 204, description = "Leave deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires the Admin role", body = ErrorResponse),
        (status = 404, description = "Leave not found", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_leave(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    LeaveService::delete(state.stores.leaves.as_ref(), LeaveId::from(id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Stream the full leave list via Server-Sent Events
#[utoipa::path(
    get,
    path = "/api/leaves/events",
    summary = "Watch leaves",
    responses(
        (status = 200, description = "text/event-stream of `leaves` events, each the full list"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires the Admin role", body = ErrorResponse)
    ),
    tag = "Leaves",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn stream_leaves(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Leave>>();
    let subscription = state
        .stores
        .leaves
        .subscribe(Arc::new(move |leaves: Vec<Leave>| {
            let _ = tx.send(leaves);
        }))
        .await
        .map_err(|e| e.into_app_error())?;

    let stream = async_stream::stream! {
        let _subscription = subscription;
        while let Some(leaves) = rx.recv().await {
            match Event::default().event("leaves").json_data(&leaves) {
                Ok(event) => yield Ok(event),
                Err(e) => warn!(error = %e, "Failed to encode leaves event"),
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
