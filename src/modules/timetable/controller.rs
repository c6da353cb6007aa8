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

use timetabler_core::AppError;
use timetabler_models::{ConflictReport, CreateSlotDto, Schedule, ScheduleKey, Slot, SlotId};

use crate::docs::ErrorResponse;
use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::modules::subjects::service::SubjectService;
use crate::state::AppState;
use crate::validator::AppJson;

/// Get a class's weekly schedule
#[utoipa::path(
    get,
    path = "/api/timetable/{year}/{class}",
    summary = "Get schedule",
    params(
        ("year" = String, Path, description = "Academic year, e.g. 2025"),
        ("class" = String, Path, description = "Class, e.g. BE-B")
    ),
    responses(
        (status = 200, description = "Schedule with slots ordered by day and period", body = Schedule),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Timetable",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_schedule(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path((year, class)): Path<(String, String)>,
) -> Result<Json<Schedule>, AppError> {
    let key = ScheduleKey::new(year, class);
    let schedule = state
        .slot_manager
        .schedule(&key)
        .await
        .map_err(|e| e.into_app_error())?;

    Ok(Json(schedule))
}

/// Add a slot, refusing it if the teacher is already booked at that day and time
///
/// When `teacher` is omitted it is taken from the subject's reference data.
/// An explicit empty string leaves the slot unassigned.
#[utoipa::path(
    post,
    path = "/api/timetable/{year}/{class}/slots",
    summary = "Add slot",
    params(
        ("year" = String, Path, description = "Academic year"),
        ("class" = String, Path, description = "Class")
    ),
    request_body = CreateSlotDto,
    responses(
        (status = 201, description = "Slot added", body = Slot),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires the Admin role", body = ErrorResponse),
        (status = 409, description = "Teacher already booked; body carries a `conflict` object", body = ErrorResponse),
        (status = 422, description = "Missing or invalid day, time or subject", body = ErrorResponse),
        (status = 503, description = "Store unavailable, nothing written", body = ErrorResponse)
    ),
    tag = "Timetable",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn add_slot(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((year, class)): Path<(String, String)>,
    AppJson(mut dto): AppJson<CreateSlotDto>,
) -> Result<(StatusCode, Json<Slot>), AppError> {
    let teacher = match dto.teacher.take() {
        Some(teacher) => teacher,
        None => SubjectService::teacher_for(state.stores.subjects.as_ref(), &year, &dto.subject)
            .await
            .unwrap_or_default(),
    };

    let key = ScheduleKey::new(year, class);
    let slot = state
        .slot_manager
        .add_slot(&key, dto.into_candidate(teacher))
        .await
        .map_err(|e| e.into_app_error())?;

    Ok((StatusCode::CREATED, Json(slot)))
}

/// Remove a slot; removing an unknown id is a no-op
#[utoipa::path(
    delete,
    path = "/api/timetable/{year}/{class}/slots/{slot_id}",
    summary = "Remove slot",
    params(
        ("year" = String, Path, description = "Academic year"),
        ("class" = String, Path, description = "Class"),
        ("slot_id" = String, Path, description = "Slot id")
    ),
    responses(
        (status = 204, description = "Slot removed (or was not present)"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires the Admin role", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Timetable",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn remove_slot(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((year, class, slot_id)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    let key = ScheduleKey::new(year, class);
    state
        .slot_manager
        .remove_slot(&key, &SlotId::from(slot_id))
        .await
        .map_err(|e| e.into_app_error())?;

    Ok(StatusCode::NO_CONTENT)
}

/// Report teacher double bookings in a year
#[utoipa::path(
    get,
    path = "/api/timetable/{year}/conflicts",
    summary = "Audit conflicts",
    params(("year" = String, Path, description = "Academic year")),
    responses(
        (status = 200, description = "Double-booked (teacher, day, time) triples", body = Vec<ConflictReport>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires the Admin role", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Timetable",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_conflicts(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(year): Path<String>,
) -> Result<Json<Vec<ConflictReport>>, AppError> {
    let reports = state
        .slot_manager
        .audit(&year)
        .await
        .map_err(|e| e.into_app_error())?;

    Ok(Json(reports))
}

/// Stream schedule updates via Server-Sent Events
///
/// Sends the current schedule as the first `schedule` event, then one per change.
#[utoipa::path(
    get,
    path = "/api/timetable/{year}/{class}/events",
    summary = "Watch schedule",
    params(
        ("year" = String, Path, description = "Academic year"),
        ("class" = String, Path, description = "Class")
    ),
    responses(
        (status = 200, description = "text/event-stream of `schedule` events"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Timetable",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn stream_schedule(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path((year, class)): Path<(String, String)>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let key = ScheduleKey::new(year, class);
    key.validate()
        .map_err(|e| AppError::unprocessable(anyhow::anyhow!(e.to_string())))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Schedule>();
    let subscription = state
        .stores
        .schedules
        .subscribe(
            key,
            Arc::new(move |schedule: Schedule| {
                let _ = tx.send(schedule);
            }),
        )
        .await
        .map_err(|e| e.into_app_error())?;

    let manager = state.slot_manager.clone();
    let stream = async_stream::stream! {
        // Dropping the stream drops the subscription and stops delivery.
        let _subscription = subscription;
        while let Some(mut schedule) = rx.recv().await {
            manager.sort_slots(&mut schedule.slots);
            match Event::default().event("schedule").json_data(&schedule) {
                Ok(event) => yield Ok(event),
                Err(e) => warn!(error = %e, "Failed to encode schedule event"),
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
