use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use tracing::instrument;

use timetabler_core::AppError;
use timetabler_models::{CreateSubjectDto, Subject, SubjectList, SubjectQuery};

use crate::docs::ErrorResponse;
use crate::middleware::auth::{AuthUser, RequireAdmin};
use crate::modules::subjects::service::SubjectService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List subjects for a year
///
/// Falls back to the bundled subject list when the store has no subjects for the
/// year or is unreachable; `source` says which was used.
#[utoipa::path(
    get,
    path = "/api/subjects",
    summary = "List subjects",
    params(SubjectQuery),
    responses(
        (status = 200, description = "Subjects for the year", body = SubjectList),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Missing year", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_subjects(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(query): Query<SubjectQuery>,
) -> Result<Json<SubjectList>, AppError> {
    let year = query.year.trim();
    if year.is_empty() {
        return Err(AppError::unprocessable(anyhow::anyhow!("year is required")));
    }

    Ok(Json(
        SubjectService::list_for_year(state.stores.subjects.as_ref(), year).await,
    ))
}

/// Create a subject
#[utoipa::path(
    post,
    path = "/api/subjects",
    summary = "Create subject",
    request_body = CreateSubjectDto,
    responses(
        (status = 201, description = "Subject created", body = Subject),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - requires the Admin role", body = ErrorResponse),
        (status = 422, description = "Invalid subject", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_subject(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateSubjectDto>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let subject = SubjectService::create(state.stores.subjects.as_ref(), dto)
        .await
        .map_err(|e| e.into_app_error())?;

    Ok((StatusCode::CREATED, Json(subject)))
}
