use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

use super::controller::{add_slot, get_conflicts, get_schedule, remove_slot, stream_schedule};

/// Routes: GET /{year}/conflicts, GET /{year}/{class}, POST /{year}/{class}/slots,
/// DELETE /{year}/{class}/slots/{slot_id}, GET /{year}/{class}/events
pub fn init_timetable_router() -> Router<AppState> {
    Router::new()
        .route("/{year}/conflicts", get(get_conflicts))
        .route("/{year}/{class}", get(get_schedule))
        .route("/{year}/{class}/slots", post(add_slot))
        .route("/{year}/{class}/slots/{slot_id}", delete(remove_slot))
        .route("/{year}/{class}/events", get(stream_schedule))
}
