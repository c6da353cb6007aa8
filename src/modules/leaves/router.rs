use axum::{
    Router,
    routing::{delete, get, patch},
};

use crate::state::AppState;

use super::controller::{
    apply_leave, delete_leave, list_leaves, list_my_leaves, review_leave, stream_leaves,
};

/// Routes: POST /, GET /, GET /mine, GET /events, PATCH /{id}/status, DELETE /{id}
pub fn init_leaves_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_leaves).post(apply_leave))
        .route("/mine", get(list_my_leaves))
        .route("/events", get(stream_leaves))
        .route("/{id}/status", patch(review_leave))
        .route("/{id}", delete(delete_leave))
}
