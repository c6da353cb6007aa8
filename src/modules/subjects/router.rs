use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{create_subject, list_subjects};

/// Routes: GET /?year=, POST /
pub fn init_subjects_router() -> Router<AppState> {
    Router::new().route("/", get(list_subjects).post(create_subject))
}
