#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use timetabler::router::init_router;
use timetabler::state::AppState;
use timetabler_auth::create_access_token;
use timetabler_config::{CorsConfig, JwtConfig, TimetableConfig};
use timetabler_models::{Day, Role, Schedule, Slot, SlotId};
use timetabler_store::{MemoryScheduleStore, Stores};

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-key-at-least-32-characters-long".to_string(),
        access_token_expiry: 3600,
    }
}

pub fn test_state(stores: Stores) -> AppState {
    AppState::new(
        stores,
        test_jwt_config(),
        CorsConfig::default(),
        &TimetableConfig::default(),
    )
}

pub fn setup_test_app() -> (Router, Stores) {
    let stores = Stores::in_memory();
    (init_router(test_state(stores.clone())), stores)
}

pub fn setup_test_app_with(stores: Stores) -> Router {
    init_router(test_state(stores))
}

pub fn token(user_id: &str, name: &str, role: Role) -> String {
    create_access_token(user_id, name, role, &test_jwt_config()).unwrap()
}

pub fn admin_token() -> String {
    token("uid-admin", "Office", Role::Admin)
}

pub fn teacher_token() -> String {
    token("uid-rao", "Dr. Rao", Role::Teacher)
}

pub fn student_token() -> String {
    token("uid-asha", "Asha", Role::Student)
}

pub fn slot(id: &str, teacher: &str, day: Day, time: &str, subject: &str) -> Slot {
    Slot {
        id: SlotId::from(id),
        day,
        time: time.to_string(),
        subject: subject.to_string(),
        teacher: teacher.to_string(),
        room: "101".to_string(),
    }
}

pub fn schedule(year: &str, class: &str, slots: Vec<Slot>) -> Schedule {
    Schedule {
        year: year.to_string(),
        class: class.to_string(),
        slots,
    }
}

pub fn schedule_store(schedules: Vec<Schedule>) -> Arc<MemoryScheduleStore> {
    Arc::new(MemoryScheduleStore::with_schedules(schedules))
}

pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
