mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{admin_token, send, setup_test_app, student_token, teacher_token};

async fn apply(app: &axum::Router, token: &str, reason: &str) -> Value {
    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/leaves",
        Some(token),
        Some(json!({ "reason": reason, "fromDate": "2025-03-10", "toDate": "2025-03-12" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup_test_app();

    let (status, body) = send(app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_apply_leave_records_caller_as_pending() {
    let (app, _) = setup_test_app();

    let leave = apply(&app, &teacher_token(), "Conference").await;
    assert_eq!(leave["status"], "Pending");
    assert_eq!(leave["userId"], "uid-rao");
    assert_eq!(leave["name"], "Dr. Rao");
    assert_eq!(leave["role"], "Teacher");
    assert_eq!(leave["fromDate"], "2025-03-10");
}

#[tokio::test]
async fn test_apply_leave_validation() {
    let (app, _) = setup_test_app();
    let token = student_token();

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/leaves",
        Some(&token),
        Some(json!({ "reason": "Travel", "fromDate": "2025-03-12", "toDate": "2025-03-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("toDate"));

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/leaves",
        Some(&token),
        Some(json!({ "reason": " ", "fromDate": "2025-03-10", "toDate": "2025-03-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "reason is required");

    let (status, _) = send(
        app,
        "POST",
        "/api/leaves",
        None,
        Some(json!({ "reason": "Travel", "fromDate": "2025-03-10", "toDate": "2025-03-10" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_leaves_by_audience() {
    let (app, _) = setup_test_app();
    let teacher = teacher_token();
    let student = student_token();
    let admin = admin_token();

    apply(&app, &teacher, "Conference").await;
    apply(&app, &student, "Family function").await;

    let (status, body) = send(app.clone(), "GET", "/api/leaves/mine", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::OK);
    let mine = body.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["reason"], "Conference");

    let (status, body) = send(app.clone(), "GET", "/api/leaves", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let all = body.as_array().unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|leave| leave["reason"] == "Family function"));

    let (status, _) = send(app, "GET", "/api/leaves", Some(&teacher), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_review_leave_once() {
    let (app, _) = setup_test_app();
    let admin = admin_token();

    let leave = apply(&app, &student_token(), "Sick").await;
    let uri = format!("/api/leaves/{}/status", leave["id"].as_str().unwrap());

    let (status, body) = send(app.clone(), "PATCH", &uri, Some(&admin), Some(json!({ "status": "Approved" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Approved");

    let (status, _) = send(app.clone(), "PATCH", &uri, Some(&admin), Some(json!({ "status": "Rejected" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(app.clone(), "PATCH", &uri, Some(&admin), Some(json!({ "status": "Pending" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(app.clone(), "PATCH", &uri, Some(&admin), Some(json!({ "status": "Cancelled" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(app, "PATCH", &uri, Some(&teacher_token()), Some(json!({ "status": "Approved" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_review_unknown_leave_returns_404() {
    let (app, _) = setup_test_app();

    let uri = format!("/api/leaves/{}/status", uuid::Uuid::now_v7());
    let (status, _) = send(app, "PATCH", &uri, Some(&admin_token()), Some(json!({ "status": "Approved" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_leave() {
    let (app, _) = setup_test_app();
    let admin = admin_token();

    let leave = apply(&app, &teacher_token(), "Workshop").await;
    let uri = format!("/api/leaves/{}", leave["id"].as_str().unwrap());

    let (status, _) = send(app.clone(), "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(app.clone(), "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(app, "GET", "/api/leaves", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
