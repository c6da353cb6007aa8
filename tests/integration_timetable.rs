mod common;

use axum::http::StatusCode;
use serde_json::json;

use timetabler_models::{Day, ScheduleKey};
use timetabler_store::{ScheduleStore, Stores};

use common::{
    admin_token, schedule, schedule_store, send, setup_test_app, setup_test_app_with, slot,
    student_token, teacher_token,
};

fn stores_with_rao_in_be_a() -> Stores {
    Stores {
        schedules: schedule_store(vec![schedule(
            "2025",
            "BE-A",
            vec![slot("a1", "Dr. Rao", Day::Monday, "8:45-9:45", "DBMS")],
        )]),
        ..Stores::in_memory()
    }
}

#[tokio::test]
async fn test_add_slot_returns_created_slot() {
    let (app, stores) = setup_test_app();
    let token = admin_token();

    let (status, body) = send(
        app,
        "POST",
        "/api/timetable/2025/BE-B/slots",
        Some(&token),
        Some(json!({
            "day": "Monday",
            "time": "8:45-9:45",
            "subject": "Operating Systems",
            "teacher": "Dr. Iyer",
            "room": "204"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["day"], "Monday");
    assert_eq!(body["teacher"], "Dr. Iyer");
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));

    let stored = stores
        .schedules
        .get(&ScheduleKey::new("2025", "BE-B"))
        .await
        .unwrap();
    assert_eq!(stored.slots.len(), 1);
    assert_eq!(stored.slots[0].room, "204");
}

#[tokio::test]
async fn test_add_slot_conflict_returns_409_with_details() {
    let stores = stores_with_rao_in_be_a();
    let app = setup_test_app_with(stores.clone());
    let token = admin_token();

    let (status, body) = send(
        app,
        "POST",
        "/api/timetable/2025/BE-B/slots",
        Some(&token),
        Some(json!({
            "day": "Monday",
            "time": "8:45-9:45",
            "subject": "DBMS",
            "teacher": "Dr. Rao"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "Dr. Rao is already booked on Monday at 8:45-9:45 in BE-A"
    );
    assert_eq!(body["conflict"]["class"], "BE-A");
    assert_eq!(body["conflict"]["day"], "Monday");
    assert_eq!(body["conflict"]["time"], "8:45-9:45");

    let be_b = stores
        .schedules
        .get(&ScheduleKey::new("2025", "BE-B"))
        .await
        .unwrap();
    assert!(be_b.slots.is_empty());
}

#[tokio::test]
async fn test_add_slot_missing_fields_returns_422() {
    let (app, stores) = setup_test_app();
    let token = admin_token();

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/timetable/2025/BE-B/slots",
        Some(&token),
        Some(json!({ "teacher": "Dr. Rao" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "day, time, subject are required");

    let (status, _) = send(
        app.clone(),
        "POST",
        "/api/timetable/2025/BE-B/slots",
        Some(&token),
        Some(json!({ "day": "Sunday", "time": "8:45-9:45", "subject": "DBMS" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        app,
        "POST",
        "/api/timetable/2025_BE/A/slots",
        Some(&token),
        Some(json!({ "day": "Monday", "time": "8:45-9:45", "subject": "DBMS" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(stores.schedules.get_all("2025").await.unwrap().is_empty());
    assert!(stores.schedules.get_all("2025_BE").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_slot_prefills_teacher_from_subject() {
    let (app, _) = setup_test_app();
    let token = admin_token();

    let (status, body) = send(
        app.clone(),
        "POST",
        "/api/timetable/2025/BE-B/slots",
        Some(&token),
        Some(json!({ "day": "Tuesday", "time": "9:45-10:45", "subject": "dbms" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["teacher"], "Dr. Rao");

    let (status, body) = send(
        app,
        "POST",
        "/api/timetable/2025/BE-B/slots",
        Some(&token),
        Some(json!({
            "day": "Tuesday",
            "time": "11:00-12:00",
            "subject": "DBMS",
            "teacher": ""
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["teacher"], "");
}

#[tokio::test]
async fn test_slot_writes_require_admin() {
    let (app, _) = setup_test_app();
    let body = json!({ "day": "Monday", "time": "8:45-9:45", "subject": "DBMS" });

    let (status, _) = send(app.clone(), "POST", "/api/timetable/2025/BE-B/slots", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        app.clone(),
        "POST",
        "/api/timetable/2025/BE-B/slots",
        Some("not-a-jwt"),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = teacher_token();
    let (status, _) = send(app.clone(), "POST", "/api/timetable/2025/BE-B/slots", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = student_token();
    let (status, _) = send(app, "DELETE", "/api/timetable/2025/BE-B/slots/a1", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_remove_slot_returns_no_content() {
    let stores = stores_with_rao_in_be_a();
    let app = setup_test_app_with(stores.clone());
    let token = admin_token();

    let (status, _) = send(app.clone(), "DELETE", "/api/timetable/2025/BE-A/slots/a1", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(app, "DELETE", "/api/timetable/2025/BE-A/slots/a1", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let be_a = stores
        .schedules
        .get(&ScheduleKey::new("2025", "BE-A"))
        .await
        .unwrap();
    assert!(be_a.slots.is_empty());
}

#[tokio::test]
async fn test_get_schedule_orders_slots_and_allows_any_role() {
    let stores = Stores {
        schedules: schedule_store(vec![schedule(
            "2025",
            "BE-B",
            vec![
                slot("fri", "Dr. Iyer", Day::Friday, "8:45-9:45", "OS"),
                slot("mon-2", "Dr. Rao", Day::Monday, "9:45-10:45", "DBMS"),
                slot("mon-1", "Prof. Menon", Day::Monday, "8:45-9:45", "CN"),
            ],
        )]),
        ..Stores::in_memory()
    };
    let app = setup_test_app_with(stores);
    let token = student_token();

    let (status, body) = send(app.clone(), "GET", "/api/timetable/2025/BE-B", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["year"], "2025");
    assert_eq!(body["class"], "BE-B");
    let ids: Vec<&str> = body["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["mon-1", "mon-2", "fri"]);

    let (status, body) = send(app, "GET", "/api/timetable/2025/BE-Z", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slots"], json!([]));
}

#[tokio::test]
async fn test_conflicts_endpoint_reports_double_bookings() {
    let stores = Stores {
        schedules: schedule_store(vec![
            schedule(
                "2025",
                "BE-A",
                vec![slot("a1", "Dr. Rao", Day::Monday, "8:45-9:45", "DBMS")],
            ),
            schedule(
                "2025",
                "BE-B",
                vec![
                    slot("b1", "Dr. Rao", Day::Monday, "8:45-9:45", "DBMS Lab"),
                    slot("b2", "", Day::Monday, "8:45-9:45", "Library"),
                ],
            ),
        ]),
        ..Stores::in_memory()
    };
    let app = setup_test_app_with(stores);

    let token = admin_token();
    let (status, body) = send(app.clone(), "GET", "/api/timetable/2025/conflicts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let reports = body.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["teacher"], "Dr. Rao");
    assert_eq!(reports[0]["bookings"].as_array().unwrap().len(), 2);

    let token = teacher_token();
    let (status, _) = send(app, "GET", "/api/timetable/2025/conflicts", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
