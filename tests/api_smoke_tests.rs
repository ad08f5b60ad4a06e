//! End-to-end API tests against an in-memory database.
//!
//! Drives the full router with `tower::ServiceExt::oneshot`: call intake,
//! recommendations, the unit status/location flow, and a manual sweep.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use dispatch::config::AppConfig;
use dispatch::models::unit;
use dispatch::server::{AppState, create_app};
use http_body_util::BodyExt;
use migration::Migrator;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

async fn test_app() -> (Router, DatabaseConnection) {
    let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let state = AppState::new(AppConfig::default(), db.clone()).unwrap();
    (create_app(state), db)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn seed_unit(db: &DatabaseConnection, name: &str, status: &str, lat: f64, lon: f64) -> Uuid {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let id = Uuid::new_v4();
    unit::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        status: Set(status.to_string()),
        lat: Set(Some(lat)),
        lon: Set(Some(lon)),
        skills: Set(json!([])),
        is_supervisor: Set(false),
        current_call_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap();
    id
}

#[tokio::test]
async fn root_and_health_respond() {
    let (app, _db) = test_app().await;

    let (status, body) = get_json(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "dispatch");

    let (status, body) = get_json(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn call_intake_classifies_and_lists() {
    let (app, _db) = test_app().await;

    let (status, created) = post_json(
        &app,
        "/calls",
        json!({
            "incident_type": "Shots fired near the mall",
            "location_text": "12000 Hull Street Rd",
            "lat": 37.41,
            "lon": -77.57
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["priority"], "critical");
    assert_eq!(created["status"], "Dispatched");

    let (status, listed) = get_json(&app, "/calls?status=Dispatched").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Invalid coordinates are rejected before any write.
    let (status, body) = post_json(
        &app,
        "/calls",
        json!({
            "incident_type": "Theft",
            "location_text": "somewhere",
            "lat": 95.0,
            "lon": 0.0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, listed) = get_json(&app, "/calls").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn recommendations_rank_nearby_units() {
    let (app, db) = test_app().await;
    let near = seed_unit(&db, "Unit 1", "Available", 37.42, -77.57).await;
    seed_unit(&db, "Unit 2", "Available", 37.60, -77.40).await;
    seed_unit(&db, "Unit 3", "Off Duty", 37.42, -77.57).await;

    let (_, created) = post_json(
        &app,
        "/calls",
        json!({
            "incident_type": "Robbery in progress",
            "location_text": "12000 Hull Street Rd",
            "lat": 37.41,
            "lon": -77.57
        }),
    )
    .await;
    let call_id = created["id"].as_str().unwrap();

    let (status, body) = post_json(
        &app,
        &format!("/calls/{call_id}/recommendations"),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0]["rank"], 1);
    assert_eq!(recs[0]["unit_id"], near.to_string());
    assert!(recs[0]["eta_text"].as_str().unwrap().ends_with("min"));

    let (status, body) = post_json(
        &app,
        &format!("/calls/{}/recommendations", Uuid::new_v4()),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn primary_unit_status_drives_the_call() {
    let (app, db) = test_app().await;
    let unit_id = seed_unit(&db, "Unit 1", "Available", 37.42, -77.57).await;

    let (_, created) = post_json(
        &app,
        "/calls",
        json!({
            "incident_type": "Burglary",
            "location_text": "100 Main St",
            "lat": 37.41,
            "lon": -77.57
        }),
    )
    .await;
    let call_id = Uuid::parse_str(created["id"].as_str().unwrap()).unwrap();

    let (status, assignment) = post_json(
        &app,
        &format!("/calls/{call_id}/assignments"),
        json!({ "unit_id": unit_id }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(assignment["role"], "primary");

    let assigned = unit::Entity::find_by_id(unit_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assigned.current_call_id, Some(call_id));

    // The primary slot is taken; a second primary is a conflict.
    let rival = seed_unit(&db, "Unit 2", "Available", 37.40, -77.58).await;
    let (status, body) = post_json(
        &app,
        &format!("/calls/{call_id}/assignments"),
        json!({ "unit_id": rival }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = post_json(
        &app,
        &format!("/units/{unit_id}/status"),
        json!({ "status": "Enroute" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["call_status_updated"], true);
    assert_eq!(body["call_status"], "Enroute");

    let (_, listed) = get_json(&app, "/calls?status=Enroute").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, body) = post_json(
        &app,
        &format!("/units/{unit_id}/status"),
        json!({ "status": "Standby" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn location_updates_append_history_and_move_the_unit() {
    let (app, db) = test_app().await;
    let unit_id = seed_unit(&db, "Unit 1", "On Patrol", 37.42, -77.57).await;

    let (status, body) = post_json(
        &app,
        &format!("/units/{unit_id}/location"),
        json!({ "lat": 37.43, "lon": -77.56, "speed_mph": 28.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["geofence_events"].as_array().unwrap().len(), 0);

    let moved = unit::Entity::find_by_id(unit_id).one(&db).await.unwrap().unwrap();
    assert_eq!(moved.lat, Some(37.43));

    let (status, body) = post_json(
        &app,
        &format!("/units/{unit_id}/location"),
        json!({ "lat": 137.0, "lon": 0.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn manual_sweep_trigger_returns_a_report() {
    let (app, _db) = test_app().await;

    let (status, body) = post_json(&app, "/sweeps/auto-close", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sweep"], "auto-close");
    assert_eq!(body["count"], 0);
    assert!(body["duration_ms"].is_u64());

    let (status, body) = post_json(&app, "/sweeps/defragment", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unknown_feed_source_is_not_found() {
    let (app, _db) = test_app().await;

    let (status, body) = post_json(&app, "/feed/nowhere/refresh", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn error_responses_carry_a_trace_id() {
    let (app, _db) = test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sweeps/defragment")
                .header("x-trace-id", "test-trace-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("x-trace-id").unwrap(),
        "test-trace-42"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["trace_id"], "test-trace-42");
}
