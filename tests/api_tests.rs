// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local JSON API tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without a session
//! 2. The register/login/workout flow works over HTTP
//! 3. Facade failures map to the documented status codes
//! 4. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_ana(app: &Router) {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        Some(json!({"email": "a@x.com", "password": "secret1", "username": "Ana"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
}

#[tokio::test]
async fn test_protected_routes_without_session() {
    let (app, _) = common::create_test_app();

    for (method, uri) in [
        ("GET", "/api/state"),
        ("POST", "/api/workouts"),
        ("DELETE", "/api/workouts/w1"),
        ("POST", "/api/location/capture"),
        ("POST", "/api/premium"),
        ("DELETE", "/api/messages"),
    ] {
        let (status, _) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_public_route_no_session_required() {
    let (app, _) = common::create_test_app();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_and_add_workout_over_http() {
    let (app, _) = common::create_test_app();
    register_ana(&app).await;

    let (status, body) = send(&app, "GET", "/api/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], "dashboard");
    assert_eq!(body["user"]["username"], "Ana");
    assert_eq!(body["user"]["isPremium"], false);

    let (status, body) = send(
        &app,
        "POST",
        "/api/workouts",
        Some(json!({"name": "Run", "type": "Cardio", "duration": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["state"]["workouts"][0]["id"], id.as_str());
    assert_eq!(body["state"]["workouts"][0]["type"], "Cardio");
    assert_eq!(body["state"]["workoutIcons"][0], "🏃");

    let (status, body) = send(&app, "DELETE", &format!("/api/workouts/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workouts"], json!([]));
}

#[tokio::test]
async fn test_login_wrong_password_is_bad_request() {
    let (app, _) = common::create_test_app();
    register_ana(&app).await;
    send(&app, "POST", "/auth/logout", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        Some(json!({"email": "a@x.com", "password": "wrong!!"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "auth_error");
    assert_eq!(body["details"], "Incorrect password.");

    let (status, _) = send(&app, "GET", "/api/state", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_invalid_workout_is_bad_request() {
    let (app, _) = common::create_test_app();
    register_ana(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/workouts",
        Some(json!({"name": "", "type": "Cardio", "duration": 30})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "Please enter a workout name.");
}

#[tokio::test]
async fn test_capture_and_save_location_over_http() {
    let (app, _) = common::create_test_app();
    register_ana(&app).await;

    let (status, body) = send(&app, "POST", "/api/location/capture", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latitude"], common::TEST_FIX.latitude);

    let (status, body) = send(&app, "POST", "/api/locations", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["state"]["locations"][0]["accuracy"], common::TEST_FIX.accuracy);
    assert!(body["state"]["currentLocation"].is_null());
}

#[tokio::test]
async fn test_profile_premium_and_navigation() {
    let (app, _) = common::create_test_app();
    register_ana(&app).await;

    let (status, body) = send(&app, "PUT", "/api/profile", Some(json!({"username": "Ana B"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "Ana B");

    let (status, body) = send(&app, "POST", "/api/premium", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isPremium"], true);
    assert_eq!(body["messages"]["premiumSuccess"], "Welcome to Premium!");

    let (status, body) = send(&app, "POST", "/api/page", Some(json!({"page": "locations"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], "locations");
    assert!(body["messages"]["premiumSuccess"].is_null());
}

#[tokio::test]
async fn test_user_routes_follow_session_switch() {
    let (app, _) = common::create_test_app();
    register_ana(&app).await;
    send(&app, "POST", "/auth/logout", None).await;

    let (status, _) = send(&app, "PUT", "/api/profile", Some(json!({"username": "X"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/register",
        Some(json!({"email": "b@x.com", "password": "secret1", "username": "Bo"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "PUT", "/api/profile", Some(json!({"username": "Bo B"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "Bo B");

    let (status, _) = send(&app, "POST", "/api/location/capture", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, "DELETE", "/api/locations/missing", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locations"], json!([]));
}

#[tokio::test]
async fn test_cors_preflight() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/state")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // OPTIONS should return 200 (CORS preflight success)
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
