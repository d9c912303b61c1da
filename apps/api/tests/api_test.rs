use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bookwell_api::{create_router, AppServices};
use shared_config::ConflictScope;
use shared_utils::test_utils::{TestConfig, TestUser};

async fn app(data_dir: &std::path::Path) -> Router {
    let config = TestConfig {
        data_dir: data_dir.to_path_buf(),
        ..TestConfig::default()
    }
    .to_arc();
    let services = AppServices::open(&config).await.unwrap();
    create_router(config, services)
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register_and_login(app: &Router, registration: Value) -> String {
    let username = registration["username"].as_str().unwrap().to_string();
    let response = call(app, "POST", "/auth/register", None, Some(registration)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = call(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": "secret" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_booking_to_review_flow_persists() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let provider = register_and_login(
        &app,
        json!({
            "username": "calm",
            "password": "secret",
            "confirm_password": "secret",
            "email": "calm@example.com",
            "role": "provider",
            "provider": { "business_name": "Calm Spa", "service_category": "Spa Treatment" }
        }),
    )
    .await;
    let consumer = register_and_login(
        &app,
        json!({
            "username": "ana",
            "password": "secret",
            "confirm_password": "secret",
            "email": "ana@example.com",
            "name": "Ana"
        }),
    )
    .await;

    let response = call(
        &app,
        "POST",
        "/appointments",
        Some(&consumer),
        Some(json!({
            "type": "spa",
            "date": "2024-02-01",
            "time": "14:00",
            "duration_minutes": 90,
            "provider_id": 1
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    for action in ["confirm", "complete"] {
        let response = call(&app, "POST", &format!("/appointments/1/{}", action), Some(&provider), None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = call(
        &app,
        "POST",
        "/reviews/appointments/1",
        Some(&consumer),
        Some(json!({ "rating": 5, "comment": "wonderful" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = call(&app, "GET", "/directory/providers?category=Spa%20Treatment", None, None).await;
    let body = body_json(response).await;
    assert_eq!(body[0]["average_rating"], 5.0);

    let response = call(&app, "GET", "/directory/users/1/reviews", None, None).await;
    let body = body_json(response).await;
    assert_eq!(body["reviews"][0]["reviewer_name"], "Ana");

    // A fresh process sees the same data
    let reopened = self::app(dir.path()).await;
    let response = call(&reopened, "GET", "/directory/providers/1", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_reviews"], 1);
    assert_eq!(body["reviews"][0]["appointment_type"], "Spa Treatment");
}

#[tokio::test]
async fn test_delete_account_removes_user_and_bookings() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    let consumer = register_and_login(
        &app,
        json!({
            "username": "ana",
            "password": "secret",
            "confirm_password": "secret",
            "email": "ana@example.com"
        }),
    )
    .await;

    let response = call(
        &app,
        "POST",
        "/appointments",
        Some(&consumer),
        Some(json!({ "type": "hair", "date": "2099-02-01", "time": "09:00", "duration_minutes": 30 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = call(&app, "DELETE", "/account", Some(&consumer), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["removed_appointments"], 1);

    let response = call(&app, "GET", "/auth/me", Some(&consumer), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": "ana", "password": "secret" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = call(&app, "DELETE", "/account", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_provider_conflict_scope_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let test_config = TestConfig {
        data_dir: dir.path().to_path_buf(),
        conflict_scope: ConflictScope::Provider,
        ..TestConfig::default()
    };
    let config = test_config.to_arc();
    let services = AppServices::open(&config).await.unwrap();
    let app = create_router(Arc::clone(&config), services);
    let token = register_and_login(&app, consumer_registration("ana")).await;

    let booking = |provider_id: i64| {
        json!({
            "type": "massage",
            "date": "2099-03-01",
            "time": "10:00",
            "duration_minutes": 60,
            "provider_id": provider_id
        })
    };

    let response = call(&app, "POST", "/appointments", Some(&token), Some(booking(5))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = call(&app, "POST", "/appointments", Some(&token), Some(booking(6))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = call(&app, "POST", "/appointments", Some(&token), Some(booking(5))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

fn consumer_registration(username: &str) -> Value {
    json!({
        "username": username,
        "password": "secret",
        "confirm_password": "secret",
        "email": format!("{}@example.com", username)
    })
}

#[tokio::test]
async fn test_deleted_account_token_never_reaches_a_new_account() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path()).await;

    register_and_login(&app, consumer_registration("alice")).await;
    let bob = register_and_login(&app, consumer_registration("bob")).await;

    let response = call(&app, "DELETE", "/account", Some(&bob), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let carol = register_and_login(&app, consumer_registration("carol")).await;
    let response = call(&app, "GET", "/auth/me", Some(&carol), None).await;
    assert_eq!(body_json(response).await["user"]["id"], 3);

    let response = call(&app, "GET", "/auth/me", Some(&bob), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = call(
        &app,
        "POST",
        "/appointments",
        Some(&bob),
        Some(json!({ "type": "hair", "date": "2099-02-01", "time": "09:00", "duration_minutes": 30 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleted_ids_stay_spent_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let first = app(dir.path()).await;

    register_and_login(&first, consumer_registration("alice")).await;
    let bob = register_and_login(&first, consumer_registration("bob")).await;
    call(&first, "DELETE", "/account", Some(&bob), None).await;

    let restarted = app(dir.path()).await;
    let dave = register_and_login(&restarted, consumer_registration("dave")).await;
    let response = call(&restarted, "GET", "/auth/me", Some(&dave), None).await;
    assert_eq!(body_json(response).await["user"]["id"], 3);
}

#[tokio::test]
async fn test_token_for_unknown_account_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let test_config = TestConfig {
        data_dir: dir.path().to_path_buf(),
        ..TestConfig::default()
    };
    let app = app(dir.path()).await;
    let stranger = TestUser::consumer(42, "ghost").token(&test_config);

    let response = call(&app, "GET", "/appointments/mine", Some(&stranger), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = call(&app, "GET", "/appointments/types", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
