use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use identity_cell::{identity_routes, IdentityService, IdentityState, User};
use shared_database::{InMemoryStore, SequenceMark};
use shared_utils::test_utils::{TestConfig, TestUser};

async fn app(config: &TestConfig) -> Router {
    let store = Arc::new(InMemoryStore::<User>::new());
    let identity = Arc::new(IdentityService::load(store, Arc::new(InMemoryStore::<SequenceMark>::new())).await.unwrap());
    identity_routes(IdentityState {
        config: config.to_arc(),
        identity,
    })
}

fn json_request(method: &str, uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(bearer) = bearer {
        builder = builder.header(AUTHORIZATION, bearer);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn registration(username: &str) -> Value {
    json!({
        "username": username,
        "password": "secret",
        "confirm_password": "secret",
        "email": format!("{}@example.com", username),
    })
}

#[tokio::test]
async fn test_register_then_login() {
    let config = TestConfig::default();
    let app = app(&config).await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/register", None, registration("ana")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], 1);
    assert_eq!(body["user"]["role"], "consumer");
    assert!(body["user"].get("password_hash").is_none());

    let response = app
        .oneshot(json_request(
            "POST",
            "/login",
            None,
            json!({ "username": "ana", "password": "secret" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["token"].as_str().unwrap().split('.').count() == 3);
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let config = TestConfig::default();
    let mut request = registration("ana");
    request["confirm_password"] = json!("other");

    let response = app(&config)
        .await
        .oneshot(json_request("POST", "/register", None, request))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Passwords do not match");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let config = TestConfig::default();
    let app = app(&config).await;

    app.clone()
        .oneshot(json_request("POST", "/register", None, registration("ana")))
        .await
        .unwrap();
    let response = app
        .oneshot(json_request("POST", "/register", None, registration("ANA")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let config = TestConfig::default();
    let app = app(&config).await;

    app.clone()
        .oneshot(json_request("POST", "/register", None, registration("ana")))
        .await
        .unwrap();
    let response = app
        .oneshot(json_request(
            "POST",
            "/login",
            None,
            json!({ "username": "ana", "password": "nope" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_token() {
    let config = TestConfig::default();

    let response = app(&config)
        .await
        .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_and_updates_profile() {
    let config = TestConfig::default();
    let app = app(&config).await;
    app.clone()
        .oneshot(json_request("POST", "/register", None, registration("ana")))
        .await
        .unwrap();
    let bearer = TestUser::consumer(1, "ana").bearer(&config);

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/me", Some(&bearer), json!({ "name": "Ana Lima" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/me")
                .header(AUTHORIZATION, &bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["user"]["name"], "Ana Lima");
}

#[tokio::test]
async fn test_consumer_cannot_upload_gallery_image() {
    let config = TestConfig::default();
    let bearer = TestUser::consumer(1, "ana").bearer(&config);

    let response = app(&config)
        .await
        .oneshot(json_request(
            "POST",
            "/me/gallery",
            Some(&bearer),
            json!({ "filename": "a.png", "content_base64": "AQID" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_provider_gallery_upload_and_delete() {
    let config = TestConfig::default();
    let app = app(&config).await;
    let mut request = registration("studio");
    request["role"] = json!("provider");
    request["provider"] = json!({ "business_name": "Studio", "service_category": "Spa" });
    let response = app
        .clone()
        .oneshot(json_request("POST", "/register", None, request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let bearer = TestUser::provider(1, "studio").bearer(&config);
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/me/gallery",
            Some(&bearer),
            json!({ "filename": "lobby.png", "content_base64": "not base64!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/me/gallery",
            Some(&bearer),
            json!({ "filename": "lobby.png", "content_base64": "AQID" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["image"]["id"], 1);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/me/gallery/1")
                .header(AUTHORIZATION, &bearer)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
