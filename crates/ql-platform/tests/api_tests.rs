//! Platform API Integration Tests
//!
//! Drives the full router over the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ql_platform::auth::{Argon2Config, AuthConfig, AuthService, PasswordPolicy, PasswordService};
use ql_platform::store::MemoryStore;
use ql_platform::{platform_router, Platform, Stores};

fn app() -> Router {
    let passwords = PasswordService::new(Argon2Config::testing(), PasswordPolicy::lenient())
        .expect("test argon2 params");
    let auth = AuthService::new(AuthConfig {
        secret_key: "api-test-secret-0123456789abcdef".to_string(),
        ..AuthConfig::default()
    });
    let stores = Stores::from_store(Arc::new(MemoryStore::new()));
    let platform = Platform::from_services(stores, Arc::new(passwords), Arc::new(auth));
    platform_router(&platform)
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, username: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/v1/users",
        None,
        Some(json!({
            "name": "Alice Example",
            "username": username,
            "password": "correct horse"
        })),
    )
    .await
}

async fn token_for(app: &Router, username: &str) -> String {
    let (status, body) = register(app, username).await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["token"].as_str().unwrap().to_string()
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_ping() {
        let (status, body) = send(&app(), Method::GET, "/ping", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "pong" }));
    }

    #[tokio::test]
    async fn test_healthz() {
        let (status, body) = send(&app(), Method::GET, "/internal/healthz", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let (status, body) = send(&app(), Method::GET, "/q/openapi", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/v1/blogs"].is_object());
        assert!(body["paths"]["/api/v1/users/me"]["patch"].is_object());
        assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
    }
}

mod user_tests {
    use super::*;

    #[tokio::test]
    async fn test_register_returns_user_and_token() {
        let app = app();
        let (status, body) = register(&app, "alice").await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["username"], "alice");
        assert_eq!(body["data"]["name"], "Alice Example");
        assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert!(body["data"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let app = app();
        register(&app, "alice").await;

        let (status, body) = register(&app, "alice").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "USERNAME_EXISTS");
    }

    #[tokio::test]
    async fn test_invalid_username_is_rejected() {
        let (status, body) = register(&app(), "a b").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "USERNAME_INVALID");
    }

    #[tokio::test]
    async fn test_internal_registration() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/internal/users",
            None,
            Some(json!({ "name": "Bob", "username": "bob", "password": "correct horse" })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["username"], "bob");
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let (status, body) = send(&app(), Method::GET, "/api/v1/users/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_me_returns_profile() {
        let app = app();
        let token = token_for(&app, "alice").await;

        let (status, body) = send(&app, Method::GET, "/api/v1/users/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
    }

    #[tokio::test]
    async fn test_update_me_changes_name() {
        let app = app();
        let token = token_for(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::PATCH,
            "/api/v1/users/me",
            Some(&token),
            Some(json!({ "name": "Alice Renamed" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Alice Renamed");
        assert_eq!(body["username"], "alice");
    }

    #[tokio::test]
    async fn test_update_me_without_fields_is_rejected() {
        let app = app();
        let token = token_for(&app, "alice").await;

        let (status, body) =
            send(&app, Method::PATCH, "/api/v1/users/me", Some(&token), Some(json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "NO_CHANGES");
    }
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_issues_working_token() {
        let app = app();
        register(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "correct horse" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "alice");

        let token = body["token"].as_str().unwrap();
        let (status, _) = send(&app, Method::GET, "/api/v1/users/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let app = app();
        register(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong password" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_login_without_password_field() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let (status, body) =
            send(&app(), Method::GET, "/api/v1/blogs", Some("not-a-jwt"), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "INVALID_TOKEN");
    }
}

mod blog_tests {
    use super::*;

    #[tokio::test]
    async fn test_blogs_require_token() {
        let app = app();

        let (status, _) = send(&app, Method::GET, "/api/v1/blogs", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/blogs",
            None,
            Some(json!({ "content": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_list_blogs() {
        let app = app();
        let token = token_for(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/blogs",
            Some(&token),
            Some(json!({ "content": "first post" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["content"], "first post");
        assert_eq!(body["data"]["username"], "alice");
        assert!(body["data"]["ts"].is_i64());

        let (status, body) = send(&app, Method::GET, "/api/v1/blogs", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let blogs = body["data"].as_array().unwrap();
        assert_eq!(blogs.len(), 1);
        assert_eq!(blogs[0]["content"], "first post");
    }

    #[tokio::test]
    async fn test_blogs_are_private_to_author() {
        let app = app();
        let alice = token_for(&app, "alice").await;
        let bob = token_for(&app, "bob").await;

        send(
            &app,
            Method::POST,
            "/api/v1/blogs",
            Some(&alice),
            Some(json!({ "content": "alice only" })),
        )
        .await;

        let (status, body) = send(&app, Method::GET, "/api/v1/blogs", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_body_without_content_is_a_validation_error() {
        let app = app();
        let token = token_for(&app, "alice").await;

        let (status, body) =
            send(&app, Method::POST, "/api/v1/blogs", Some(&token), Some(json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_BODY");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_empty_content_is_rejected() {
        let app = app();
        let token = token_for(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/blogs",
            Some(&token),
            Some(json!({ "content": "   " })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "CONTENT_REQUIRED");
    }
}
