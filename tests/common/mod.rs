#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test,
};
use serde_json::json;
use taskboard::auth::AuthResponse;
use taskboard::config::Config;
use taskboard::models::{Role, User};
use taskboard::repository::MemoryRepository;
use taskboard::AppState;

pub fn test_config() -> Config {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("DATABASE_URL", "postgres://unused"),
        ("JWT_SECRET", "integration_access_secret"),
        ("JWT_REFRESH_SECRET", "integration_refresh_secret"),
        ("BCRYPT_COST", "4"),
    ]);
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test configuration is complete")
}

/// Application state over fresh in-memory stores, optionally seeded with users.
pub fn test_state(users: Vec<User>) -> AppState {
    AppState::new(
        test_config(),
        Arc::new(MemoryRepository::with_rows(users)),
        Arc::new(MemoryRepository::new()),
    )
}

/// Status of a request, whether the handler answered or the auth middleware rejected it.
pub async fn call_status(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    req: actix_http::Request,
) -> StatusCode {
    match test::try_call_service(app, req).await {
        Ok(resp) => resp.status(),
        Err(err) => err.error_response().status(),
    }
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// An admin account with the given password, ready to seed into [`test_state`].
pub fn admin_user(email: &str, password: &str) -> User {
    let hash = taskboard::auth::hash_password(password, 4).expect("hashing succeeds");
    User::new(email.into(), "Admin User".into(), Role::Admin, hash)
}

pub async fn register(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> AuthResponse {
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "email": email,
            "full_name": "Test User",
            "password": password
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    test::read_body_json(resp).await
}

pub async fn login(
    app: &impl Service<
        actix_http::Request,
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    password: &str,
) -> AuthResponse {
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    test::read_body_json(resp).await
}
