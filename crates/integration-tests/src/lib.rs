//! Shared fixtures for the cross-crate tests: a fully wired router over the
//! sample data, a hand-driven clock, and small request helpers.

use std::sync::Arc;

use api_adapters::{router, AppState};
use auth_adapters::{SessionIssuer, StudentDirectory};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use domains::{ManualClock, Student};
use secrecy::SecretString;
use serde_json::{json, Value};
use services::{LoginGuard, LoginPolicy};
use storage_adapters::{
    sample_student, seed_repository, InMemoryAttemptStore, InMemoryTicketRepository,
};
use tower::ServiceExt;

pub const SAMPLE_PASSWORD: &str = "password123";
pub const OTHER_STUDENT_ID: &str = "S67890";
pub const OTHER_PASSWORD: &str = "hunter22";

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

pub fn other_student() -> Student {
    Student {
        id: OTHER_STUDENT_ID.into(),
        name: "Jane Smith".into(),
        department: "Mathematics".into(),
        year: "1st Year".into(),
        profile_image: None,
        notifications: 0,
    }
}

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub repo: Arc<InMemoryTicketRepository>,
}

/// Seeded repository, two registered students, default lockout policy.
pub fn test_app() -> TestApp {
    let (state, clock, repo) = test_state();
    TestApp {
        router: router(state),
        clock,
        repo,
    }
}

/// The state behind [`test_app`], for tests that swap a port before routing.
pub fn test_state() -> (AppState, Arc<ManualClock>, Arc<InMemoryTicketRepository>) {
    let clock = Arc::new(ManualClock::new(start()));
    let repo = Arc::new(InMemoryTicketRepository::new(clock.clone()));
    seed_repository(&repo).unwrap();

    let directory = Arc::new(StudentDirectory::new());
    directory.register(sample_student(), SAMPLE_PASSWORD).unwrap();
    directory.register(other_student(), OTHER_PASSWORD).unwrap();

    let issuer = Arc::new(SessionIssuer::new(
        &SecretString::from("integration-secret".to_string()),
        Duration::hours(1),
    ));
    let store = Arc::new(InMemoryAttemptStore::new());
    let guard = LoginGuard::new(store, clock.clone(), LoginPolicy::default());

    let state = AppState::new(repo.clone(), directory, issuer, guard);
    (state, clock, repo)
}

pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends one request through a clone of the router.
pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

pub async fn login(
    router: &Router,
    student_id: &str,
    password: &str,
) -> (StatusCode, HeaderMap, Value) {
    let body = json!({ "studentId": student_id, "password": password });
    send(router, request(Method::POST, "/api/auth/login", None, Some(body))).await
}

pub async fn token_for(router: &Router, student_id: &str, password: &str) -> String {
    let (status, _, body) = login(router, student_id, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}
