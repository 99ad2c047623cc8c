use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use api_adapters::router;
use async_trait::async_trait;
use axum::http::{header::RETRY_AFTER, Method, StatusCode};
use chrono::Duration;
use domains::{AuthGateway, Credentials, Result, Session};
use integration_tests::*;
use storage_adapters::SAMPLE_STUDENT_ID;

/// Passes through to the real gateway and counts password checks.
struct CountingGateway {
    inner: Arc<dyn AuthGateway>,
    calls: AtomicUsize,
}

#[async_trait]
impl AuthGateway for CountingGateway {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.login(credentials).await
    }
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, _, body) = send(&app.router, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_login_issues_session_with_dashboard_redirect() {
    let app = test_app();
    let (status, _, body) = login(&app.router, SAMPLE_STUDENT_ID, SAMPLE_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["studentId"], SAMPLE_STUDENT_ID);
    assert_eq!(body["redirect"], "/dashboard");

    let token = body["token"].as_str().unwrap();
    let (status, _, me) =
        send(&app.router, request(Method::GET, "/api/me", Some(token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "John Doe");
}

#[tokio::test]
async fn test_blank_fields_are_rejected_without_counting() {
    let app = test_app();
    for _ in 0..6 {
        let (status, _, body) = login(&app.router, SAMPLE_STUDENT_ID, "   ").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Please enter both student ID and password");
    }
    // Six blank submits later the account is still open.
    let (status, _, _) = login(&app.router, SAMPLE_STUDENT_ID, SAMPLE_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_fifth_failure_locks_the_student_out() {
    let app = test_app();

    for _ in 0..4 {
        let (status, _, body) = login(&app.router, SAMPLE_STUDENT_ID, "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
    }

    let (status, headers, body) = login(&app.router, SAMPLE_STUDENT_ID, "wrong").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(headers.get(RETRY_AFTER).unwrap(), "60");
    assert_eq!(body["message"], "Too many login attempts. Please try again in 60 seconds.");

    // Correct password is refused while locked.
    app.clock.advance(Duration::seconds(20));
    let (status, headers, _) = login(&app.router, SAMPLE_STUDENT_ID, SAMPLE_PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(headers.get(RETRY_AFTER).unwrap(), "40");

    // Other students are unaffected.
    let (status, _, _) = login(&app.router, OTHER_STUDENT_ID, OTHER_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(Duration::seconds(40));
    let (status, _, _) = login(&app.router, SAMPLE_STUDENT_ID, SAMPLE_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_parallel_wrong_passwords_stop_at_the_limit() {
    let (mut state, _, _) = test_state();
    let gateway = Arc::new(CountingGateway {
        inner: state.gateway.clone(),
        calls: AtomicUsize::new(0),
    });
    state.gateway = gateway.clone();
    let router = router(state);

    let handles: Vec<_> = (0..24)
        .map(|_| {
            let router = router.clone();
            tokio::spawn(async move { login(&router, SAMPLE_STUDENT_ID, "wrong").await.0 })
        })
        .collect();
    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    assert_eq!(gateway.calls.load(Ordering::SeqCst), 5);
    let rejected = statuses.iter().filter(|s| **s == StatusCode::UNAUTHORIZED).count();
    let limited = statuses.iter().filter(|s| **s == StatusCode::TOO_MANY_REQUESTS).count();
    assert_eq!((rejected, limited), (4, 20));

    // The lock holds for the right password too.
    let (status, _, _) = login(&router, SAMPLE_STUDENT_ID, SAMPLE_PASSWORD).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_lock_expiry_resets_the_counter() {
    let app = test_app();
    for _ in 0..5 {
        login(&app.router, SAMPLE_STUDENT_ID, "wrong").await;
    }
    app.clock.advance(Duration::seconds(61));

    // A fresh budget of four plain rejections before the next lock.
    for _ in 0..4 {
        let (status, _, _) = login(&app.router, SAMPLE_STUDENT_ID, "wrong").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_protected_routes_need_a_valid_token() {
    let app = test_app();
    let (status, _, body) =
        send(&app.router, request(Method::GET, "/api/tickets", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "missing bearer token");

    let bad_token = request(Method::GET, "/api/tickets", Some("not-a-jwt"), None);
    let (status, _, _) = send(&app.router, bad_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
