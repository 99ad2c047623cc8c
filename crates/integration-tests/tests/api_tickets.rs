use axum::http::{HeaderMap, Method, StatusCode};
use integration_tests::*;
use serde_json::{json, Value};
use storage_adapters::SAMPLE_STUDENT_ID;

async fn get(app: &TestApp, uri: &str, token: &str) -> (StatusCode, HeaderMap, Value) {
    send(&app.router, request(Method::GET, uri, Some(token), None)).await
}

async fn post(
    app: &TestApp,
    uri: &str,
    token: &str,
    body: Value,
) -> (StatusCode, HeaderMap, Value) {
    send(&app.router, request(Method::POST, uri, Some(token), Some(body))).await
}

fn ids(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_list_defaults_to_newest_first() {
    let app = test_app();
    let token = token_for(&app.router, SAMPLE_STUDENT_ID, SAMPLE_PASSWORD).await;

    let (status, _, body) = get(&app, "/api/tickets", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["T-001", "T-002", "T-003", "T-004"]);
}

#[tokio::test]
async fn test_list_filters_and_sorts() {
    let app = test_app();
    let token = token_for(&app.router, SAMPLE_STUDENT_ID, SAMPLE_PASSWORD).await;

    let uri = "/api/tickets?search=BIOLOGY&status=in_progress";
    let (_, _, body) = get(&app, uri, &token).await;
    assert_eq!(ids(&body), vec!["T-002"]);

    let uri = "/api/tickets?sort=status&direction=asc";
    let (_, _, body) = get(&app, uri, &token).await;
    assert_eq!(ids(&body), vec!["T-001", "T-002", "T-003", "T-004"]);

    let uri = "/api/tickets?category=bullying";
    let (_, _, body) = get(&app, uri, &token).await;
    assert_eq!(ids(&body), vec!["T-001"]);

    let uri = "/api/tickets?status=pending";
    let (status, _, _) = get(&app, uri, &token).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_ticket_starts_open_with_one_history_entry() {
    let app = test_app();
    let token = token_for(&app.router, SAMPLE_STUDENT_ID, SAMPLE_PASSWORD).await;

    let submission = json!({
        "category": "facility_issue",
        "title": "Broken projector in Room 204",
        "description": "It has not worked for two weeks.",
        "attachments": [{ "fileName": "projector.jpg", "sizeBytes": 2048 }]
    });
    let (status, _, ticket) = post(&app, "/api/tickets", &token, submission).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket["id"], "T-005");
    assert_eq!(ticket["status"], "open");
    assert_eq!(ticket["studentId"], SAMPLE_STUDENT_ID);
    assert_eq!(ticket["statusHistory"].as_array().unwrap().len(), 1);
    assert_eq!(app.repo.len(), 5);

    let (_, _, body) = get(&app, "/api/tickets", &token).await;
    assert_eq!(ids(&body)[0], "T-005");
}

#[tokio::test]
async fn test_create_ticket_requires_title_and_category() {
    let app = test_app();
    let token = token_for(&app.router, SAMPLE_STUDENT_ID, SAMPLE_PASSWORD).await;

    let missing_title = json!({ "category": "other", "title": "   " });
    let (status, _, _) = post(&app, "/api/tickets", &token, missing_title).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let missing_category = json!({ "category": null, "title": "Noise" });
    let (status, _, _) = post(&app, "/api/tickets", &token, missing_category).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(app.repo.len(), 4);
}

#[tokio::test]
async fn test_comment_is_authored_by_the_session_student() {
    let app = test_app();
    let token = token_for(&app.router, SAMPLE_STUDENT_ID, SAMPLE_PASSWORD).await;

    let body = json!({ "content": "Any update on this?" });
    let (status, _, comment) = post(&app, "/api/tickets/T-001/comments", &token, body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["author"], "John Doe");

    let (_, _, ticket) = get(&app, "/api/tickets/T-001", &token).await;
    assert_eq!(ticket["comments"].as_array().unwrap().len(), 1);

    let blank = json!({ "content": "  " });
    let (status, _, _) = post(&app, "/api/tickets/T-001/comments", &token, blank).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_status_update_appends_history() {
    let app = test_app();
    let token = token_for(&app.router, SAMPLE_STUDENT_ID, SAMPLE_PASSWORD).await;

    let body = json!({ "status": "in_progress", "comment": "Assigned to counselor" });
    let (status, _, ticket) = post(&app, "/api/tickets/T-001/status", &token, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ticket["status"], "in_progress");
    let history = ticket["statusHistory"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["comment"], "Assigned to counselor");
}

#[tokio::test]
async fn test_other_students_tickets_are_invisible() {
    let app = test_app();
    let token = token_for(&app.router, OTHER_STUDENT_ID, OTHER_PASSWORD).await;

    let (_, _, body) = get(&app, "/api/tickets", &token).await;
    assert!(ids(&body).is_empty());

    let (status, _, body) = get(&app, "/api/tickets/T-001", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Ticket not found with ID T-001");

    let comment = json!({ "content": "hello" });
    let (status, _, _) = post(&app, "/api/tickets/T-001/comments", &token, comment).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
