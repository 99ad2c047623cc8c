//! # Handlers
//!
//! One function per route. Each one authenticates (where needed), calls a
//! port, and returns JSON. Tickets belonging to another student are reported
//! as not found.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domains::{
    Comment, Credentials, DomainError, Session, Student, Ticket, TicketCategory, TicketId,
    TicketStatus, TicketSubmission,
};
use serde::Deserialize;
use serde_json::{json, Value};
use services::{Filter, SortDirection, SortField, TicketBoard, TicketQuery};
use tracing::{info, warn};

use crate::{error::ApiError, extract::CurrentStudent, state::AppState};

type ApiResult<T> = Result<T, ApiError>;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub student_id: String,
    pub password: String,
}

/// Verifies credentials behind the per-student lockout.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<Session>> {
    let key = body.student_id.trim().to_string();
    if key.is_empty() || body.password.trim().is_empty() {
        return Err(DomainError::validation("Please enter both student ID and password").into());
    }

    // Held until the outcome is recorded so parallel attempts queue behind it.
    let _turn = state.guard.begin(&key).await;
    state.guard.check(&key).await?;

    let credentials = Credentials::new(key.clone(), body.password);
    match state.gateway.login(&credentials).await {
        Ok(session) => {
            info!(student_id = %session.student_id, "session issued");
            Ok(Json(session))
        }
        Err(DomainError::Unauthorized(reason)) => {
            let record = state.guard.record_failure(&key).await?;
            warn!(student_id = %key, attempts = record.failed_attempts, "login rejected");
            if state.guard.is_locking(&record) {
                let retry_after_secs = state.guard.policy().lockout.num_seconds().max(1) as u64;
                return Err(DomainError::RateLimited { retry_after_secs }.into());
            }
            Err(DomainError::Unauthorized(reason).into())
        }
        Err(other) => Err(other.into()),
    }
}

pub async fn me(CurrentStudent(student): CurrentStudent) -> Json<Student> {
    Json(student)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub sort: Option<SortField>,
    pub direction: Option<SortDirection>,
}

fn parse_filter<T: FromStr>(raw: Option<&str>, what: &str) -> Result<Filter<T>, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Filter::All),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(Filter::All),
        Some(v) => v
            .parse()
            .map(Filter::Only)
            .map_err(|_| DomainError::validation(format!("unknown {what}: {v}"))),
    }
}

impl ListParams {
    fn to_query(&self) -> Result<TicketQuery, DomainError> {
        let status = parse_filter::<TicketStatus>(self.status.as_deref(), "status")?;
        let category = parse_filter::<TicketCategory>(self.category.as_deref(), "category")?;
        Ok(TicketQuery::default()
            .search(self.search.clone().unwrap_or_default())
            .status(status)
            .category(category)
            .sort(self.sort.unwrap_or_default(), self.direction.unwrap_or_default()))
    }
}

/// The caller's tickets, filtered and sorted the same way the board does.
pub async fn list_tickets(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let query = params.to_query()?;
    let mut board = TicketBoard::new();
    board.set_tickets(state.repo.list_tickets(&student.id).await?);
    Ok(Json(board.query(&query).into_iter().cloned().collect()))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Json(submission): Json<TicketSubmission>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let ticket = state.repo.create_ticket(&student.id, submission).await?;
    info!(ticket_id = %ticket.id, student_id = %student.id, "ticket created");
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn owned_ticket(state: &AppState, student: &Student, id: &TicketId) -> ApiResult<Ticket> {
    match state.repo.get_ticket(id).await? {
        Some(ticket) if ticket.student_id == student.id => Ok(ticket),
        _ => Err(DomainError::not_found("Ticket", id.as_str()).into()),
    }
}

pub async fn get_ticket(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(id): Path<String>,
) -> ApiResult<Json<Ticket>> {
    let ticket = owned_ticket(&state, &student, &TicketId::new(id)).await?;
    Ok(Json(ticket))
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(id): Path<String>,
    Json(body): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let id = TicketId::new(id);
    owned_ticket(&state, &student, &id).await?;
    let comment = state.repo.append_comment(&id, &student.name, &body.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TicketStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    CurrentStudent(student): CurrentStudent,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> ApiResult<Json<Ticket>> {
    let id = TicketId::new(id);
    owned_ticket(&state, &student, &id).await?;
    let ticket = state.repo.update_status(&id, body.status, body.comment).await?;
    info!(ticket_id = %ticket.id, status = %ticket.status, "status updated");
    Ok(Json(ticket))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_default_to_everything_newest_first() {
        let query = ListParams::default().to_query().unwrap();
        assert_eq!(query, TicketQuery::default());
    }

    #[test]
    fn test_list_params_parse_labels_and_all() {
        let params = ListParams {
            status: Some("In Progress".into()),
            category: Some("all".into()),
            ..Default::default()
        };
        let query = params.to_query().unwrap();
        assert_eq!(query.status, Filter::Only(TicketStatus::InProgress));
        assert_eq!(query.category, Filter::All);
    }

    #[test]
    fn test_unknown_status_is_a_validation_error() {
        let params = ListParams {
            status: Some("pending".into()),
            ..Default::default()
        };
        assert!(matches!(params.to_query(), Err(DomainError::Validation(_))));
    }
}
