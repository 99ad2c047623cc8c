//! Bearer-session extractor.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use domains::{DomainError, Student};

use crate::{error::ApiError, state::AppState};

/// The student owning the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentStudent(pub Student);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| DomainError::Unauthorized("missing bearer token".into()))?;
        let student_id = state.issuer.verify(token)?;
        let student = state
            .directory
            .student(&student_id)
            .ok_or_else(|| {
                DomainError::Unauthorized("session refers to an unknown student".into())
            })?;
        Ok(Self(student))
    }
}
