//! `DomainError` to HTTP response mapping.
//!
//! Every error body is `{"message": "..."}`. Validation and auth messages
//! are passed through verbatim so clients can show them as-is; server-side
//! failures are logged and replaced with a generic message.

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domains::DomainError;
use serde_json::json;
use tracing::{debug, error};

#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::NotFound(..) => StatusCode::NOT_FOUND,
        DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        DomainError::Network(_) => StatusCode::BAD_GATEWAY,
        DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn public_message(err: &DomainError) -> String {
    match err {
        DomainError::Validation(msg) | DomainError::Unauthorized(msg) => msg.clone(),
        DomainError::Network(_) => "upstream service unavailable".to_string(),
        DomainError::Internal(_) => "internal server error".to_string(),
        other => other.to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, %status, "request failed");
        } else {
            debug!(error = %self.0, %status, "request rejected");
        }

        let body = Json(json!({ "message": public_message(&self.0) }));
        let mut response = (status, body).into_response();
        if let DomainError::RateLimited { retry_after_secs } = self.0 {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&DomainError::not_found("Ticket", "T-9")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&DomainError::validation("x")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for(&DomainError::network("x")), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError(DomainError::RateLimited { retry_after_secs: 42 }).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let msg = public_message(&DomainError::internal("attempt store unreadable: EACCES"));
        assert_eq!(msg, "internal server error");
    }
}
