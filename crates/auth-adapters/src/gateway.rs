//! `AuthGateway` implementations.
//!
//! `DirectoryAuthGateway` answers logins in-process; `HttpAuthGateway` posts
//! `{studentId, password}` to a remote login endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domains::{AuthGateway, Credentials, DomainError, Result, Session};
use reqwest::{header::RETRY_AFTER, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::directory::StudentDirectory;
use crate::session::SessionIssuer;

pub struct DirectoryAuthGateway {
    directory: Arc<StudentDirectory>,
    issuer: Arc<SessionIssuer>,
}

impl DirectoryAuthGateway {
    pub fn new(directory: Arc<StudentDirectory>, issuer: Arc<SessionIssuer>) -> Self {
        Self { directory, issuer }
    }
}

#[async_trait]
impl AuthGateway for DirectoryAuthGateway {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let student = self.directory.verify(credentials)?;
        info!(student_id = %student.id, "credentials verified");
        self.issuer.issue(&student.id)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginBody<'a> {
    student_id: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

pub struct HttpAuthGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAuthGateway {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| DomainError::internal(format!("building HTTP client: {e}")))?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AuthGateway for HttpAuthGateway {
    async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let body = LoginBody {
            student_id: &credentials.student_id,
            password: credentials.password.expose_secret(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::network(e.to_string()))?;

        let status = response.status();
        debug!(endpoint = %self.endpoint, %status, "login response");

        if status.is_success() {
            return response
                .json::<Session>()
                .await
                .map_err(|e| DomainError::network(format!("malformed login response: {e}")));
        }

        let retry_after_secs = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| "Invalid credentials".to_string());

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => DomainError::RateLimited {
                retry_after_secs: retry_after_secs.unwrap_or(60),
            },
            StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => {
                DomainError::Validation(message)
            }
            s if s.is_server_error() => DomainError::network(message),
            _ => DomainError::Unauthorized(message),
        })
    }
}
