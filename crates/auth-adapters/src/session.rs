//! HS256 session tokens. The token is opaque to clients; only the server
//! reads the claims back.

use chrono::{Duration, Utc};
use domains::{DomainError, Result, Session};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Where the client goes after a successful login.
pub const DASHBOARD_REDIRECT: &str = "/dashboard";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl,
        }
    }

    pub fn issue(&self, student_id: &str) -> Result<Session> {
        let now = Utc::now();
        let claims = Claims {
            sub: student_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| DomainError::internal(format!("signing session token: {e}")))?;
        Ok(Session {
            token,
            student_id: student_id.to_string(),
            redirect: DASHBOARD_REDIRECT.to_string(),
        })
    }

    /// Returns the student id the token was issued to.
    pub fn verify(&self, token: &str) -> Result<String> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims.sub)
            .map_err(|_| DomainError::Unauthorized("session expired or invalid".into()))
    }
}
