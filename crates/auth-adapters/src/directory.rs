//! # StudentDirectory
//!
//! Argon2-backed credential store for the server side of the login
//! boundary. Unknown ids and wrong passwords fail with the same message.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use dashmap::DashMap;
use domains::{Credentials, DomainError, Result, Student};
use secrecy::ExposeSecret;
use tracing::debug;
use uuid::Uuid;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

struct Entry {
    student: Student,
    /// PHC-format argon2 hash
    password_hash: String,
}

#[derive(Default)]
pub struct StudentDirectory {
    entries: DashMap<String, Entry>,
}

/// Hashes a password into PHC format with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| DomainError::internal(format!("salt encoding failed: {e}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::internal(format!("password hashing failed: {e}")))
}

impl StudentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a student with a plaintext password (hashed here).
    pub fn register(&self, student: Student, password: &str) -> Result<()> {
        let hash = hash_password(password)?;
        self.register_hashed(student, hash)
    }

    /// Registers a student with an existing PHC hash, e.g. from config.
    pub fn register_hashed(&self, student: Student, password_hash: String) -> Result<()> {
        PasswordHash::new(&password_hash).map_err(|e| {
            DomainError::validation(format!("invalid password hash for {}: {e}", student.id))
        })?;
        self.entries.insert(
            student.id.clone(),
            Entry {
                student,
                password_hash,
            },
        );
        Ok(())
    }

    pub fn student(&self, id: &str) -> Option<Student> {
        self.entries.get(id).map(|e| e.student.clone())
    }

    pub fn verify(&self, credentials: &Credentials) -> Result<Student> {
        let entry = self.entries.get(credentials.student_id.trim()).ok_or_else(|| {
            debug!(student_id = %credentials.student_id, "login for unknown student");
            DomainError::Unauthorized(INVALID_CREDENTIALS.into())
        })?;

        let parsed = PasswordHash::new(&entry.password_hash)
            .map_err(|e| DomainError::internal(format!("stored hash unreadable: {e}")))?;
        Argon2::default()
            .verify_password(credentials.password.expose_secret().as_bytes(), &parsed)
            .map_err(|_| DomainError::Unauthorized(INVALID_CREDENTIALS.into()))?;

        Ok(entry.student.clone())
    }
}
