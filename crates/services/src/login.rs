//! # Login admission
//!
//! A failed-attempt counter that locks further attempts for a cooldown once
//! it reaches the limit, then resets to zero. The lock is a deadline stored
//! with the counter and evaluated on the next check, so there is no timer to
//! cancel when the caller goes away.
//!
//! On the client this is advisory only. The server runs the same guard keyed
//! by student id, which is the check that actually admits or rejects.
//!
//! Attempts on one key run one at a time: a caller takes an [`AttemptTurn`]
//! before `check` and holds it until the failure is recorded, so concurrent
//! requests cannot all pass `check` against the same stale counter.

use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use domains::{
    AttemptRecord, AttemptStore, AuthGateway, Clock, Credentials, DomainError, Result, Session,
};
use secrecy::ExposeSecret;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

/// Key the client-side counter is stored under.
pub const CLIENT_ATTEMPTS_KEY: &str = "loginAttempts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginPolicy {
    pub max_failed_attempts: u32,
    pub lockout: Duration,
}

impl Default for LoginPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout: Duration::seconds(60),
        }
    }
}

type TurnLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Exclusive hold on one key's attempt sequence. Released on drop.
pub struct AttemptTurn {
    key: String,
    held: Option<OwnedMutexGuard<()>>,
    locks: TurnLocks,
}

impl Drop for AttemptTurn {
    fn drop(&mut self) {
        self.held.take();
        // Only the map still references the lock once nobody waits on it.
        self.locks.remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

pub struct LoginGuard {
    store: Arc<dyn AttemptStore>,
    clock: Arc<dyn Clock>,
    policy: LoginPolicy,
    turns: TurnLocks,
}

impl LoginGuard {
    pub fn new(store: Arc<dyn AttemptStore>, clock: Arc<dyn Clock>, policy: LoginPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
            turns: Arc::default(),
        }
    }

    pub fn policy(&self) -> LoginPolicy {
        self.policy
    }

    /// Waits until no other attempt on `key` is in flight.
    pub async fn begin(&self, key: &str) -> AttemptTurn {
        let lock = Arc::clone(self.turns.entry(key.to_string()).or_default().value());
        let held = lock.lock_owned().await;
        AttemptTurn {
            key: key.to_string(),
            held: Some(held),
            locks: self.turns.clone(),
        }
    }

    /// Rejects with `RateLimited` while locked; clears an expired lock.
    pub async fn check(&self, key: &str) -> Result<()> {
        let record = self.store.load(key).await?;
        let Some(until) = record.locked_until else {
            return Ok(());
        };

        let now = self.clock.now();
        if now < until {
            let remaining_ms = (until - now).num_milliseconds();
            let retry_after_secs = ((remaining_ms + 999) / 1000).max(1) as u64;
            return Err(DomainError::RateLimited { retry_after_secs });
        }

        info!(key, "login lockout expired; resetting attempt counter");
        self.store.save(key, AttemptRecord::default()).await
    }

    /// Counts one failure and starts the lockout when the limit is reached.
    pub async fn record_failure(&self, key: &str) -> Result<AttemptRecord> {
        let mut record = self.store.load(key).await?;
        record.failed_attempts = record.failed_attempts.saturating_add(1);
        if record.failed_attempts >= self.policy.max_failed_attempts {
            record.locked_until = Some(self.clock.now() + self.policy.lockout);
            warn!(key, attempts = record.failed_attempts, "too many failed logins; locking out");
        }
        self.store.save(key, record).await?;
        Ok(record)
    }

    pub fn is_locking(&self, record: &AttemptRecord) -> bool {
        record.locked_until.is_some()
    }
}

/// Client-side login flow in front of an [`AuthGateway`].
pub struct LoginService {
    gateway: Arc<dyn AuthGateway>,
    guard: LoginGuard,
}

impl LoginService {
    pub fn new(gateway: Arc<dyn AuthGateway>, guard: LoginGuard) -> Self {
        Self { gateway, guard }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let _turn = self.guard.begin(CLIENT_ATTEMPTS_KEY).await;
        self.guard.check(CLIENT_ATTEMPTS_KEY).await?;

        let blank_password = credentials.password.expose_secret().trim().is_empty();
        if credentials.student_id.trim().is_empty() || blank_password {
            return Err(DomainError::validation("Please enter both student ID and password"));
        }

        match self.gateway.login(credentials).await {
            Ok(session) => {
                info!(student_id = %session.student_id, "login succeeded");
                Ok(session)
            }
            // Transport failures say nothing about the credentials.
            Err(DomainError::Network(reason)) => {
                warn!(%reason, "login request failed");
                Err(DomainError::network("An error occurred during login. Please try again."))
            }
            Err(rejected) => {
                let record = self.guard.record_failure(CLIENT_ATTEMPTS_KEY).await?;
                if self.guard.is_locking(&record) {
                    Err(DomainError::RateLimited {
                        retry_after_secs: self.guard.policy().lockout.num_seconds().max(1) as u64,
                    })
                } else {
                    Err(rejected)
                }
            }
        }
    }
}
