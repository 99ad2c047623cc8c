//! # Ports
//!
//! Any adapter must implement these traits to be wired into the services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::models::{
    Comment, Credentials, Session, Ticket, TicketId, TicketStatus, TicketSubmission,
};

/// Persistence contract for tickets, comments, and status history.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Persists a submission and returns the canonical ticket with its
    /// assigned id, timestamps, and initial `open` history entry.
    async fn create_ticket(&self, student_id: &str, submission: TicketSubmission) -> Result<Ticket>;

    /// All tickets owned by `student_id`, in insertion order.
    async fn list_tickets(&self, student_id: &str) -> Result<Vec<Ticket>>;

    async fn get_ticket(&self, id: &TicketId) -> Result<Option<Ticket>>;

    /// Appends a comment; the returned comment carries the persisted id.
    async fn append_comment(
        &self,
        ticket_id: &TicketId,
        author: &str,
        content: &str,
    ) -> Result<Comment>;

    async fn update_status(
        &self,
        ticket_id: &TicketId,
        status: TicketStatus,
        comment: Option<String>,
    ) -> Result<Ticket>;
}

/// Authentication contract. Failures carry a user-facing message.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<Session>;
}

/// Failed-login bookkeeping that survives a reload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub failed_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<DateTime<Utc>>,
}

/// Storage for [`AttemptRecord`]s keyed by an admission key
/// (a single fixed key on the client, the student id on the server).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<AttemptRecord>;
    async fn save(&self, key: &str, record: AttemptRecord) -> Result<()>;
}

/// Time source. Deadlines are compared against this instead of timers.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests: time only moves when told to.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug)]
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "testing"))]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(start),
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let start = Utc.with_ymd_and_hms(2023, 5, 15, 10, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);
        clock.advance(chrono::Duration::seconds(61));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(61));
    }

    #[test]
    fn attempt_record_round_trips_without_lock() {
        let record = AttemptRecord { failed_attempts: 3, locked_until: None };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"failedAttempts":3}"#);
        assert_eq!(serde_json::from_str::<AttemptRecord>(&json).unwrap(), record);
    }
}
