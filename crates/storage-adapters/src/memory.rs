//! # InMemoryTicketRepository
//!
//! `TicketRepository` backed by a concurrent map. Ids are issued from a
//! monotonic counter ("T-001", "T-002", ...) and never reused; listing
//! returns tickets in creation order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{
    Clock, Comment, DomainError, Result, SystemClock, Ticket, TicketId, TicketRepository,
    TicketStatus, TicketSubmission,
};
use tracing::{debug, info};
use uuid::Uuid;

pub struct InMemoryTicketRepository {
    /// ticket id -> (insertion sequence, ticket)
    tickets: DashMap<TicketId, (u64, Ticket)>,
    next_seq: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryTicketRepository {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryTicketRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tickets: DashMap::new(),
            next_seq: AtomicU64::new(1),
            clock,
        }
    }

    /// Stores a ticket built elsewhere (seed data, imports). Later issued
    /// ids continue after the highest numeric suffix seen.
    pub fn insert(&self, ticket: Ticket) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        if let Some(n) = numeric_suffix(&ticket.id) {
            self.next_seq.fetch_max(n + 1, Ordering::SeqCst);
        }
        self.tickets.insert(ticket.id.clone(), (seq, ticket));
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    fn issue_id(&self) -> (u64, TicketId) {
        loop {
            let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
            let id = TicketId::new(format!("T-{seq:03}"));
            if !self.tickets.contains_key(&id) {
                return (seq, id);
            }
        }
    }
}

fn numeric_suffix(id: &TicketId) -> Option<u64> {
    id.as_str().strip_prefix("T-")?.parse().ok()
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn create_ticket(
        &self,
        student_id: &str,
        submission: TicketSubmission,
    ) -> Result<Ticket> {
        submission.validate()?;
        let (seq, id) = self.issue_id();
        let ticket = Ticket::open(id, student_id, submission, self.clock.now())?;
        info!(ticket_id = %ticket.id, student_id, "ticket created");
        self.tickets.insert(ticket.id.clone(), (seq, ticket.clone()));
        Ok(ticket)
    }

    async fn list_tickets(&self, student_id: &str) -> Result<Vec<Ticket>> {
        let mut rows: Vec<(u64, Ticket)> = self
            .tickets
            .iter()
            .filter(|entry| entry.value().1.student_id == student_id)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        debug!(student_id, count = rows.len(), "listed tickets");
        Ok(rows.into_iter().map(|(_, t)| t).collect())
    }

    async fn get_ticket(&self, id: &TicketId) -> Result<Option<Ticket>> {
        Ok(self.tickets.get(id).map(|entry| entry.value().1.clone()))
    }

    async fn append_comment(
        &self,
        ticket_id: &TicketId,
        author: &str,
        content: &str,
    ) -> Result<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::validation("comment must not be empty"));
        }

        let mut entry = self
            .tickets
            .get_mut(ticket_id)
            .ok_or_else(|| DomainError::not_found("Ticket", ticket_id.as_str()))?;

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            author: author.to_string(),
            content: content.to_string(),
            timestamp: self.clock.now(),
        };
        entry.value_mut().1.push_comment(comment.clone());
        info!(ticket_id = %ticket_id, comment_id = %comment.id, "comment appended");
        Ok(comment)
    }

    async fn update_status(
        &self,
        ticket_id: &TicketId,
        status: TicketStatus,
        comment: Option<String>,
    ) -> Result<Ticket> {
        let mut entry = self
            .tickets
            .get_mut(ticket_id)
            .ok_or_else(|| DomainError::not_found("Ticket", ticket_id.as_str()))?;

        let ticket = &mut entry.value_mut().1;
        ticket.record_status(status, self.clock.now(), comment)?;
        info!(ticket_id = %ticket_id, %status, "ticket status updated");
        Ok(ticket.clone())
    }
}
