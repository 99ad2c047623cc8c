//! Ticket detail view: description, status history, comments, and the
//! comment box.

use domains::{Comment, DomainError, Result, Ticket, TicketRepository};
use tracing::{info, warn};

pub struct TicketDetail {
    ticket: Ticket,
    draft: String,
}

impl TicketDetail {
    pub fn new(ticket: Ticket) -> Self {
        Self {
            ticket,
            draft: String::new(),
        }
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn can_submit(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    /// Sends the draft and appends the comment the boundary returns.
    /// The comment id always comes from the boundary; on failure the draft
    /// stays so the user can retry.
    pub async fn submit_comment(
        &mut self,
        repo: &dyn TicketRepository,
        author: &str,
    ) -> Result<&Comment> {
        if !self.can_submit() {
            return Err(DomainError::validation("Please type a comment first"));
        }

        let comment = repo
            .append_comment(&self.ticket.id, author, self.draft.trim())
            .await
            .inspect_err(|err| {
                warn!(ticket_id = %self.ticket.id, error = %err, "comment not saved")
            })?;

        info!(ticket_id = %self.ticket.id, comment_id = %comment.id, "comment added");
        self.ticket.push_comment(comment);
        self.draft.clear();
        self.ticket
            .comments
            .last()
            .ok_or_else(|| DomainError::internal("appended comment missing"))
    }
}
