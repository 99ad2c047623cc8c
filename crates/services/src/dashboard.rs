//! The student dashboard: header info, the ticket board, the composer, and
//! the currently open ticket detail, all fed by one [`TicketRepository`].

use std::sync::Arc;

use domains::{Clock, DomainError, Result, Student, TicketId, TicketRepository};
use tracing::{info, warn};

use crate::board::TicketBoard;
use crate::composer::{HostSignal, TicketComposer};
use crate::detail::TicketDetail;

pub struct Dashboard {
    student: Student,
    repo: Arc<dyn TicketRepository>,
    board: TicketBoard,
    composer: TicketComposer,
    detail: Option<TicketDetail>,
}

impl Dashboard {
    pub fn new(student: Student, repo: Arc<dyn TicketRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            student,
            repo,
            board: TicketBoard::new(),
            composer: TicketComposer::new(clock),
            detail: None,
        }
    }

    pub fn student(&self) -> &Student {
        &self.student
    }

    pub fn board(&self) -> &TicketBoard {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut TicketBoard {
        &mut self.board
    }

    pub fn composer(&self) -> &TicketComposer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut TicketComposer {
        &mut self.composer
    }

    pub fn detail(&self) -> Option<&TicketDetail> {
        self.detail.as_ref()
    }

    pub fn detail_mut(&mut self) -> Option<&mut TicketDetail> {
        self.detail.as_mut()
    }

    /// Reloads the student's tickets from the persistence boundary.
    pub async fn refresh(&mut self) -> Result<usize> {
        let tickets = self.repo.list_tickets(&self.student.id).await?;
        let count = tickets.len();
        self.board.set_tickets(tickets);
        Ok(count)
    }

    /// Confirms the composer's pending submit and refreshes the board so the
    /// new ticket shows up in the list. Once the ticket is stored the id is
    /// returned even if the refresh fails; the board keeps its old rows.
    pub async fn submit(&mut self) -> Result<TicketId> {
        let id = self
            .composer
            .confirm_submit(self.repo.as_ref(), &self.student.id)
            .await?
            .id
            .clone();
        if let Err(error) = self.refresh().await {
            warn!(ticket_id = %id, %error, "ticket stored but board refresh failed");
        }
        Ok(id)
    }

    /// Opens the detail view for a ticket on the board. Unknown ids are ignored.
    pub fn open_detail(&mut self, id: &TicketId) -> bool {
        if !self.board.select(id) {
            return false;
        }
        self.detail = self.board.selected().cloned().map(TicketDetail::new);
        self.detail.is_some()
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
        self.board.clear_selection();
    }

    /// Posts the open detail's comment draft as this student and mirrors
    /// the result onto the board.
    pub async fn post_comment(&mut self) -> Result<()> {
        let detail = self
            .detail
            .as_mut()
            .ok_or_else(|| DomainError::validation("no ticket is open"))?;
        detail.submit_comment(self.repo.as_ref(), &self.student.name).await?;
        let updated = detail.ticket().clone();
        info!(ticket_id = %updated.id, "board updated with new comment");
        self.board.replace_ticket(updated);
        Ok(())
    }

    pub fn tick(&mut self) -> Option<HostSignal> {
        self.composer.tick()
    }
}
