//! # TicketComposer
//!
//! Drives the three-step complaint intake wizard:
//! `Category -> Details -> Review -> ConfirmPending -> Submitted`.
//!
//! Every synchronous move goes through `transition`, a pure function of
//! (state, draft, event). The only suspension point is
//! [`TicketComposer::confirm_submit`], which hands the frozen draft to the
//! persistence boundary.
//!
//! The post-submit auto-reset is a deadline held in the `Submitted` state and
//! checked by [`TicketComposer::tick`]; dropping the composer drops the
//! deadline, so nothing fires against a torn-down wizard.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use domains::{
    Attachment, Clock, DomainError, Result, Ticket, TicketCategory, TicketRepository,
    TicketSubmission,
};
use tracing::{info, warn};

/// How long the "Complaint Submitted" state is shown before resetting.
const SUCCESS_DISPLAY_MS: i64 = 2000;

/// Position indicator shown in the wizard's progress header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Category = 1,
    Details = 2,
    Review = 3,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Category => "Select Complaint Category",
            WizardStep::Details => "Provide Complaint Details",
            WizardStep::Review => "Review Your Submission",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerState {
    Category,
    Details,
    Review,
    ConfirmPending,
    Submitted {
        ticket: Box<Ticket>,
        reset_at: DateTime<Utc>,
    },
}

impl ComposerState {
    /// The wizard step on screen; confirmation and success overlay the review step.
    pub fn step(&self) -> WizardStep {
        match self {
            ComposerState::Category => WizardStep::Category,
            ComposerState::Details => WizardStep::Details,
            ComposerState::Review
            | ComposerState::ConfirmPending
            | ComposerState::Submitted { .. } => WizardStep::Review,
        }
    }
}

/// Synchronous inputs to the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComposerEvent {
    Advance,
    Retreat,
    RequestConfirmation,
    DismissConfirmation,
}

/// Requests from the composer to whoever hosts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    Close,
}

/// One editable field of the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionField {
    Category(Option<TicketCategory>),
    Title(String),
    Description(String),
    Attachments(Vec<Attachment>),
}

/// Pure transition function. Guard failures return `Validation` and the
/// caller keeps the old state.
pub(crate) fn transition(
    state: &ComposerState,
    draft: &TicketSubmission,
    event: ComposerEvent,
) -> Result<ComposerState> {
    use ComposerEvent::*;
    use ComposerState::*;

    match (state, event) {
        (Category, Advance) if draft.has_category() => Ok(Details),
        (Category, Advance) => Err(DomainError::validation("Please select a complaint category")),
        (Details, Advance) if draft.has_title() => Ok(Review),
        (Details, Advance) => Err(DomainError::validation("Please enter a complaint title")),
        // The terminal step has no guard; advancing opens the confirmation gate.
        (Review, Advance) | (Review, RequestConfirmation) => Ok(ConfirmPending),

        (Details, Retreat) => Ok(Category),
        (Review, Retreat) => Ok(Details),
        (Category, Retreat) => Ok(Category),

        (ConfirmPending, DismissConfirmation) => Ok(Review),

        (Submitted { .. }, _) => Err(DomainError::validation("complaint already submitted")),
        (ConfirmPending, _) => Err(DomainError::validation("awaiting submit confirmation")),
        (_, RequestConfirmation) => {
            Err(DomainError::validation("complaint is not ready for review"))
        }
        (_, DismissConfirmation) => Err(DomainError::validation("no confirmation is open")),
    }
}

/// The intake wizard for one complaint at a time.
pub struct TicketComposer {
    state: ComposerState,
    draft: TicketSubmission,
    last_error: Option<DomainError>,
    display_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl TicketComposer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: ComposerState::Category,
            draft: TicketSubmission::default(),
            last_error: None,
            display_interval: Duration::milliseconds(SUCCESS_DISPLAY_MS),
            clock,
        }
    }

    pub fn state(&self) -> &ComposerState {
        &self.state
    }

    pub fn step(&self) -> WizardStep {
        self.state.step()
    }

    pub fn draft(&self) -> &TicketSubmission {
        &self.draft
    }

    pub fn is_confirming(&self) -> bool {
        matches!(self.state, ComposerState::ConfirmPending)
    }

    /// The ticket created by the last confirmed submit, while it is on screen.
    pub fn submitted(&self) -> Option<&Ticket> {
        match &self.state {
            ComposerState::Submitted { ticket, .. } => Some(ticket.as_ref()),
            _ => None,
        }
    }

    /// Whether the "Next" action should be enabled.
    pub fn can_advance(&self) -> bool {
        transition(&self.state, &self.draft, ComposerEvent::Advance).is_ok()
    }

    /// Last failure from `confirm_submit`, kept until dismissed.
    pub fn last_error(&self) -> Option<&DomainError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    fn apply(&mut self, event: ComposerEvent) -> Result<WizardStep> {
        let next = transition(&self.state, &self.draft, event)?;
        self.state = next;
        Ok(self.step())
    }

    /// Moves one step forward, or opens the confirmation gate on the review step.
    pub fn advance(&mut self) -> Result<WizardStep> {
        self.apply(ComposerEvent::Advance)
    }

    /// Moves one step back; a no-op on the first step.
    pub fn retreat(&mut self) -> Result<WizardStep> {
        self.apply(ComposerEvent::Retreat)
    }

    pub fn request_confirmation(&mut self) -> Result<()> {
        self.apply(ComposerEvent::RequestConfirmation).map(|_| ())
    }

    pub fn dismiss_confirmation(&mut self) -> Result<()> {
        self.apply(ComposerEvent::DismissConfirmation).map(|_| ())
    }

    /// Edits the draft. Allowed on any step and never validated here.
    pub fn set_field(&mut self, field: SubmissionField) {
        match field {
            SubmissionField::Category(category) => self.draft.category = category,
            SubmissionField::Title(title) => self.draft.title = title,
            SubmissionField::Description(description) => self.draft.description = description,
            SubmissionField::Attachments(attachments) => self.draft.attachments = attachments,
        }
    }

    pub fn set_category(&mut self, category: TicketCategory) {
        self.set_field(SubmissionField::Category(Some(category)));
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.set_field(SubmissionField::Title(title.into()));
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.set_field(SubmissionField::Description(description.into()));
    }

    pub fn set_attachments(&mut self, attachments: Vec<Attachment>) {
        self.set_field(SubmissionField::Attachments(attachments));
    }

    /// Sends the frozen draft to the persistence boundary.
    ///
    /// On success the draft is discarded and the composer shows the created
    /// ticket until the display interval elapses. On failure the composer
    /// returns to the review step with the draft untouched.
    pub async fn confirm_submit(
        &mut self,
        repo: &dyn TicketRepository,
        student_id: &str,
    ) -> Result<&Ticket> {
        if !self.is_confirming() {
            return Err(DomainError::validation("submit must be confirmed first"));
        }

        let frozen = self.draft.clone();
        match repo.create_ticket(student_id, frozen).await {
            Ok(ticket) => {
                info!(ticket_id = %ticket.id, category = %ticket.category, "complaint submitted");
                let reset_at = self.clock.now() + self.display_interval;
                self.draft = TicketSubmission::default();
                self.last_error = None;
                self.state = ComposerState::Submitted {
                    ticket: Box::new(ticket),
                    reset_at,
                };
                self.submitted().ok_or_else(|| {
                    DomainError::internal("submitted ticket missing from composer state")
                })
            }
            Err(err) => {
                warn!(error = %err, "complaint submission failed; keeping draft");
                self.state = ComposerState::Review;
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Resets to an empty first step once the success display has elapsed.
    pub fn tick(&mut self) -> Option<HostSignal> {
        match &self.state {
            ComposerState::Submitted { reset_at, .. } if self.clock.now() >= *reset_at => {
                self.reset();
                Some(HostSignal::Close)
            }
            _ => None,
        }
    }

    /// Discards everything, from any step, without confirmation.
    pub fn cancel(&mut self) -> HostSignal {
        info!(step = self.step().number(), "complaint composer cancelled");
        self.reset();
        HostSignal::Close
    }

    fn reset(&mut self) {
        self.state = ComposerState::Category;
        self.draft = TicketSubmission::default();
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domains::{ManualClock, MockTicketRepository, TicketStatus};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2023, 5, 15, 10, 30, 0).unwrap()))
    }

    fn composer_at_review(clock: Arc<ManualClock>) -> TicketComposer {
        let mut composer = TicketComposer::new(clock);
        composer.set_category(TicketCategory::Bullying);
        composer.advance().unwrap();
        composer.set_title("Classroom Bullying Incident");
        composer.advance().unwrap();
        composer
    }

    fn created(submission: TicketSubmission, now: DateTime<Utc>) -> Ticket {
        Ticket::open("T-005".into(), "S12345", submission, now).unwrap()
    }

    #[test]
    fn test_step_one_is_gated_by_category() {
        let mut composer = TicketComposer::new(clock());
        let err = composer.advance().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(composer.step(), WizardStep::Category);

        composer.set_category(TicketCategory::FacilityIssue);
        assert_eq!(composer.advance().unwrap(), WizardStep::Details);
    }

    #[test]
    fn test_step_two_is_gated_by_non_blank_title() {
        let mut composer = TicketComposer::new(clock());
        composer.set_category(TicketCategory::Other);
        composer.advance().unwrap();

        for blank in ["", "   ", "\t\n"] {
            composer.set_title(blank);
            assert!(composer.advance().is_err());
            assert_eq!(composer.step(), WizardStep::Details);
        }

        composer.set_title("  Broken heater  ");
        assert_eq!(composer.advance().unwrap(), WizardStep::Review);
        // Title is kept exactly as typed.
        assert_eq!(composer.draft().title, "  Broken heater  ");
    }

    #[test]
    fn test_description_and_attachments_never_gate() {
        let mut composer = TicketComposer::new(clock());
        composer.set_category(TicketCategory::Other);
        composer.advance().unwrap();
        composer.set_title("Cafeteria Food Quality");
        composer.set_description("");
        composer.set_attachments(Vec::new());
        assert!(composer.can_advance());
    }

    #[test]
    fn test_retreat_then_advance_round_trip() {
        let mut composer = composer_at_review(clock());
        composer.set_description("details");
        let before = composer.draft().clone();

        assert_eq!(composer.retreat().unwrap(), WizardStep::Details);
        assert_eq!(composer.advance().unwrap(), WizardStep::Review);
        assert_eq!(composer.draft(), &before);
    }

    #[test]
    fn test_retreat_on_first_step_is_noop() {
        let mut composer = TicketComposer::new(clock());
        assert_eq!(composer.retreat().unwrap(), WizardStep::Category);
    }

    #[test]
    fn test_advance_on_review_opens_confirmation() {
        let mut composer = composer_at_review(clock());
        composer.advance().unwrap();
        assert!(composer.is_confirming());
        assert_eq!(composer.step(), WizardStep::Review);

        composer.dismiss_confirmation().unwrap();
        assert_eq!(composer.state(), &ComposerState::Review);
    }

    #[test]
    fn test_confirmation_only_from_review() {
        let mut composer = TicketComposer::new(clock());
        assert!(composer.request_confirmation().is_err());
        assert_eq!(composer.state(), &ComposerState::Category);
    }

    #[tokio::test]
    async fn test_confirm_submit_requires_open_confirmation() {
        let mut composer = composer_at_review(clock());
        let repo = MockTicketRepository::new();
        let err = composer.confirm_submit(&repo, "S12345").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_confirm_submit_then_auto_reset() {
        let clock = clock();
        let mut composer = composer_at_review(clock.clone());
        composer.request_confirmation().unwrap();

        let now = clock.now();
        let mut repo = MockTicketRepository::new();
        repo.expect_create_ticket()
            .withf(|student, draft| {
                student == "S12345" && draft.title == "Classroom Bullying Incident"
            })
            .times(1)
            .returning(move |_, draft| Ok(created(draft, now)));

        let ticket = composer.confirm_submit(&repo, "S12345").await.unwrap();
        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(composer.submitted().is_some());
        assert_eq!(composer.draft(), &TicketSubmission::default());

        clock.advance(Duration::milliseconds(1999));
        assert_eq!(composer.tick(), None);

        clock.advance(Duration::milliseconds(1));
        assert_eq!(composer.tick(), Some(HostSignal::Close));
        assert_eq!(composer.state(), &ComposerState::Category);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_review_and_draft() {
        let mut composer = composer_at_review(clock());
        composer.set_description("It happens every day after lunch.");
        composer.request_confirmation().unwrap();
        let before = composer.draft().clone();

        let mut repo = MockTicketRepository::new();
        repo.expect_create_ticket()
            .returning(|_, _| Err(DomainError::network("connection refused")));

        let err = composer.confirm_submit(&repo, "S12345").await.unwrap_err();
        assert!(matches!(err, DomainError::Network(_)));
        assert_eq!(composer.state(), &ComposerState::Review);
        assert_eq!(composer.draft(), &before);
        assert!(composer.last_error().is_some());
        composer.dismiss_error();
        assert!(composer.last_error().is_none());
        assert_eq!(composer.draft(), &before);

        // The user may simply try again.
        composer.request_confirmation().unwrap();
        assert!(composer.is_confirming());
    }

    #[test]
    fn test_cancel_discards_from_any_step() {
        let mut composer = composer_at_review(clock());
        composer.request_confirmation().unwrap();
        assert_eq!(composer.cancel(), HostSignal::Close);
        assert_eq!(composer.state(), &ComposerState::Category);
        assert_eq!(composer.draft(), &TicketSubmission::default());
    }

    #[test]
    fn test_tick_outside_submitted_does_nothing() {
        let mut composer = composer_at_review(clock());
        assert_eq!(composer.tick(), None);
        assert_eq!(composer.step(), WizardStep::Review);
    }
}
