//! # services
//!
//! Client-side state managers for TickSolve: the intake wizard, the ticket
//! board, the detail view, login admission, and the dashboard tying them
//! together. None of them own I/O; they talk to the outside world only
//! through the ports in `domains`.

pub mod board;
pub mod composer;
pub mod dashboard;
pub mod detail;
pub mod login;

pub use board::{Filter, SortDirection, SortField, SortSpec, TicketBoard, TicketQuery};
pub use composer::{ComposerState, HostSignal, SubmissionField, TicketComposer, WizardStep};
pub use dashboard::Dashboard;
pub use detail::TicketDetail;
pub use login::{AttemptTurn, LoginGuard, LoginPolicy, LoginService, CLIENT_ATTEMPTS_KEY};
