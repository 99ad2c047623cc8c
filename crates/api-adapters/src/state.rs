use std::sync::Arc;

use auth_adapters::{DirectoryAuthGateway, SessionIssuer, StudentDirectory};
use domains::{AuthGateway, TicketRepository};
use services::LoginGuard;

/// Shared handler state. Cloned per request; everything inside is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn TicketRepository>,
    pub directory: Arc<StudentDirectory>,
    pub issuer: Arc<SessionIssuer>,
    pub gateway: Arc<dyn AuthGateway>,
    /// Keyed by student id.
    pub guard: Arc<LoginGuard>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn TicketRepository>,
        directory: Arc<StudentDirectory>,
        issuer: Arc<SessionIssuer>,
        guard: LoginGuard,
    ) -> Self {
        let gateway = Arc::new(DirectoryAuthGateway::new(directory.clone(), issuer.clone()));
        Self {
            repo,
            directory,
            issuer,
            gateway,
            guard: Arc::new(guard),
        }
    }
}
