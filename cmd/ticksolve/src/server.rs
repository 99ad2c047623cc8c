use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState};
use auth_adapters::{SessionIssuer, StudentDirectory};
use chrono::Duration;
use configs::Settings;
use domains::{Clock, SystemClock};
use secrecy::ExposeSecret;
use services::LoginGuard;
use storage_adapters::{
    sample_student, seed_repository, InMemoryAttemptStore, InMemoryTicketRepository,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::login_policy;

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 1. Persistence
    let repo = Arc::new(InMemoryTicketRepository::new(clock.clone()));
    let directory = Arc::new(StudentDirectory::new());
    if settings.server.seed_sample_data {
        seed(&settings, &repo, &directory)?;
    }

    // 2. Sessions and the per-student lockout
    let issuer = Arc::new(SessionIssuer::new(
        &settings.auth.session_secret,
        Duration::hours(settings.auth.session_ttl_hours),
    ));
    let store = Arc::new(InMemoryAttemptStore::new());
    let guard = LoginGuard::new(store, clock, login_policy(&settings)?);

    // 3. HTTP
    let state = AppState::new(repo, directory, issuer, guard);
    let addr = settings.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "ticksolve listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

fn seed(
    settings: &Settings,
    repo: &InMemoryTicketRepository,
    directory: &StudentDirectory,
) -> anyhow::Result<()> {
    let count = seed_repository(repo)?;
    info!(count, "seeded sample tickets");

    match &settings.auth.sample_password {
        Some(password) => {
            let student = sample_student();
            let id = student.id.clone();
            directory.register(student, password.expose_secret())?;
            info!(student_id = %id, "registered sample student");
        }
        None => warn!("auth.sample_password unset; the sample student cannot log in"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
