use std::sync::Arc;

use auth_adapters::HttpAuthGateway;
use configs::Settings;
use domains::{Credentials, SystemClock};
use services::{LoginGuard, LoginService};
use storage_adapters::FileAttemptStore;

use crate::login_policy;

/// Runs one login through the client-side guard. Failed attempts are
/// persisted to `auth.attempts_file` across invocations.
pub async fn login(
    settings: &Settings,
    student_id: String,
    password: String,
) -> anyhow::Result<()> {
    let gateway = Arc::new(HttpAuthGateway::new(settings.auth.endpoint.clone())?);
    let store = Arc::new(FileAttemptStore::new(settings.auth.attempts_file.clone()));
    let guard = LoginGuard::new(store, Arc::new(SystemClock), login_policy(settings)?);
    let service = LoginService::new(gateway, guard);

    let session = service.login(&Credentials::new(student_id, password)).await?;
    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}
