//! # ticksolve
//!
//! `ticksolve serve` (the default) runs the HTTP server. `ticksolve login`
//! drives the client login flow against a running server and prints the
//! issued session.

mod client;
mod server;

use std::path::PathBuf;

use anyhow::Context;
use chrono::Duration;
use clap::{Parser, Subcommand};
use configs::{LogFormat, LogSettings, Settings};
use services::LoginPolicy;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ticksolve", version, about = "Student complaint ticketing server")]
struct Cli {
    /// Settings file to use instead of ./ticksolve.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Log in through the client flow and print the session
    Login {
        #[arg(long)]
        student_id: String,
        #[arg(long, env = "TICKSOLVE_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("loading settings")?;

    init_tracing(&settings.log)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::run(settings).await,
        Command::Login {
            student_id,
            password,
        } => client::login(&settings, student_id, password).await,
    }
}

fn init_tracing(log: &LogSettings) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_env("TICKSOLVE_LOG").unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match log.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    result.map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

pub(crate) fn login_policy(settings: &Settings) -> anyhow::Result<LoginPolicy> {
    let secs = settings.auth.lockout_secs;
    let lockout = i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .with_context(|| format!("auth.lockout_secs {secs} is out of range"))?;
    Ok(LoginPolicy {
        max_failed_attempts: settings.auth.max_failed_attempts,
        lockout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::from_builder(Settings::defaults().unwrap()).unwrap()
    }

    #[test]
    fn test_login_policy_from_defaults() {
        let policy = login_policy(&settings()).unwrap();
        assert_eq!(policy, LoginPolicy::default());
    }

    #[test]
    fn test_out_of_range_lockout_is_an_error() {
        let mut settings = settings();
        settings.auth.lockout_secs = u64::MAX;
        assert!(login_policy(&settings).is_err());

        settings.auth.lockout_secs = i64::MAX as u64;
        assert!(login_policy(&settings).is_err());
    }
}
