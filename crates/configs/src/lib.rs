//! # configs
//!
//! Layered settings for the TickSolve server.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `ticksolve.toml` in the working directory (optional)
//! 3. Environment variables prefixed `TICKSOLVE__`, with `__` between
//!    section and key (`TICKSOLVE__SERVER__PORT=9000` sets `server.port`)
//!
//! [`Settings::load`] reads `.env` through `dotenvy` first, so variables kept
//! there behave exactly like exported ones.

mod error;

pub use error::ConfigError;

use std::path::{Path, PathBuf};

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

pub const ENV_PREFIX: &str = "TICKSOLVE";
const DEFAULT_FILE: &str = "ticksolve";
const DEV_SESSION_SECRET: &str = "ticksolve-dev-secret";
/// One day.
pub const MAX_LOCKOUT_SECS: u64 = 86_400;
/// Thirty days.
pub const MAX_SESSION_TTL_HOURS: i64 = 720;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Load the sample student and tickets at startup.
    pub seed_sample_data: bool,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `TICKSOLVE_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Login URL the HTTP auth client posts credentials to.
    pub endpoint: String,
    pub max_failed_attempts: u32,
    pub lockout_secs: u64,
    pub attempts_file: PathBuf,
    #[serde(deserialize_with = "secret")]
    pub session_secret: SecretString,
    pub session_ttl_hours: i64,
    /// Password registered for the sample student when seeding.
    #[serde(default, deserialize_with = "optional_secret")]
    pub sample_password: Option<SecretString>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub log: LogSettings,
    pub auth: AuthSettings,
}

fn read_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        debug!(path = %path.display(), "loaded .env");
    }
}

fn secret<'de, D: Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
    String::deserialize(d).map(SecretString::from)
}

fn optional_secret<'de, D: Deserializer<'de>>(d: D) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.map(SecretString::from))
}

impl Settings {
    /// Loads `.env`, then every layer in priority order.
    pub fn load() -> Result<Self, ConfigError> {
        read_dotenv();
        Self::from_builder(
            Self::defaults()?
                .add_source(File::with_name(DEFAULT_FILE).required(false))
                .add_source(Self::environment()),
        )
    }

    /// Like [`Settings::load`] but with an explicit settings file in place of
    /// `ticksolve.toml`. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        read_dotenv();
        Self::from_builder(
            Self::defaults()?
                .add_source(File::from(path))
                .add_source(Self::environment()),
        )
    }

    pub fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }

    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080_i64)?
            .set_default("server.seed_sample_data", true)?
            .set_default("log.level", "info")?
            .set_default("log.format", "pretty")?
            .set_default("auth.endpoint", "http://127.0.0.1:8080/api/auth/login")?
            .set_default("auth.max_failed_attempts", 5_i64)?
            .set_default("auth.lockout_secs", 60_i64)?
            .set_default("auth.attempts_file", "data/login_attempts.json")?
            .set_default("auth.session_secret", DEV_SESSION_SECRET)?
            .set_default("auth.session_ttl_hours", 8_i64)?)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.max_failed_attempts == 0 {
            return Err(ConfigError::invalid("auth.max_failed_attempts", "must be at least 1"));
        }
        if !(1..=MAX_LOCKOUT_SECS).contains(&self.auth.lockout_secs) {
            return Err(ConfigError::invalid(
                "auth.lockout_secs",
                format!("must be between 1 and {MAX_LOCKOUT_SECS}"),
            ));
        }
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.auth.session_ttl_hours) {
            return Err(ConfigError::invalid(
                "auth.session_ttl_hours",
                format!("must be between 1 and {MAX_SESSION_TTL_HOURS}"),
            ));
        }
        if self.uses_dev_secret() {
            warn!(
                env = "TICKSOLVE__AUTH__SESSION_SECRET",
                "auth.session_secret is the built-in development value"
            );
        }
        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        use secrecy::ExposeSecret;
        self.auth.session_secret.expose_secret() == DEV_SESSION_SECRET
    }
}
