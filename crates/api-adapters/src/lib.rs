//! # api-adapters
//!
//! HTTP surface of the TickSolve server. Handlers translate requests into
//! calls on the `domains` ports and map `DomainError` back onto status codes.

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod routes;
#[cfg(feature = "web-axum")]
pub mod state;

#[cfg(feature = "web-axum")]
pub use error::ApiError;
#[cfg(feature = "web-axum")]
pub use routes::router;
#[cfg(feature = "web-axum")]
pub use state::AppState;
