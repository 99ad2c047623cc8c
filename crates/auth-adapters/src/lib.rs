//! # auth-adapters
//!
//! Both sides of the login boundary: the argon2 student directory and JWT
//! sessions that answer logins on the server, and the HTTP client that
//! calls them from the client.

pub mod directory;
pub mod gateway;
pub mod session;

pub use directory::{hash_password, StudentDirectory};
pub use gateway::{DirectoryAuthGateway, HttpAuthGateway};
pub use session::{SessionIssuer, DASHBOARD_REDIRECT};
