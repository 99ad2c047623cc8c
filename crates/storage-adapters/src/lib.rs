//! # storage-adapters
//!
//! In-process implementations of the `domains` storage ports.

pub mod attempts;
pub mod memory;
pub mod seed;

pub use attempts::{FileAttemptStore, InMemoryAttemptStore};
pub use memory::InMemoryTicketRepository;
pub use seed::{sample_student, sample_tickets, seed_repository, SAMPLE_STUDENT_ID};
