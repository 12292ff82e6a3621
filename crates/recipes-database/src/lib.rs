//! # recipes-database
//!
//! PostgreSQL connection management, repositories, and the
//! [`CredentialStore`] abstraction with PostgreSQL and in-memory backends.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use store::{CreateOutcome, CredentialStore, MemoryCredentialStore, PgCredentialStore};
