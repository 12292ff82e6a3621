//! Identity entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use recipes_core::types::UserId;

/// A registered identity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique identity identifier.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the identity was registered.
    pub created_at: DateTime<Utc>,
    /// When the identity was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this identity's username equals `name`, ignoring case.
    pub fn has_username(&self, name: &str) -> bool {
        fold_eq(&self.username, name)
    }

    /// Whether this identity's email equals `email`, ignoring case.
    pub fn has_email(&self, email: &str) -> bool {
        fold_eq(&self.email, email)
    }
}

/// Unicode case-insensitive equality, as PostgreSQL `LOWER(a) = LOWER(b)`.
fn fold_eq(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Data required to create a new identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    #[serde(skip_serializing)]
    pub password_hash: String,
}
