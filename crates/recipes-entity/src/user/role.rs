//! Role entity.
//!
//! Role names double as authority strings: downstream checks compare them
//! verbatim, so they are stored and embedded exactly as written here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use recipes_core::types::RoleId;

/// Role bound to every identity created through registration.
pub const STANDARD_USER: &str = "standard-user";

/// Role granting administrative capabilities.
pub const ADMINISTRATOR: &str = "administrator";

/// A named capability label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Unique role identifier.
    pub id: RoleId,
    /// Globally unique role name.
    pub name: String,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Build a role value with a fresh identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}
