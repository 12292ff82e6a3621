//! Typed outcomes of the identity flows.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use recipes_core::error::{AppError, ErrorKind};
use recipes_core::types::UserId;

/// Why a session token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenRejection {
    /// Signature, header, or encoding does not check out.
    Tampered,
    /// The token is authentic but past its expiry.
    Expired,
    /// The token is authentic but lacks required claims.
    Malformed,
}

impl TokenRejection {
    /// Lowercase reason string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tampered => "tampered",
            Self::Expired => "expired",
            Self::Malformed => "malformed",
        }
    }
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure outcomes of registration, login, and authorization.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown identity or wrong password. One message for both.
    #[error("Invalid username/email or password")]
    InvalidCredentials,

    /// Registration with a username that is already taken.
    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    /// Registration with an email that is already taken.
    #[error("Email is already registered")]
    DuplicateEmail,

    /// The identity has no role bindings. A data-integrity fault.
    #[error("Identity {0} has no roles assigned")]
    NoRolesAssigned(UserId),

    /// The presented session token was refused.
    #[error("Invalid session token: {0}")]
    InvalidToken(TokenRejection),

    /// The operation needs an authenticated caller.
    #[error("Authentication required")]
    Unauthenticated,

    /// The caller lacks the required authority.
    #[error("Missing required authority '{authority}'")]
    Forbidden {
        /// The authority that was checked.
        authority: String,
    },

    /// The request does not satisfy registration policy.
    #[error("{0}")]
    Validation(String),

    /// Infrastructure failure (storage, hashing, signing).
    #[error(transparent)]
    App(#[from] AppError),
}

impl AuthError {
    /// The workspace error category for this outcome.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredentials | Self::InvalidToken(_) | Self::Unauthenticated => {
                ErrorKind::Authentication
            }
            Self::DuplicateUsername(_) | Self::DuplicateEmail => ErrorKind::Conflict,
            Self::NoRolesAssigned(_) => ErrorKind::Configuration,
            Self::Forbidden { .. } => ErrorKind::Authorization,
            Self::Validation(_) => ErrorKind::Validation,
            Self::App(e) => e.kind,
        }
    }

    /// Whether this outcome points at bad data rather than a bad request.
    pub fn is_integrity_fault(&self) -> bool {
        matches!(self, Self::NoRolesAssigned(_))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::App(inner) => inner,
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}
