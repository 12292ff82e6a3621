//! Per-request identity context.
//!
//! Built once from the bearer token of a request and passed explicitly to
//! downstream code. Nothing here reads or writes ambient state.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use recipes_core::types::UserId;

use crate::error::{AuthError, TokenRejection};
use crate::jwt::{Claims, TokenValidator};

/// The authenticated caller as described by a validated token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Identity id.
    pub user_id: UserId,
    /// Username at token issuance.
    pub username: String,
    /// Authorities granted at token issuance.
    pub authorities: BTreeSet<String>,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username.clone(),
            issued_at: claims.issued_at(),
            expires_at: claims.expires_at(),
            authorities: claims.authorities,
        }
    }
}

/// Authentication state of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityContext {
    /// No token was presented.
    Anonymous,
    /// A token was presented and refused.
    Rejected(TokenRejection),
    /// A token was presented and accepted.
    Authenticated(Principal),
}

impl IdentityContext {
    /// Resolves the context for a request carrying `token`, as of `now`.
    pub fn resolve(token: Option<&str>, validator: &TokenValidator, now: DateTime<Utc>) -> Self {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Self::Anonymous;
        };

        match validator.validate(token, now) {
            Ok(claims) => {
                debug!(user_id = %claims.sub, "Request authenticated");
                Self::Authenticated(claims.into())
            }
            Err(TokenRejection::Tampered) => {
                warn!("Rejected session token with invalid signature");
                Self::Rejected(TokenRejection::Tampered)
            }
            Err(reason) => {
                debug!(reason = %reason, "Rejected session token");
                Self::Rejected(reason)
            }
        }
    }

    /// The caller's identity id, if authenticated.
    pub fn current_subject_id(&self) -> Option<UserId> {
        self.principal().map(|p| p.user_id)
    }

    /// The caller's username, if authenticated.
    pub fn current_username(&self) -> Option<&str> {
        self.principal().map(|p| p.username.as_str())
    }

    /// Whether the caller holds `authority`. Always false when unauthenticated.
    pub fn has_authority(&self, authority: &str) -> bool {
        self.principal()
            .is_some_and(|p| p.authorities.contains(authority))
    }

    /// Whether a valid token was presented.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The authenticated principal, if any.
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated(principal) => Some(principal),
            Self::Anonymous | Self::Rejected(_) => None,
        }
    }

    /// Authorities held by the caller; empty when unauthenticated.
    pub fn authorities(&self) -> impl Iterator<Item = &str> {
        self.principal()
            .into_iter()
            .flat_map(|p| p.authorities.iter().map(String::as_str))
    }

    /// Requires an authenticated caller.
    pub fn require_authenticated(&self) -> Result<&Principal, AuthError> {
        match self {
            Self::Authenticated(principal) => Ok(principal),
            Self::Rejected(reason) => Err(AuthError::InvalidToken(*reason)),
            Self::Anonymous => Err(AuthError::Unauthenticated),
        }
    }

    /// Requires an authenticated caller holding `authority`.
    pub fn authorize(&self, authority: &str) -> Result<&Principal, AuthError> {
        let principal = self.require_authenticated()?;
        if principal.authorities.contains(authority) {
            Ok(principal)
        } else {
            Err(AuthError::Forbidden {
                authority: authority.to_string(),
            })
        }
    }
}

/// Extracts the token from an `Authorization` header value.
///
/// Accepts `Bearer <token>` with either capitalisation of the scheme.
/// Returns `None` for other schemes or an empty token.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value
        .strip_prefix("Bearer ")
        .or_else(|| header_value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}
