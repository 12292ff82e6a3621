//! Claims carried by every session token.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use recipes_core::types::UserId;

/// Decoded contents of a validated session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity id.
    pub sub: UserId,
    /// Username at issuance.
    pub username: String,
    /// Role names bound at issuance, sorted. They double as authority strings.
    pub authorities: BTreeSet<String>,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    /// Returns the identity id from the subject claim.
    pub fn user_id(&self) -> UserId {
        self.sub
    }

    /// Returns the issuance time.
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Returns the expiration time.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Whether the token had expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}

/// Wire view used after the signature and expiry checks. Every claim is
/// optional so that gaps are reported as structural problems. `exp` is
/// read from the raw payload before this view is built.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawClaims {
    pub sub: Option<String>,
    pub username: Option<String>,
    pub authorities: Option<Vec<String>>,
    pub iat: Option<i64>,
}
