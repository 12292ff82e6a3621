//! Session token validation.
//!
//! Checks run in a fixed order: signature, then expiry, then structure.
//! No storage is consulted; the claims are trusted as issued.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::debug;

use recipes_core::config::AuthConfig;
use recipes_core::types::UserId;

use super::claims::{Claims, RawClaims};
use crate::error::TokenRejection;

/// Verifies session tokens against the process-wide HMAC secret.
#[derive(Clone)]
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("algorithms", &self.validation.algorithms)
            .finish()
    }
}

impl TokenValidator {
    /// Creates a validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        // Expiry is checked against the caller's clock, not the library's.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.expose().as_bytes()),
            validation,
        }
    }

    /// Validates `token` as of `now` and returns its claims unchanged.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenRejection> {
        // Any failure before the payload is known to be authentic is
        // treated as alteration, whatever the library reports.
        let payload = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "Token signature rejected");
                TokenRejection::Tampered
            })?
            .claims;

        let exp = payload
            .get("exp")
            .and_then(serde_json::Value::as_i64)
            .ok_or(TokenRejection::Malformed)?;
        if now.timestamp() > exp {
            return Err(TokenRejection::Expired);
        }

        let raw: RawClaims = serde_json::from_value(payload).map_err(|e| {
            debug!(error = %e, "Token payload rejected");
            TokenRejection::Malformed
        })?;

        into_claims(raw, exp).ok_or(TokenRejection::Malformed)
    }
}

fn into_claims(raw: RawClaims, exp: i64) -> Option<Claims> {
    let sub: UserId = raw.sub?.parse().ok()?;
    let username = raw.username.filter(|u| !u.is_empty())?;
    Some(Claims {
        sub,
        username,
        authorities: raw.authorities?.into_iter().collect(),
        iat: raw.iat?,
        exp,
    })
}
