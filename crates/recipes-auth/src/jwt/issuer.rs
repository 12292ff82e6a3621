//! Session token creation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use recipes_core::config::AuthConfig;
use recipes_core::error::AppError;
use recipes_entity::user::User;

use super::claims::Claims;

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    /// Compact JWS string.
    pub token: String,
    /// Expiration, truncated to whole seconds.
    pub expires_at: DateTime<Utc>,
}

/// Signs session tokens with the process-wide HMAC secret.
///
/// Holds no mutable state; clones share nothing that changes.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    header: Header,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.header.alg)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    /// Creates an issuer from auth configuration.
    ///
    /// Fails if the configured lifetime is out of range.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.expose().as_bytes()),
            header: Header::new(Algorithm::HS256),
            ttl: config.token_ttl()?,
        })
    }

    /// Configured token lifetime.
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Signs a token for `user` carrying `authorities`, issued at `now`.
    ///
    /// Output depends only on the inputs: the same user, authorities, and
    /// `now` always yield the same token.
    pub fn issue(
        &self,
        user: &User,
        authorities: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let iat = now.timestamp();
        let exp = iat + self.ttl.num_seconds();
        let expires_at = DateTime::from_timestamp(exp, 0)
            .ok_or_else(|| AppError::internal("Token expiry is out of range"))?;

        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            authorities: authorities.clone(),
            iat,
            exp,
        };

        let token = encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode session token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }
}
