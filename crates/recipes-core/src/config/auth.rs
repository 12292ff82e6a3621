//! Authentication configuration.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::AppError;

/// Placeholder shipped in the default configuration. Refused at startup.
const PLACEHOLDER_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Minimum accepted length of the signing secret, in bytes.
pub const MIN_SECRET_BYTES: usize = 32;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_MINUTES: u64 = 366 * 24 * 60;

/// A configuration value that must never appear in logs or dumps.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw secret. Only key construction should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(****)")
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("****")
    }
}

/// Credential and session-token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for token signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: SecretString,
    /// Session token lifetime in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,
    /// Role bound to every new registration.
    #[serde(default = "default_role")]
    pub default_role: String,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Reject passwords that zxcvbn scores below "safely unguessable".
    #[serde(default)]
    pub require_strong_passwords: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_minutes: default_token_ttl(),
            default_role: default_role(),
            password_min_length: default_password_min(),
            require_strong_passwords: false,
        }
    }
}

impl AuthConfig {
    /// Token lifetime as a chrono duration.
    ///
    /// Fails for lifetimes outside `1..=MAX_TOKEN_TTL_MINUTES`.
    pub fn token_ttl(&self) -> Result<chrono::Duration, AppError> {
        if self.token_ttl_minutes == 0 || self.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            return Err(AppError::configuration(format!(
                "auth.token_ttl_minutes must be between 1 and {MAX_TOKEN_TTL_MINUTES}"
            )));
        }
        i64::try_from(self.token_ttl_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .ok_or_else(|| AppError::configuration("auth.token_ttl_minutes is out of range"))
    }

    /// Reject configurations that cannot produce trustworthy tokens.
    pub fn validate(&self) -> Result<(), AppError> {
        let secret = self.jwt_secret.expose();
        if secret == PLACEHOLDER_SECRET {
            return Err(AppError::configuration(
                "auth.jwt_secret is still the placeholder value",
            ));
        }
        if secret.len() < MIN_SECRET_BYTES {
            return Err(AppError::configuration(format!(
                "auth.jwt_secret must be at least {MIN_SECRET_BYTES} bytes"
            )));
        }
        self.token_ttl()?;
        if self.default_role.trim().is_empty() {
            return Err(AppError::configuration("auth.default_role must not be empty"));
        }
        Ok(())
    }
}

fn default_jwt_secret() -> SecretString {
    SecretString::new(PLACEHOLDER_SECRET)
}

fn default_token_ttl() -> u64 {
    1440
}

fn default_role() -> String {
    "standard-user".to_string()
}

fn default_password_min() -> usize {
    6
}
