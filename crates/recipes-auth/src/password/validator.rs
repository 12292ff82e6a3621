//! Password policy enforcement for registrations.

use recipes_core::config::AuthConfig;

use crate::error::AuthError;

/// Longest password accepted, in characters.
const MAX_LENGTH: usize = 128;

/// Validates new passwords against the configured policy.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
    require_strong: bool,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
            require_strong: config.require_strong_passwords,
        }
    }

    /// Returns `Ok(())` if the password is acceptable, or the first violation.
    pub fn validate(&self, password: &str) -> Result<(), AuthError> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }
        if length > MAX_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at most {MAX_LENGTH} characters long"
            )));
        }
        if password.trim().is_empty() {
            return Err(AuthError::Validation(
                "Password must not be blank".to_string(),
            ));
        }

        if self.require_strong {
            let estimate = zxcvbn::zxcvbn(password, &[]);
            if estimate.score() < zxcvbn::Score::Three {
                return Err(AuthError::Validation(
                    "Password is too weak. Please use a stronger password.".to_string(),
                ));
            }
        }

        Ok(())
    }
}
