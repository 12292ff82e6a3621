//! Registration, login, and current-identity flows.
//!
//! The only place where the store, password hasher, role resolver, and
//! token issuer are combined. Each public flow has an `*_at` variant taking
//! an explicit clock reading.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use recipes_core::config::AuthConfig;
use recipes_core::error::AppError;
use recipes_database::store::{CreateOutcome, CredentialStore};
use recipes_entity::user::{NewUser, User};

use crate::context::IdentityContext;
use crate::error::AuthError;
use crate::jwt::{Claims, IssuedToken, TokenIssuer, TokenValidator};
use crate::password::{PasswordHasher, PasswordValidator};
use crate::roles::RoleResolver;

/// Verified against when the login identifier matches nobody, so that unknown
/// identities cost the same as wrong passwords.
const TIMING_DECOY_PASSWORD: &str = "timing-decoy-password";

/// Registration payload.
#[derive(Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username.
    #[validate(length(min = 3, max = 80), custom(function = "validate_username"))]
    pub username: String,
    /// Email address.
    #[validate(email, length(max = 255))]
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Login payload. `login` is either a username or an email.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub login: String,
    /// Plaintext password.
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

/// Public view of the authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Identity id.
    pub id: recipes_core::types::UserId,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Every role bound at issuance.
    pub roles: BTreeSet<String>,
}

/// Token envelope returned by registration and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Opaque bearer token.
    pub token: String,
    /// Always `"Bearer"`.
    pub token_type: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// Seconds from issuance until expiry.
    pub expires_in: i64,
    /// The identity the token was issued to.
    pub user: UserSummary,
}

impl AuthResponse {
    fn new(issued: IssuedToken, now: DateTime<Utc>, user: &User, roles: BTreeSet<String>) -> Self {
        Self {
            expires_in: issued.expires_at.timestamp() - now.timestamp(),
            expires_at: issued.expires_at,
            token: issued.token,
            token_type: "Bearer".to_string(),
            user: UserSummary {
                id: user.id,
                username: user.username.clone(),
                email: user.email.clone(),
                created_at: user.created_at,
                roles,
            },
        }
    }
}

/// Entry point for identity flows.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    password_policy: PasswordValidator,
    resolver: RoleResolver,
    issuer: TokenIssuer,
    validator: TokenValidator,
    default_role: String,
    decoy_digest: Arc<str>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("issuer", &self.issuer)
            .field("validator", &self.validator)
            .field("default_role", &self.default_role)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Builds the service. Fails if the auth configuration is unusable.
    pub fn new(config: &AuthConfig, store: Arc<dyn CredentialStore>) -> Result<Self, AppError> {
        config.validate()?;

        let hasher = PasswordHasher::new();
        let decoy_digest = hasher.hash_password(TIMING_DECOY_PASSWORD)?;

        Ok(Self {
            resolver: RoleResolver::new(Arc::clone(&store)),
            store,
            hasher,
            password_policy: PasswordValidator::new(config),
            issuer: TokenIssuer::new(config)?,
            validator: TokenValidator::new(config),
            default_role: config.default_role.clone(),
            decoy_digest: decoy_digest.into(),
        })
    }

    /// Registers a new identity bound to the default role and returns a token.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AuthError> {
        self.register_at(req, Utc::now()).await
    }

    /// [`register`](Self::register) with an explicit clock reading.
    pub async fn register_at(
        &self,
        req: RegisterRequest,
        now: DateTime<Utc>,
    ) -> Result<AuthResponse, AuthError> {
        let req = RegisterRequest {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_string(),
            password: req.password,
        };
        req.validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        self.password_policy.validate(&req.password)?;

        if self.store.exists_by_username(&req.username).await? {
            return Err(AuthError::DuplicateUsername(req.username));
        }
        if self.store.exists_by_email(&req.email).await? {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash_password(&req.password)?;
        let new_user = NewUser {
            username: req.username.clone(),
            email: req.email,
            password_hash,
        };

        // The existence checks above can race with a concurrent registration; the
        // store's own uniqueness check is authoritative.
        let user = match self.store.create_with_role(new_user, &self.default_role).await? {
            CreateOutcome::Created(user) => user,
            CreateOutcome::UsernameTaken => return Err(AuthError::DuplicateUsername(req.username)),
            CreateOutcome::EmailTaken => return Err(AuthError::DuplicateEmail),
        };

        info!(
            user_id = %user.id,
            username = %user.username,
            role = %self.default_role,
            "Identity registered"
        );

        self.issue_for(&user, now).await
    }

    /// Verifies credentials and returns a fresh token.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AuthError> {
        self.login_at(req, Utc::now()).await
    }

    /// [`login`](Self::login) with an explicit clock reading.
    pub async fn login_at(
        &self,
        req: LoginRequest,
        now: DateTime<Utc>,
    ) -> Result<AuthResponse, AuthError> {
        let login = req.login.trim();

        let Some(user) = self.store.find_by_username_or_email(login).await? else {
            let _ = self.hasher.verify_password(&req.password, &self.decoy_digest);
            warn!("Login failed: unknown identity");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify_password(&req.password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let response = self.issue_for(&user, now).await?;
        info!(user_id = %user.id, "Login successful");
        Ok(response)
    }

    /// Identity context for a request presenting `token` (or none).
    pub fn current_identity(&self, token: Option<&str>) -> IdentityContext {
        self.current_identity_at(token, Utc::now())
    }

    /// [`current_identity`](Self::current_identity) with an explicit clock reading.
    pub fn current_identity_at(&self, token: Option<&str>, now: DateTime<Utc>) -> IdentityContext {
        IdentityContext::resolve(token, &self.validator, now)
    }

    /// Validates a token and returns its claims.
    pub fn validate_token(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        self.validator
            .validate(token, now)
            .map_err(AuthError::InvalidToken)
    }

    /// Binds `role` to the identity named by `login` and returns the
    /// complete resulting role set.
    ///
    /// Tokens issued before the grant keep their old authorities.
    pub async fn assign_role(
        &self,
        login: &str,
        role: &str,
    ) -> Result<BTreeSet<String>, AuthError> {
        let user = self
            .store
            .find_by_username_or_email(login.trim())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Identity '{login}' not found")))?;

        if self.store.assign_role(user.id, role).await? {
            info!(user_id = %user.id, role = %role, "Role assigned");
        }

        self.resolver.resolve(user.id).await
    }

    async fn issue_for(&self, user: &User, now: DateTime<Utc>) -> Result<AuthResponse, AuthError> {
        let roles = self.resolver.resolve(user.id).await?;
        let issued = self.issuer.issue(user, &roles, now)?;
        Ok(AuthResponse::new(issued, now, user, roles))
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.');
    if username.chars().all(allowed) {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset")
            .with_message("Username may only contain letters, digits, '_', '-' and '.'".into()))
    }
}
