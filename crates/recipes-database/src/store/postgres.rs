//! PostgreSQL-backed credential store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use recipes_core::error::AppError;
use recipes_core::result::AppResult;
use recipes_core::types::UserId;
use recipes_entity::user::{NewUser, Role, User};

use super::{CreateOutcome, CredentialStore};
use crate::repositories::{RoleRepository, UserRepository};

/// Credential store over the `users`, `roles`, and `user_roles` tables.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    users: UserRepository,
    roles: RoleRepository,
}

impl PgCredentialStore {
    /// Create a store sharing the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            roles: RoleRepository::new(pool),
        }
    }

    async fn require_role(&self, role_name: &str) -> AppResult<Role> {
        self.roles.find_by_name(role_name).await?.ok_or_else(|| {
            AppError::configuration(format!("Role '{role_name}' is not defined"))
        })
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn find_by_username_or_email(&self, login: &str) -> AppResult<Option<User>> {
        self.users.find_by_username_or_email(login).await
    }

    async fn role_bindings_of(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let roles = self.roles.find_by_user(user_id).await?;
        debug!(user_id = %user_id, count = roles.len(), "Loaded role bindings");
        Ok(roles)
    }

    async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        self.users.exists_by_username(username).await
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        self.users.exists_by_email(email).await
    }

    async fn create_with_role(&self, user: NewUser, role_name: &str) -> AppResult<CreateOutcome> {
        let role = self.require_role(role_name).await?;
        self.users.create_with_role(&user, role.id).await
    }

    async fn assign_role(&self, user_id: UserId, role_name: &str) -> AppResult<bool> {
        let role = self.require_role(role_name).await?;
        self.roles.bind(user_id, role.id).await
    }
}
