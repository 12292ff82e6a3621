//! Role and role-binding repository.

use sqlx::PgPool;

use recipes_core::error::AppError;
use recipes_core::result::AppResult;
use recipes_core::types::{RoleId, UserId};
use recipes_entity::user::Role;

/// Repository for roles and the `user_roles` join table.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a role by its unique name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT id, name, created_at FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::query("Failed to find role", e))
    }

    /// Every role bound to `user_id`, ordered by name.
    ///
    /// A single join over `user_roles`; the result is the complete binding
    /// set as of statement execution.
    pub async fn find_by_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>(
            "SELECT r.id, r.name, r.created_at \
             FROM roles r \
             INNER JOIN user_roles ur ON ur.role_id = r.id \
             WHERE ur.user_id = $1 \
             ORDER BY r.name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::query("Failed to load role bindings", e))
    }

    /// Bind a role to a user. Returns `false` if the binding already existed.
    pub async fn bind(&self, user_id: UserId, role_id: RoleId) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::not_found(format!("User {user_id} not found"))
            }
            _ => AppError::query("Failed to bind role", e),
        })?;

        Ok(result.rows_affected() > 0)
    }
}
