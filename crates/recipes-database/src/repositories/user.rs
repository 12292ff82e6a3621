//! User repository implementation.

use sqlx::PgPool;

use recipes_core::error::AppError;
use recipes_core::result::AppResult;
use recipes_core::types::{RoleId, UserId};
use recipes_entity::user::{NewUser, User};

use crate::store::CreateOutcome;

/// Unique index backing case-insensitive username uniqueness.
const USERNAME_KEY: &str = "users_username_key";
/// Unique index backing case-insensitive email uniqueness.
const EMAIL_KEY: &str = "users_email_key";

/// Repository for identity rows.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by primary key.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::query("Failed to find user by id", e))
    }

    /// Find a user whose username or email equals `login` (case-insensitive).
    ///
    /// A username match wins over an email match.
    pub async fn find_by_username_or_email(&self, login: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users \
             WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1) \
             ORDER BY (LOWER(username) = LOWER($1)) DESC \
             LIMIT 1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::query("Failed to find user by login", e))
    }

    /// Whether a username is already registered (case-insensitive).
    pub async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::query("Failed to check username", e))
    }

    /// Whether an email is already registered (case-insensitive).
    pub async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::query("Failed to check email", e))
    }

    /// Insert a user and bind it to `role_id` in one transaction.
    ///
    /// Either both rows are written or neither is. Unique-index violations
    /// are reported as [`CreateOutcome`] variants rather than errors.
    pub async fn create_with_role(
        &self,
        data: &NewUser,
        role_id: RoleId,
    ) -> AppResult<CreateOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::query("Failed to begin transaction", e))?;

        let inserted = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(UserId::new())
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .fetch_one(&mut *tx)
        .await;

        let user = match inserted {
            Ok(user) => user,
            Err(sqlx::Error::Database(ref db_err)) if db_err.constraint() == Some(USERNAME_KEY) => {
                return Ok(CreateOutcome::UsernameTaken);
            }
            Err(sqlx::Error::Database(ref db_err)) if db_err.constraint() == Some(EMAIL_KEY) => {
                return Ok(CreateOutcome::EmailTaken);
            }
            Err(e) => {
                return Err(AppError::query("Failed to create user", e));
            }
        };

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user.id)
            .bind(role_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::query("Failed to bind default role", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::query("Failed to commit registration", e))?;

        Ok(CreateOutcome::Created(user))
    }
}
