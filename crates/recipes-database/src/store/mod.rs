//! Credential store abstraction.
//!
//! The store is the read path for identities and their role bindings, plus
//! the single write used by registration. Role bindings are always returned
//! as one complete set: implementations read them in a single statement or
//! under a single lock, never by touching a lazily loaded relation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use recipes_core::result::AppResult;
use recipes_core::types::UserId;
use recipes_entity::user::{NewUser, Role, User};

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Result of [`CredentialStore::create_with_role`].
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    /// The identity and its role binding were written.
    Created(User),
    /// Another identity already holds this username.
    UsernameTaken,
    /// Another identity already holds this email.
    EmailTaken,
}

/// Storage for identities and identity-role bindings.
///
/// Implementations must be safe under concurrent use from many requests.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Find an identity by primary key.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find an identity whose username or email equals `login`, ignoring case.
    async fn find_by_username_or_email(&self, login: &str) -> AppResult<Option<User>>;

    /// The complete set of roles bound to `user_id`, ordered by name.
    ///
    /// An empty vector means the identity truly has no bindings. Storage
    /// failures are errors and never degrade into a partial set.
    async fn role_bindings_of(&self, user_id: UserId) -> AppResult<Vec<Role>>;

    /// Whether a username is taken, ignoring case.
    async fn exists_by_username(&self, username: &str) -> AppResult<bool>;

    /// Whether an email is taken, ignoring case.
    async fn exists_by_email(&self, email: &str) -> AppResult<bool>;

    /// Atomically create an identity bound to the role named `role_name`.
    ///
    /// Fails with a configuration error if the role does not exist.
    async fn create_with_role(&self, user: NewUser, role_name: &str) -> AppResult<CreateOutcome>;

    /// Bind an existing role to an identity. Returns `false` if already bound.
    async fn assign_role(&self, user_id: UserId, role_name: &str) -> AppResult<bool>;
}
