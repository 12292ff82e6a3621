//! In-memory credential store.
//!
//! Backs tests and local tooling. All state sits behind one `RwLock`, so a
//! role-binding read observes either none or all of a registration.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use recipes_core::error::AppError;
use recipes_core::result::AppResult;
use recipes_core::types::{RoleId, UserId};
use recipes_entity::user::{ADMINISTRATOR, NewUser, Role, STANDARD_USER, User};

use super::{CreateOutcome, CredentialStore};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    roles: HashMap<String, Role>,
    bindings: HashMap<UserId, BTreeSet<RoleId>>,
}

impl State {
    fn username_taken(&self, username: &str) -> bool {
        self.users.values().any(|u| u.has_username(username))
    }

    fn email_taken(&self, email: &str) -> bool {
        self.users.values().any(|u| u.has_email(email))
    }

    fn role(&self, name: &str) -> AppResult<&Role> {
        self.roles
            .get(name)
            .ok_or_else(|| AppError::configuration(format!("Role '{name}' is not defined")))
    }

    fn insert_user(&mut self, data: NewUser) -> User {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        user
    }
}

/// Credential store held entirely in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    state: Arc<RwLock<State>>,
}

impl MemoryCredentialStore {
    /// An empty store with no roles defined.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the same roles as the initial migration.
    pub fn with_default_roles() -> Self {
        let mut state = State::default();
        for name in [STANDARD_USER, ADMINISTRATOR] {
            state.roles.insert(name.to_string(), Role::new(name));
        }
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Define a role. Returns `false` if a role with this name exists.
    pub async fn define_role(&self, name: &str) -> bool {
        let mut state = self.state.write().await;
        if state.roles.contains_key(name) {
            return false;
        }
        state.roles.insert(name.to_string(), Role::new(name));
        true
    }

    /// Insert an identity with no role bindings at all.
    ///
    /// Mirrors rows imported outside the registration path; such
    /// identities cannot obtain a token until a role is assigned.
    pub async fn insert_unbound(&self, data: NewUser) -> AppResult<User> {
        let mut state = self.state.write().await;
        if state.username_taken(&data.username) {
            return Err(AppError::conflict(format!(
                "Username '{}' already exists",
                data.username
            )));
        }
        if state.email_taken(&data.email) {
            return Err(AppError::conflict("Email already in use"));
        }
        Ok(state.insert_user(data))
    }

    /// Number of stored identities.
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_username_or_email(&self, login: &str) -> AppResult<Option<User>> {
        let state = self.state.read().await;
        let found = state
            .users
            .values()
            .find(|u| u.has_username(login))
            .or_else(|| state.users.values().find(|u| u.has_email(login)));
        Ok(found.cloned())
    }

    async fn role_bindings_of(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        let Some(role_ids) = state.bindings.get(&user_id) else {
            return Ok(Vec::new());
        };

        let mut roles: Vec<Role> = state
            .roles
            .values()
            .filter(|r| role_ids.contains(&r.id))
            .cloned()
            .collect();
        if roles.len() != role_ids.len() {
            return Err(AppError::internal(format!(
                "Role bindings for user {user_id} reference undefined roles"
            )));
        }
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        Ok(self.state.read().await.username_taken(username))
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        Ok(self.state.read().await.email_taken(email))
    }

    async fn create_with_role(&self, user: NewUser, role_name: &str) -> AppResult<CreateOutcome> {
        let mut state = self.state.write().await;
        let role_id = state.role(role_name)?.id;

        if state.username_taken(&user.username) {
            return Ok(CreateOutcome::UsernameTaken);
        }
        if state.email_taken(&user.email) {
            return Ok(CreateOutcome::EmailTaken);
        }

        let created = state.insert_user(user);
        state
            .bindings
            .entry(created.id)
            .or_default()
            .insert(role_id);
        Ok(CreateOutcome::Created(created))
    }

    async fn assign_role(&self, user_id: UserId, role_name: &str) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let role_id = state.role(role_name)?.id;
        if !state.users.contains_key(&user_id) {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }
        Ok(state.bindings.entry(user_id).or_default().insert(role_id))
    }
}
