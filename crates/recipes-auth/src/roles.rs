//! Role resolution.
//!
//! Turns an identity into the complete set of role names bound to it.
//! There is no fallback role: an identity without bindings is a data
//! problem and is reported as one.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error};

use recipes_core::types::UserId;
use recipes_database::store::CredentialStore;

use crate::error::AuthError;

/// Loads the full role-binding set of an identity.
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for RoleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleResolver").finish_non_exhaustive()
    }
}

impl RoleResolver {
    /// Creates a resolver reading from `store`.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Returns the names of every role bound to `user_id`.
    ///
    /// Call only with an identity already loaded from the store. Fails with
    /// [`AuthError::NoRolesAssigned`] when the binding set is empty, and
    /// with [`AuthError::App`] when the store cannot produce a complete set.
    pub async fn resolve(&self, user_id: UserId) -> Result<BTreeSet<String>, AuthError> {
        let roles = self.store.role_bindings_of(user_id).await?;

        if roles.is_empty() {
            error!(
                user_id = %user_id,
                "Identity has no role bindings; refusing to build authorities"
            );
            return Err(AuthError::NoRolesAssigned(user_id));
        }

        let names: BTreeSet<String> = roles.into_iter().map(|role| role.name).collect();
        debug!(user_id = %user_id, roles = ?names, "Resolved role bindings");
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipes_database::store::{CreateOutcome, MemoryCredentialStore};
    use recipes_entity::user::{ADMINISTRATOR, NewUser, STANDARD_USER};

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{username}@x.com"),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolves_every_binding() {
        let store = MemoryCredentialStore::with_default_roles();
        let CreateOutcome::Created(user) = store
            .create_with_role(new_user("ana"), STANDARD_USER)
            .await
            .unwrap()
        else {
            panic!("expected created");
        };
        store.assign_role(user.id, ADMINISTRATOR).await.unwrap();

        let resolver = RoleResolver::new(Arc::new(store));
        let names = resolver.resolve(user.id).await.unwrap();
        assert_eq!(
            names,
            BTreeSet::from([ADMINISTRATOR.to_string(), STANDARD_USER.to_string()])
        );
    }

    #[tokio::test]
    async fn test_no_bindings_is_integrity_fault() {
        let store = MemoryCredentialStore::with_default_roles();
        let user = store.insert_unbound(new_user("legacy")).await.unwrap();

        let resolver = RoleResolver::new(Arc::new(store));
        let err = resolver.resolve(user.id).await.unwrap_err();
        assert!(matches!(err, AuthError::NoRolesAssigned(id) if id == user.id));
    }

    #[tokio::test]
    async fn test_unknown_identity_has_no_roles() {
        let resolver = RoleResolver::new(Arc::new(MemoryCredentialStore::with_default_roles()));
        let err = resolver.resolve(UserId::new()).await.unwrap_err();
        assert!(err.is_integrity_fault());
    }
}
