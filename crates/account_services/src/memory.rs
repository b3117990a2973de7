use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::config::LockoutPolicy;
use crate::store::CredentialStore;
use crate::types::{
    ADMIN_ROLE, AccountError, Identity, IdentityError, IdentityResult, normalize_email,
    normalize_role_name,
};

/// Roles available in a fresh store, matching the seeded database roles.
pub const DEFAULT_ROLES: [&str; 2] = [ADMIN_ROLE, "User"];

#[derive(Default)]
struct State {
    identities: HashMap<String, Identity>,
    // normalized role name -> display name
    roles: HashMap<String, String>,
    memberships: HashMap<String, BTreeSet<String>>,
}

/// A credential store kept in process memory.
pub struct MemoryCredentialStore {
    state: RwLock<State>,
}

impl MemoryCredentialStore {
    /// Creates a store with the default `Admin` and `User` roles.
    pub fn new() -> Self {
        Self::with_roles(&DEFAULT_ROLES)
    }

    /// Creates a store that knows only the given roles.
    pub fn with_roles(roles: &[&str]) -> Self {
        let state = State {
            roles: roles
                .iter()
                .map(|name| (normalize_role_name(name), name.to_string()))
                .collect(),
            ..State::default()
        };

        Self {
            state: RwLock::new(state),
        }
    }

    /// Overwrites a stored identity. Used to set up fixtures such as two-factor accounts.
    pub async fn update(&self, identity: Identity) {
        let mut state = self.state.write().await;
        state.identities.insert(identity.id.clone(), identity);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AccountError> {
        let normalized = normalize_email(email);
        let state = self.state.read().await;
        Ok(state
            .identities
            .values()
            .find(|identity| identity.normalized_email == normalized)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Identity>, AccountError> {
        let state = self.state.read().await;
        Ok(state.identities.get(id).cloned())
    }

    async fn insert(&self, identity: &Identity) -> Result<IdentityResult, AccountError> {
        let mut state = self.state.write().await;

        if state
            .identities
            .values()
            .any(|existing| existing.normalized_email == identity.normalized_email)
        {
            return Ok(IdentityResult::Failed(vec![IdentityError::duplicate_email(
                &identity.email,
            )]));
        }

        state
            .identities
            .insert(identity.id.clone(), identity.clone());
        Ok(IdentityResult::Succeeded(()))
    }

    async fn add_to_role(
        &self,
        identity_id: &str,
        role_name: &str,
    ) -> Result<IdentityResult, AccountError> {
        let mut state = self.state.write().await;

        if !state.identities.contains_key(identity_id) {
            return Ok(IdentityResult::Failed(vec![
                IdentityError::identity_not_found(identity_id),
            ]));
        }

        let Some(display_name) = state.roles.get(&normalize_role_name(role_name)).cloned() else {
            return Ok(IdentityResult::Failed(vec![IdentityError::role_not_found(
                role_name,
            )]));
        };

        state
            .memberships
            .entry(identity_id.to_string())
            .or_default()
            .insert(display_name);
        Ok(IdentityResult::Succeeded(()))
    }

    async fn roles(&self, identity_id: &str) -> Result<Vec<String>, AccountError> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .get(identity_id)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn record_access_failure(
        &self,
        identity_id: &str,
        policy: &LockoutPolicy,
    ) -> Result<Option<Identity>, AccountError> {
        let mut state = self.state.write().await;

        let Some(identity) = state.identities.get_mut(identity_id) else {
            return Ok(None);
        };

        identity.access_failed_count += 1;
        if identity.access_failed_count >= policy.max_failed_access_attempts {
            identity.access_failed_count = 0;
            identity.lockout_end = Some(Utc::now() + policy.lockout_duration);
        }

        Ok(Some(identity.clone()))
    }

    async fn reset_access_failures(&self, identity_id: &str) -> Result<(), AccountError> {
        let mut state = self.state.write().await;
        if let Some(identity) = state.identities.get_mut(identity_id) {
            identity.access_failed_count = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_rejects_duplicate_email_in_any_case() {
        let store = MemoryCredentialStore::new();
        let first = Identity::new("jane@example.com", "hash".to_string());
        assert!(store.insert(&first).await.unwrap().succeeded());

        let second = Identity::new("  JANE@Example.com ", "hash".to_string());
        let result = store.insert(&second).await.unwrap();
        assert_eq!(result.errors()[0].code, "DuplicateEmail");

        let found = store.find_by_email("Jane@EXAMPLE.com").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn test_role_membership_is_idempotent() {
        let store = MemoryCredentialStore::new();
        let identity = Identity::new("jane@example.com", "hash".to_string());
        store.insert(&identity).await.unwrap();

        assert!(store.add_to_role(&identity.id, "admin").await.unwrap().succeeded());
        assert!(store.add_to_role(&identity.id, "Admin").await.unwrap().succeeded());
        assert_eq!(store.roles(&identity.id).await.unwrap(), vec!["Admin"]);

        let missing = store.add_to_role(&identity.id, "Auditor").await.unwrap();
        assert_eq!(missing.errors()[0].code, "RoleNotFound");
    }

    #[tokio::test]
    async fn test_role_for_unknown_identity_is_rejected() {
        let store = MemoryCredentialStore::new();

        let result = store.add_to_role("no-such-id", "User").await.unwrap();
        assert_eq!(result.errors()[0].code, "IdentityNotFound");
        assert!(store.roles("no-such-id").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_access_failures_lock_at_threshold() {
        let store = MemoryCredentialStore::new();
        let identity = Identity::new("jane@example.com", "hash".to_string());
        store.insert(&identity).await.unwrap();
        let policy = LockoutPolicy {
            max_failed_access_attempts: 2,
            ..LockoutPolicy::enabled()
        };

        let after_one = store
            .record_access_failure(&identity.id, &policy)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after_one.access_failed_count, 1);
        assert!(!after_one.is_locked_out(Utc::now()));

        let after_two = store
            .record_access_failure(&identity.id, &policy)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after_two.access_failed_count, 0);
        assert!(after_two.is_locked_out(Utc::now()));
    }
}
