//! Credential store trait and in-memory implementation.
//!
//! The store holds at most one [`Credential`] per (domain, namespace) pair.
//! Insertion replaces any prior record; merging with caller-supplied request
//! data is the controller's job at read time.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use gatepass_core::{Credential, Namespace};

use crate::error::StoreError;

// ============================================================================
// Credential Store Trait
// ============================================================================

/// Domain-keyed key/value store for earned credentials.
///
/// The two namespaces ([`Namespace::Opportunistic`] and [`Namespace::Login`])
/// are logically independent stores with the same key space. Implementations
/// must serialize read-modify-write sequences; last-writer-wins is acceptable
/// since stored credentials are idempotent snapshots, not counters.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up the credential for a domain in the given namespace.
    async fn get(&self, domain: &str, namespace: Namespace)
    -> Result<Option<Credential>, StoreError>;

    /// Inserts a credential for a domain, replacing any prior record.
    async fn insert(
        &self,
        domain: &str,
        namespace: Namespace,
        credential: Credential,
    ) -> Result<(), StoreError>;

    /// Deletes the credential for a domain, if present.
    async fn delete(&self, domain: &str, namespace: Namespace) -> Result<(), StoreError>;
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-memory credential store with no persistence.
///
/// Used as a test double and as the default store for embedded gateways
/// that do not need credentials to survive a restart.
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    inner: Arc<RwLock<HashMap<(Namespace, String), Credential>>>,
}

impl MemoryCredentialStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored credentials across both namespaces.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Returns true if the store holds no credentials.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(
        &self,
        domain: &str,
        namespace: Namespace,
    ) -> Result<Option<Credential>, StoreError> {
        let map = self.inner.read().await;
        Ok(map.get(&(namespace, domain.to_string())).cloned())
    }

    async fn insert(
        &self,
        domain: &str,
        namespace: Namespace,
        credential: Credential,
    ) -> Result<(), StoreError> {
        debug!(domain, %namespace, "Storing credential");
        let mut map = self.inner.write().await;
        map.insert((namespace, domain.to_string()), credential);
        Ok(())
    }

    async fn delete(&self, domain: &str, namespace: Namespace) -> Result<(), StoreError> {
        debug!(domain, %namespace, "Deleting credential");
        let mut map = self.inner.write().await;
        map.remove(&(namespace, domain.to_string()));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryCredentialStore::new();
        let cred = Credential::from_cookie("cf_clearance", "abc");

        store
            .insert("example.com", Namespace::Opportunistic, cred.clone())
            .await
            .unwrap();

        let found = store
            .get("example.com", Namespace::Opportunistic)
            .await
            .unwrap();
        assert_eq!(found, Some(cred));
    }

    #[tokio::test]
    async fn test_insert_replaces() {
        let store = MemoryCredentialStore::new();

        store
            .insert(
                "example.com",
                Namespace::Opportunistic,
                Credential::from_cookie("cf_clearance", "old"),
            )
            .await
            .unwrap();
        store
            .insert(
                "example.com",
                Namespace::Opportunistic,
                Credential::from_cookie("cf_clearance", "new"),
            )
            .await
            .unwrap();

        let found = store
            .get("example.com", Namespace::Opportunistic)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.cookies.get("cf_clearance").map(String::as_str), Some("new"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_namespaces_are_independent() {
        let store = MemoryCredentialStore::new();

        store
            .insert(
                "example.com",
                Namespace::Login,
                Credential::from_cookie("session", "s1"),
            )
            .await
            .unwrap();

        assert!(
            store
                .get("example.com", Namespace::Opportunistic)
                .await
                .unwrap()
                .is_none()
        );

        // Deleting the opportunistic record must not touch the login record
        store
            .delete("example.com", Namespace::Opportunistic)
            .await
            .unwrap();
        assert!(
            store
                .get("example.com", Namespace::Login)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = MemoryCredentialStore::new();
        store
            .delete("absent.com", Namespace::Opportunistic)
            .await
            .unwrap();
    }
}
