//! JSON-file-backed credential store.
//!
//! Credentials survive process restarts: the store keeps a write-through
//! in-memory cache and persists the whole document on every mutation. One
//! file holds both namespaces as separate tables, each keyed by registrable
//! domain.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use gatepass_core::{Credential, Namespace};

use crate::error::StoreError;
use crate::persistence::{default_credentials_path, load_json_or_default, save_json};

// ============================================================================
// On-Disk Document
// ============================================================================

/// The persisted shape: one table per namespace, keyed by domain.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialDocument {
    #[serde(default)]
    opportunistic: BTreeMap<String, Credential>,
    #[serde(default)]
    login: BTreeMap<String, Credential>,
}

impl CredentialDocument {
    fn table(&self, namespace: Namespace) -> &BTreeMap<String, Credential> {
        match namespace {
            Namespace::Opportunistic => &self.opportunistic,
            Namespace::Login => &self.login,
        }
    }

    fn table_mut(&mut self, namespace: Namespace) -> &mut BTreeMap<String, Credential> {
        match namespace {
            Namespace::Opportunistic => &mut self.opportunistic,
            Namespace::Login => &mut self.login,
        }
    }
}

// ============================================================================
// JSON File Store
// ============================================================================

/// Durable credential store backed by a single JSON file.
///
/// All mutations hold the write lock across the read-modify-write-save
/// sequence, which serializes concurrent callers as required by the
/// concurrency model.
pub struct JsonFileStore {
    path: PathBuf,
    inner: Arc<RwLock<CredentialDocument>>,
}

impl JsonFileStore {
    /// Loads the store from the default credentials path.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_credentials_path()).await
    }

    /// Loads the store from a specific path, starting empty if the file
    /// does not exist yet.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let document: CredentialDocument = load_json_or_default(&path).await;
        info!(
            path = %path.display(),
            opportunistic = document.opportunistic.len(),
            login = document.login.len(),
            "Loaded credential store"
        );
        Ok(Self {
            path,
            inner: Arc::new(RwLock::new(document)),
        })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Lists the domains present in a namespace.
    pub async fn domains(&self, namespace: Namespace) -> Vec<String> {
        let doc = self.inner.read().await;
        doc.table(namespace).keys().cloned().collect()
    }
}

#[async_trait]
impl crate::store::CredentialStore for JsonFileStore {
    async fn get(
        &self,
        domain: &str,
        namespace: Namespace,
    ) -> Result<Option<Credential>, StoreError> {
        let doc = self.inner.read().await;
        Ok(doc.table(namespace).get(domain).cloned())
    }

    async fn insert(
        &self,
        domain: &str,
        namespace: Namespace,
        credential: Credential,
    ) -> Result<(), StoreError> {
        debug!(domain, %namespace, "Storing credential");
        let mut doc = self.inner.write().await;
        doc.table_mut(namespace)
            .insert(domain.to_string(), credential);
        save_json(&self.path, &*doc).await
    }

    async fn delete(&self, domain: &str, namespace: Namespace) -> Result<(), StoreError> {
        let mut doc = self.inner.write().await;
        if doc.table_mut(namespace).remove(domain).is_some() {
            debug!(domain, %namespace, "Deleted credential");
            save_json(&self.path, &*doc).await?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CredentialStore;

    #[tokio::test]
    async fn test_survives_reload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("credentials.json");

        {
            let store = JsonFileStore::load(path.clone()).await.unwrap();
            store
                .insert(
                    "example.com",
                    Namespace::Opportunistic,
                    Credential::from_cookie("cf_clearance", "abc"),
                )
                .await
                .unwrap();
        }

        let reloaded = JsonFileStore::load(path).await.unwrap();
        let cred = reloaded
            .get("example.com", Namespace::Opportunistic)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cred.cookies.get("cf_clearance").map(String::as_str), Some("abc"));
    }

    #[tokio::test]
    async fn test_namespaces_persist_independently() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("credentials.json");

        let store = JsonFileStore::load(path.clone()).await.unwrap();
        store
            .insert(
                "example.com",
                Namespace::Opportunistic,
                Credential::from_cookie("cf_clearance", "abc"),
            )
            .await
            .unwrap();
        store
            .insert(
                "example.com",
                Namespace::Login,
                Credential::from_cookie("session", "s1"),
            )
            .await
            .unwrap();

        store
            .delete("example.com", Namespace::Opportunistic)
            .await
            .unwrap();

        let reloaded = JsonFileStore::load(path).await.unwrap();
        assert!(
            reloaded
                .get("example.com", Namespace::Opportunistic)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            reloaded
                .get("example.com", Namespace::Login)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_delete_missing_does_not_write() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("credentials.json");

        let store = JsonFileStore::load(path.clone()).await.unwrap();
        store
            .delete("absent.com", Namespace::Login)
            .await
            .unwrap();

        // No mutation happened, so the file was never created
        assert!(!path.exists());
    }
}
