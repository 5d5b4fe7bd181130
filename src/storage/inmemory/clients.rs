//! In-memory client registration storage.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::StorageError;
use crate::oidc::metadata::ClientMetadata;
use crate::storage::traits::{ClientRegistrationStore, Result, StoredRegistration};

/// In-memory implementation of [`ClientRegistrationStore`].
///
/// Conditional operations hold the map lock across the check and the write,
/// which gives the atomicity the lifecycle manager relies on.
#[derive(Default)]
pub struct MemoryClientStore {
    clients: Mutex<HashMap<String, StoredRegistration>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientRegistrationStore for MemoryClientStore {
    async fn insert_if_absent(&self, client_id: &str, metadata: &ClientMetadata) -> Result<bool> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::QueryFailed(format!("Lock error: {}", e)))?;
        if clients.contains_key(client_id) {
            return Ok(false);
        }
        clients.insert(
            client_id.to_string(),
            StoredRegistration {
                version: 1,
                metadata: metadata.clone(),
            },
        );
        Ok(true)
    }

    async fn get(&self, client_id: &str) -> Result<Option<StoredRegistration>> {
        let clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::QueryFailed(format!("Lock error: {}", e)))?;
        Ok(clients.get(client_id).cloned())
    }

    async fn compare_and_update(
        &self,
        client_id: &str,
        expected_version: u64,
        metadata: &ClientMetadata,
    ) -> Result<bool> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::QueryFailed(format!("Lock error: {}", e)))?;
        match clients.get_mut(client_id) {
            Some(stored) if stored.version == expected_version => {
                stored.version += 1;
                stored.metadata = metadata.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, client_id: &str) -> Result<()> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::QueryFailed(format!("Lock error: {}", e)))?;
        clients.remove(client_id);
        Ok(())
    }

    async fn list(&self, limit: Option<usize>) -> Result<Vec<StoredRegistration>> {
        let clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::QueryFailed(format!("Lock error: {}", e)))?;
        let mut result: Vec<_> = clients.values().cloned().collect();
        if let Some(limit) = limit {
            result.truncate(limit);
        }
        Ok(result)
    }
}
