//! Trait-based storage abstractions for client registrations.

pub mod inmemory;
pub mod traits;

pub use inmemory::MemoryClientStore;
pub use traits::*;

use crate::errors::StorageError;
use std::sync::Arc;

/// Storage backend configuration
#[derive(Clone)]
pub enum StorageBackend {
    Memory,
}

/// Create a storage backend based on configuration
pub async fn create_storage_backend(
    backend: StorageBackend,
) -> std::result::Result<Arc<dyn ClientRegistrationStore>, StorageError> {
    match backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory client registration storage");
            Ok(Arc::new(MemoryClientStore::new()))
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = StorageError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "memory" => Ok(Self::Memory),
            other => Err(StorageError::ConnectionFailed(format!(
                "unknown storage backend '{}'",
                other
            ))),
        }
    }
}
