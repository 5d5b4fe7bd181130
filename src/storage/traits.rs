//! Storage trait definition for persisted client registrations.
//!
//! The lifecycle manager consumes this interface; backends must provide an
//! atomic insert-if-absent for identifier uniqueness and a per-key
//! compare-and-update so concurrent updates against the same client are
//! serialized by the store, not by the core.

use async_trait::async_trait;

use crate::errors::StorageError;
use crate::oidc::metadata::ClientMetadata;

pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored registration artifact together with its update version.
///
/// The version participates in [`ClientRegistrationStore::compare_and_update`];
/// callers receive copies, never shared mutable references.
#[derive(Debug, Clone)]
pub struct StoredRegistration {
    pub version: u64,
    pub metadata: ClientMetadata,
}

/// Trait for storing and retrieving client registrations
#[async_trait]
pub trait ClientRegistrationStore: Send + Sync {
    /// Store a new registration iff no registration exists for `client_id`.
    ///
    /// Returns false without modifying anything when the identifier is
    /// already taken. The check and insert are atomic.
    async fn insert_if_absent(&self, client_id: &str, metadata: &ClientMetadata) -> Result<bool>;

    /// Retrieve a registration by client identifier
    async fn get(&self, client_id: &str) -> Result<Option<StoredRegistration>>;

    /// Replace the stored registration iff its version still equals
    /// `expected_version`. Returns false when the version moved or the
    /// registration is gone.
    async fn compare_and_update(
        &self,
        client_id: &str,
        expected_version: u64,
        metadata: &ClientMetadata,
    ) -> Result<bool>;

    /// Remove a registration; removing an absent one is not an error
    async fn delete(&self, client_id: &str) -> Result<()>;

    /// List stored registrations, for administrative enumeration
    async fn list(&self, limit: Option<usize>) -> Result<Vec<StoredRegistration>>;
}
