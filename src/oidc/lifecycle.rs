//! Registration lifecycle orchestration.
//!
//! [`RegistrationLifecycleManager`] drives create, read, update, rotate, and
//! deregister operations over client registrations. It owns a metadata
//! instance only for the duration of one transaction; once persisted, the
//! storage collaborator holds it and hands out copies.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::{RegistrationError, StorageError};
use crate::oidc::catalog::claims;
use crate::oidc::collaborators::{
    CredentialGenerator, RandomCredentialGenerator, RandomRegistrationTokenIssuer,
    RegistrationTokenIssuer, SigningAlgorithmRegistry, StaticAlgorithmRegistry,
};
use crate::oidc::metadata::{ClaimValue, ClientMetadata};
use crate::oidc::types::ClientAuthMethod;
use crate::oidc::validator::{MetadataValidator, RawClaims};
use crate::storage::traits::{ClientRegistrationStore, StoredRegistration};

/// Bound on identifier regeneration after storage collisions
const MAX_CLIENT_ID_ATTEMPTS: u32 = 5;

/// Retry a storage call once when the failure is transient (timeout or
/// temporary unavailability); all other failures surface immediately.
async fn retry_transient<T, Fut, F>(operation: &str, f: F) -> Result<T, StorageError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    match f().await {
        Err(err) if err.is_transient() => {
            tracing::warn!(operation, error = %err, "transient storage failure, retrying once");
            f().await
        }
        other => other,
    }
}

/// Orchestrates the registration lifecycle against the storage, credential,
/// token, and signing collaborators
pub struct RegistrationLifecycleManager {
    storage: Arc<dyn ClientRegistrationStore>,
    credentials: Arc<dyn CredentialGenerator>,
    tokens: Arc<dyn RegistrationTokenIssuer>,
    algorithms: Arc<dyn SigningAlgorithmRegistry>,
    registration_enabled: bool,
    default_auth_method: ClientAuthMethod,
    max_redirect_uris: usize,
    /// Secret lifetime; None means issued secrets never expire
    client_secret_ttl: Option<chrono::Duration>,
}

impl RegistrationLifecycleManager {
    pub fn new(
        storage: Arc<dyn ClientRegistrationStore>,
        credentials: Arc<dyn CredentialGenerator>,
        tokens: Arc<dyn RegistrationTokenIssuer>,
        algorithms: Arc<dyn SigningAlgorithmRegistry>,
    ) -> Self {
        Self {
            storage,
            credentials,
            tokens,
            algorithms,
            registration_enabled: true,
            default_auth_method: ClientAuthMethod::ClientSecretBasic,
            max_redirect_uris: 10,
            client_secret_ttl: None,
        }
    }

    /// Assemble a manager from configuration, using the default in-process
    /// credential, token, and signing collaborators
    pub fn from_config(storage: Arc<dyn ClientRegistrationStore>, config: &Config) -> Self {
        let mut manager = Self::new(
            storage,
            Arc::new(RandomCredentialGenerator),
            Arc::new(RandomRegistrationTokenIssuer::new(
                config.external_base.as_ref().clone(),
            )),
            Arc::new(StaticAlgorithmRegistry::default()),
        )
        .with_default_auth_method(*config.default_auth_method.as_ref())
        .with_max_redirect_uris(*config.max_redirect_uris.as_ref());
        if let Some(ttl) = config.client_secret_ttl.as_ref() {
            manager = manager.with_client_secret_ttl(*ttl);
        }
        if !config.registration_enabled.as_ref() {
            manager = manager.disable_registration();
        }
        manager
    }

    /// Disable dynamic registration
    pub fn disable_registration(mut self) -> Self {
        self.registration_enabled = false;
        self
    }

    /// Set the auth method applied when a request omits one
    pub fn with_default_auth_method(mut self, method: ClientAuthMethod) -> Self {
        self.default_auth_method = method;
        self
    }

    /// Cap the number of redirect URIs accepted per client
    pub fn with_max_redirect_uris(mut self, max: usize) -> Self {
        self.max_redirect_uris = max;
        self
    }

    /// Give issued client secrets a finite lifetime
    pub fn with_client_secret_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.client_secret_ttl = Some(ttl);
        self
    }

    fn validator(&self) -> MetadataValidator<'_> {
        MetadataValidator::new(self.algorithms.as_ref())
            .with_default_auth_method(self.default_auth_method)
            .with_max_redirect_uris(self.max_redirect_uris)
    }

    /// Register a new client from an untyped claim mapping.
    ///
    /// Validation failures halt before any credential is generated. The
    /// terminal persist is atomic: the full document including its
    /// registration access token is stored, or nothing is.
    pub async fn create(&self, raw: &RawClaims) -> Result<ClientMetadata, RegistrationError> {
        if !self.registration_enabled {
            return Err(RegistrationError::RegistrationDisabled);
        }

        let validated = self.validator().validate(raw, None)?;
        let now = Utc::now();
        let needs_secret = validated
            .token_endpoint_auth_method()
            .map(|method| method.requires_secret())
            .unwrap_or(false);

        for attempt in 1..=MAX_CLIENT_ID_ATTEMPTS {
            let client_id = self.credentials.random_identifier()?;

            let mut metadata = validated.clone();
            metadata.insert(claims::CLIENT_ID, ClaimValue::String(client_id.clone()));
            metadata.insert(
                claims::CLIENT_ID_ISSUED_AT,
                ClaimValue::Timestamp(now.timestamp()),
            );
            if needs_secret {
                let secret = self.credentials.random_secret()?;
                let expires_at = match self.client_secret_ttl {
                    Some(ttl) => (now + ttl).timestamp(),
                    None => 0,
                };
                metadata.insert(claims::CLIENT_SECRET, ClaimValue::String(secret));
                metadata.insert(
                    claims::CLIENT_SECRET_EXPIRES_AT,
                    ClaimValue::Timestamp(expires_at),
                );
            }
            let issued = self.tokens.issue(&client_id)?;
            metadata.insert(
                claims::REGISTRATION_ACCESS_TOKEN,
                ClaimValue::String(issued.token),
            );
            metadata.insert(
                claims::REGISTRATION_CLIENT_URI,
                ClaimValue::String(issued.management_uri),
            );

            let inserted = retry_transient("insert_if_absent", || {
                self.storage.insert_if_absent(&client_id, &metadata)
            })
            .await?;
            if inserted {
                tracing::info!(client_id = %client_id, client_type = ?metadata.client_type(), "registered client");
                return Ok(metadata);
            }
            // The storage-level conditional insert is the uniqueness
            // authority; a prior existence check is never trusted.
            tracing::warn!(client_id = %client_id, attempt, "client identifier collision, regenerating");
        }

        Err(RegistrationError::IdentifierExhaustion(
            MAX_CLIENT_ID_ATTEMPTS,
        ))
    }

    /// Fetch the stored registration, gated on the registration access
    /// token. An unknown identifier and a mismatched token both map to
    /// `Unauthorized`; distinguishing them is left to the HTTP layer.
    async fn authorized(
        &self,
        client_id: &str,
        presented_token: &str,
    ) -> Result<StoredRegistration, RegistrationError> {
        let stored = retry_transient("get", || self.storage.get(client_id))
            .await?
            .ok_or(RegistrationError::Unauthorized)?;
        let token = stored
            .metadata
            .registration_access_token()
            .ok_or(RegistrationError::Unauthorized)?;
        if !self.tokens.verify(presented_token, token) {
            return Err(RegistrationError::Unauthorized);
        }
        Ok(stored)
    }

    /// Read the registration for `client_id`
    pub async fn read(
        &self,
        client_id: &str,
        presented_token: &str,
    ) -> Result<ClientMetadata, RegistrationError> {
        Ok(self.authorized(client_id, presented_token).await?.metadata)
    }

    /// Update the registration by merging `raw` over the stored document
    /// and re-running the full validation pass.
    ///
    /// Server-assigned claims are echoed unchanged; credential rotation is
    /// an explicit operation ([`Self::rotate_secret`]), never a side effect
    /// of update.
    pub async fn update(
        &self,
        client_id: &str,
        presented_token: &str,
        raw: &RawClaims,
    ) -> Result<ClientMetadata, RegistrationError> {
        let stored = self.authorized(client_id, presented_token).await?;

        // A client whose secret has lapsed while its auth method demands one
        // is unauthenticatable until rotated.
        if !stored.metadata.authenticatable(Utc::now()) {
            return Err(RegistrationError::Unauthorized);
        }

        let merged = self.validator().validate(raw, Some(&stored.metadata))?;

        let updated = retry_transient("compare_and_update", || {
            self.storage
                .compare_and_update(client_id, stored.version, &merged)
        })
        .await?;
        if !updated {
            return Err(RegistrationError::Conflict(client_id.to_string()));
        }
        tracing::info!(client_id = %client_id, "updated client registration");
        Ok(merged)
    }

    /// Explicitly rotate the client secret, re-issuing it with a fresh
    /// expiry. Fails for auth methods that do not use a shared secret.
    pub async fn rotate_secret(
        &self,
        client_id: &str,
        presented_token: &str,
    ) -> Result<ClientMetadata, RegistrationError> {
        let stored = self.authorized(client_id, presented_token).await?;

        let method = stored
            .metadata
            .token_endpoint_auth_method()
            .unwrap_or(self.default_auth_method);
        if !method.requires_secret() {
            return Err(RegistrationError::InvalidMetadata(
                crate::errors::ValidationFailure::InconsistentMetadata(format!(
                    "auth method {} does not use a client secret",
                    method.as_str()
                ))
                .into(),
            ));
        }

        let now = Utc::now();
        let secret = self.credentials.random_secret()?;
        let expires_at = match self.client_secret_ttl {
            Some(ttl) => (now + ttl).timestamp(),
            None => 0,
        };
        let mut rotated = stored.metadata.clone();
        rotated.insert(claims::CLIENT_SECRET, ClaimValue::String(secret));
        rotated.insert(
            claims::CLIENT_SECRET_EXPIRES_AT,
            ClaimValue::Timestamp(expires_at),
        );

        let updated = retry_transient("compare_and_update", || {
            self.storage
                .compare_and_update(client_id, stored.version, &rotated)
        })
        .await?;
        if !updated {
            return Err(RegistrationError::Conflict(client_id.to_string()));
        }
        tracing::info!(client_id = %client_id, "rotated client secret");
        Ok(rotated)
    }

    /// Remove the registration. Deregistering an absent client is not an
    /// error.
    pub async fn deregister(
        &self,
        client_id: &str,
        presented_token: &str,
    ) -> Result<(), RegistrationError> {
        let Some(stored) = retry_transient("get", || self.storage.get(client_id)).await? else {
            return Ok(());
        };
        let token = stored
            .metadata
            .registration_access_token()
            .ok_or(RegistrationError::Unauthorized)?;
        if !self.tokens.verify(presented_token, token) {
            return Err(RegistrationError::Unauthorized);
        }
        retry_transient("delete", || self.storage.delete(client_id)).await?;
        tracing::info!(client_id = %client_id, "deregistered client");
        Ok(())
    }
}
