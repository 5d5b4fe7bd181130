//! Registration lifecycle integration tests.
//!
//! These tests exercise the complete dynamic registration flow through the
//! public API: create, read, update, rotate, and deregister, plus the
//! uniqueness guarantee under concurrent creation.

use oidcreg::errors::{CredentialError, RegistrationError};
use oidcreg::oidc::catalog;
use oidcreg::oidc::{
    CredentialGenerator, MetadataValidator, RandomCredentialGenerator,
    RandomRegistrationTokenIssuer, RawClaims, RegistrationLifecycleManager,
    StaticAlgorithmRegistry,
};
use oidcreg::config::Config;
use oidcreg::storage::{ClientRegistrationStore, MemoryClientStore, create_storage_backend};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use url::Url;

fn raw(value: serde_json::Value) -> RawClaims {
    value.as_object().cloned().unwrap()
}

fn manager(storage: Arc<dyn ClientRegistrationStore>) -> RegistrationLifecycleManager {
    RegistrationLifecycleManager::new(
        storage,
        Arc::new(RandomCredentialGenerator),
        Arc::new(RandomRegistrationTokenIssuer::new(
            Url::parse("https://auth.example.com").unwrap(),
        )),
        Arc::new(StaticAlgorithmRegistry::default()),
    )
}

#[tokio::test]
async fn test_complete_registration_lifecycle() {
    let storage = Arc::new(MemoryClientStore::new());
    let service = manager(storage);

    // Step 1: register
    let created = service
        .create(&raw(json!({
            "client_name": "Test Application",
            "redirect_uris": ["https://app.example.com/callback"],
            "grant_types": ["authorization_code", "refresh_token"],
            "response_types": ["code"],
            "scope": "openid profile email",
            "token_endpoint_auth_method": "client_secret_basic",
        })))
        .await
        .unwrap();

    let client_id = created.client_id().unwrap().to_string();
    let token = created.registration_access_token().unwrap().to_string();
    assert!(created.client_secret().is_some());
    assert_eq!(created.client_secret_expires_at(), Some(0));

    // Step 2: read it back with the registration access token
    let fetched = service.read(&client_id, &token).await.unwrap();
    assert_eq!(fetched.to_claim_set(), created.to_claim_set());

    // Step 3: update mutable claims; server-assigned claims are echoed back
    let updated = service
        .update(
            &client_id,
            &token,
            &raw(json!({
                "client_name": "Renamed Application",
                "scope": "openid profile",
            })),
        )
        .await
        .unwrap();
    assert_eq!(updated.client_name(), Some("Renamed Application"));
    assert_eq!(updated.client_id(), created.client_id());
    assert_eq!(updated.client_id_issued_at(), created.client_id_issued_at());
    assert_eq!(updated.client_secret(), created.client_secret());
    assert_eq!(
        updated.redirect_uris(),
        Some(&["https://app.example.com/callback".to_string()][..])
    );

    // Step 4: deregister, twice (idempotent)
    service.deregister(&client_id, &token).await.unwrap();
    service.deregister(&client_id, &token).await.unwrap();
    assert!(matches!(
        service.read(&client_id, &token).await,
        Err(RegistrationError::Unauthorized)
    ));
}

#[tokio::test]
async fn test_stored_artifact_revalidates_cleanly() {
    let storage = Arc::new(MemoryClientStore::new());
    let service = manager(storage);

    let created = service
        .create(&raw(json!({
            "client_name": "Round Trip",
            "redirect_uris": ["https://app.example.com/callback"],
            "scope": "openid",
        })))
        .await
        .unwrap();

    // Serialize, strip the server-assigned claims a client could never
    // send, and run the result back through validation.
    let mut claim_set = created.to_claim_set();
    for def in catalog::all() {
        if def.server_assigned {
            claim_set.remove(def.name);
        }
    }

    let registry = StaticAlgorithmRegistry::default();
    let revalidated = MetadataValidator::new(&registry)
        .validate(&claim_set, None)
        .unwrap();
    assert_eq!(revalidated.client_name(), created.client_name());
    assert_eq!(revalidated.scope(), created.scope());
    assert_eq!(revalidated.grant_types(), created.grant_types());
}

#[tokio::test]
async fn test_update_with_stale_token_is_unauthorized() {
    let storage = Arc::new(MemoryClientStore::new());
    let service = manager(storage);

    let created = service.create(&raw(json!({}))).await.unwrap();
    let client_id = created.client_id().unwrap();

    let result = service
        .update(client_id, "stale-token", &raw(json!({"client_name": "x"})))
        .await;
    assert!(matches!(result, Err(RegistrationError::Unauthorized)));

    // The stored document is untouched.
    let fetched = service
        .read(client_id, created.registration_access_token().unwrap())
        .await
        .unwrap();
    assert_eq!(fetched.to_claim_set(), created.to_claim_set());
}

#[tokio::test]
async fn test_never_expiring_secret_accepts_late_updates() {
    let storage = Arc::new(MemoryClientStore::new());
    let service = manager(storage);

    let created = service.create(&raw(json!({}))).await.unwrap();
    assert_eq!(created.client_secret_expires_at(), Some(0));

    // With expires_at = 0 the expiry gate never triggers, however far in
    // the future the update arrives.
    let updated = service
        .update(
            created.client_id().unwrap(),
            created.registration_access_token().unwrap(),
            &raw(json!({"client_name": "A Century Later"})),
        )
        .await
        .unwrap();
    assert_eq!(updated.client_name(), Some("A Century Later"));
}

#[tokio::test]
async fn test_manager_assembles_from_environment_config() {
    // Only this test touches process environment; the config unit tests
    // exercise the newtype parsers directly.
    unsafe {
        std::env::set_var("EXTERNAL_BASE", "https://auth.example.com");
        std::env::set_var("CLIENT_SECRET_TTL", "30d");
    }
    let config = Config::new().unwrap();
    let storage = create_storage_backend(config.storage_backend.parse().unwrap())
        .await
        .unwrap();
    let service = RegistrationLifecycleManager::from_config(storage, &config);

    let created = service
        .create(&raw(json!({"client_name": "Wired"})))
        .await
        .unwrap();
    let issued_at = created.client_id_issued_at().unwrap();
    assert_eq!(
        created.client_secret_expires_at(),
        Some(issued_at + 30 * 24 * 3600)
    );
    assert!(
        created
            .registration_client_uri()
            .unwrap()
            .starts_with("https://auth.example.com/oauth2/register?client_id=")
    );
}

/// Generator whose first two identifiers collide, to force the uniqueness
/// retry under concurrent creation
struct ContestedGenerator {
    calls: AtomicU32,
}

impl CredentialGenerator for ContestedGenerator {
    fn random_identifier(&self) -> Result<String, CredentialError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < 2 {
            Ok("contested-id".to_string())
        } else {
            RandomCredentialGenerator.random_identifier()
        }
    }

    fn random_secret(&self) -> Result<String, CredentialError> {
        RandomCredentialGenerator.random_secret()
    }
}

#[tokio::test]
async fn test_concurrent_creation_never_duplicates_identifiers() {
    let storage = Arc::new(MemoryClientStore::new());
    let service = Arc::new(RegistrationLifecycleManager::new(
        storage.clone(),
        Arc::new(ContestedGenerator {
            calls: AtomicU32::new(0),
        }),
        Arc::new(RandomRegistrationTokenIssuer::new(
            Url::parse("https://auth.example.com").unwrap(),
        )),
        Arc::new(StaticAlgorithmRegistry::default()),
    ));

    let first_claims = raw(json!({"client_name": "first"}));
    let second_claims = raw(json!({"client_name": "second"}));
    let (first, second) = futures::join!(
        service.create(&first_claims),
        service.create(&second_claims),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert_ne!(first.client_id(), second.client_id());
    assert_eq!(storage.list(None).await.unwrap().len(), 2);
}
