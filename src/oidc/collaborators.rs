//! Collaborator traits consumed by the registration lifecycle.
//!
//! Credential generation, registration access token issuance, and the
//! signing algorithm registry are external concerns; this module defines
//! the seams plus the default in-process implementations.

use base64::prelude::*;
use url::Url;

use crate::errors::CredentialError;

/// Source of cryptographically random client identifiers and secrets.
///
/// Failures from this collaborator are always fatal to the operation in
/// progress; callers never substitute fallback credentials.
pub trait CredentialGenerator: Send + Sync {
    /// Produce a fresh client identifier
    fn random_identifier(&self) -> Result<String, CredentialError>;

    /// Produce a fresh client secret with fixed minimum entropy
    fn random_secret(&self) -> Result<String, CredentialError>;
}

/// Default generator: UUIDv4 identifiers, 256-bit URL-safe base64 secrets
#[derive(Debug, Default, Clone)]
pub struct RandomCredentialGenerator;

fn random_token() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.r#gen();
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

impl CredentialGenerator for RandomCredentialGenerator {
    fn random_identifier(&self) -> Result<String, CredentialError> {
        Ok(uuid::Uuid::new_v4().to_string())
    }

    fn random_secret(&self) -> Result<String, CredentialError> {
        Ok(random_token())
    }
}

/// A minted registration access token and its management URI
#[derive(Debug, Clone)]
pub struct IssuedRegistrationToken {
    pub token: String,
    pub management_uri: String,
}

/// Mints and verifies registration access tokens
pub trait RegistrationTokenIssuer: Send + Sync {
    /// Mint a token authorizing later read/update of `client_id`, along
    /// with the client configuration endpoint URI it is presented to
    fn issue(&self, client_id: &str) -> Result<IssuedRegistrationToken, CredentialError>;

    /// Check a presented token against the stored one for the same client
    fn verify(&self, presented: &str, stored: &str) -> bool {
        presented == stored
    }
}

/// Default issuer: opaque random tokens, management URIs under the
/// deployment's external base
#[derive(Debug, Clone)]
pub struct RandomRegistrationTokenIssuer {
    external_base: Url,
}

impl RandomRegistrationTokenIssuer {
    pub fn new(external_base: Url) -> Self {
        Self { external_base }
    }
}

impl RegistrationTokenIssuer for RandomRegistrationTokenIssuer {
    fn issue(&self, client_id: &str) -> Result<IssuedRegistrationToken, CredentialError> {
        // `Url::join` with an absolute path would discard any path segment
        // of the configured base, so the endpoint is appended textually.
        let endpoint = format!(
            "{}/oauth2/register",
            self.external_base.as_str().trim_end_matches('/')
        );
        let mut management_uri = Url::parse(&endpoint).map_err(|e| {
            CredentialError::TokenIssuanceFailed(format!("management URI construction: {}", e))
        })?;
        management_uri
            .query_pairs_mut()
            .append_pair("client_id", client_id);
        Ok(IssuedRegistrationToken {
            token: random_token(),
            management_uri: management_uri.to_string(),
        })
    }
}

/// Registry of ID token signing algorithms supported by the deployment
pub trait SigningAlgorithmRegistry: Send + Sync {
    /// Whether the identifier names an algorithm this deployment can sign with
    fn is_supported(&self, algorithm: &str) -> bool;

    /// The algorithm applied when a client registers without one
    fn default_algorithm(&self) -> &str;
}

/// Fixed-list registry over the standard JWS signature algorithms
#[derive(Debug, Clone)]
pub struct StaticAlgorithmRegistry {
    supported: Vec<String>,
    default: String,
}

impl StaticAlgorithmRegistry {
    pub fn new(supported: Vec<String>, default: String) -> Self {
        Self { supported, default }
    }
}

impl Default for StaticAlgorithmRegistry {
    fn default() -> Self {
        let supported = [
            "RS256", "RS384", "RS512", "ES256", "ES384", "ES512", "PS256", "PS384", "PS512",
            "HS256", "HS384", "HS512",
        ];
        Self {
            supported: supported.iter().map(|s| s.to_string()).collect(),
            default: "RS256".to_string(),
        }
    }
}

impl SigningAlgorithmRegistry for StaticAlgorithmRegistry {
    fn is_supported(&self, algorithm: &str) -> bool {
        self.supported.iter().any(|alg| alg == algorithm)
    }

    fn default_algorithm(&self) -> &str {
        &self.default
    }
}
