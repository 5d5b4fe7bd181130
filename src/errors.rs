//! Standardized error types following the `error-oidcreg-<domain>-<number>` format.

use thiserror::Error;

use crate::oidc::catalog::ValueKind;

/// Configuration errors that occur during application startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when a required environment variable is not set
    #[error("error-oidcreg-config-1 {0} must be set")]
    EnvVarRequired(String),

    /// Error when duration string cannot be parsed
    #[error("error-oidcreg-config-2 Failed to parse duration '{0}': {1}")]
    DurationParsingFailed(String, String),

    /// Error when boolean string cannot be parsed
    #[error(
        "error-oidcreg-config-3 Failed to parse boolean '{0}': expected true/false/1/0/yes/no/on/off"
    )]
    BoolParsingFailed(String),

    /// Error when a token endpoint auth method name is not recognized
    #[error("error-oidcreg-config-4 Unknown token endpoint auth method '{0}'")]
    AuthMethodParsingFailed(String),

    /// Error when the redirect URI limit cannot be parsed
    #[error("error-oidcreg-config-5 Failed to parse redirect URI limit: {0}")]
    RedirectUriLimitParsingFailed(std::num::ParseIntError),

    /// Error when the external base URL is not a valid absolute URL
    #[error("error-oidcreg-config-6 Invalid external base URL '{0}': {1}")]
    ExternalBaseInvalid(String, url::ParseError),
}

/// A single validation failure produced by the metadata validation pipeline.
///
/// Failures are collected into a [`ValidationFailureSet`] rather than
/// reported one at a time, so one round trip is enough for a client to fix
/// every problem in its request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    /// Claim name is not present in the claim catalog
    #[error("error-oidcreg-validate-1 Unknown claim: {0}")]
    UnknownClaim(String),

    /// Claim is server-assigned and must not be supplied by the client
    #[error("error-oidcreg-validate-2 Claim is server-assigned and read-only: {0}")]
    ReadOnlyClaim(String),

    /// Claim value cannot be coerced to the catalog's declared kind
    #[error("error-oidcreg-validate-3 Type mismatch for claim '{claim}': expected {expected}")]
    TypeMismatch { claim: String, expected: ValueKind },

    /// Claim value fails its per-field syntactic rule
    #[error("error-oidcreg-validate-4 Invalid value for claim '{claim}': {reason}")]
    InvalidValue { claim: String, reason: String },

    /// Cross-field consistency rule violated
    #[error("error-oidcreg-validate-5 Inconsistent metadata: {0}")]
    InconsistentMetadata(String),
}

impl ValidationFailure {
    /// Convenience constructor for per-field failures
    pub fn invalid_value(claim: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            claim: claim.to_string(),
            reason: reason.into(),
        }
    }
}

/// Aggregated outcome of a failed validation pass.
///
/// Always non-empty when returned from the validator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationFailureSet(Vec<ValidationFailure>);

impl std::error::Error for ValidationFailureSet {}

impl ValidationFailureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: ValidationFailure) {
        self.0.push(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationFailure> {
        self.0.iter()
    }

    /// Consume the set, yielding `value` when no failures were collected.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationFailureSet> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<ValidationFailure> for ValidationFailureSet {
    fn from(failure: ValidationFailure) -> Self {
        Self(vec![failure])
    }
}

impl std::fmt::Display for ValidationFailureSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|failure| failure.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

/// Errors produced by credential and token collaborators.
///
/// These are always fatal to the operation that triggered them; the
/// lifecycle manager never falls back to weaker credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Random source failed to produce material
    #[error("error-oidcreg-credential-1 Credential generation failed: {0}")]
    GenerationFailed(String),

    /// Registration access token could not be minted
    #[error("error-oidcreg-credential-2 Registration token issuance failed: {0}")]
    TokenIssuanceFailed(String),
}

/// Registration lifecycle errors
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Client-supplied metadata failed validation
    #[error("error-oidcreg-client-1 Invalid client metadata: {0}")]
    InvalidMetadata(#[from] ValidationFailureSet),

    /// Dynamic registration is disabled on this deployment
    #[error("error-oidcreg-client-2 Client registration disabled")]
    RegistrationDisabled,

    /// Registration access token missing, mismatched, or expired
    #[error("error-oidcreg-client-3 Unauthorized")]
    Unauthorized,

    /// Concurrent update lost the storage compare-and-update race
    #[error("error-oidcreg-client-4 Conflicting concurrent update for client: {0}")]
    Conflict(String),

    /// Identifier generation kept colliding with stored clients
    #[error("error-oidcreg-client-5 Client identifier space exhausted after {0} attempts")]
    IdentifierExhaustion(u32),

    /// Credential or token collaborator failed
    #[error("error-oidcreg-client-6 {0}")]
    Credential(#[from] CredentialError),

    /// Storage collaborator failed after the transient retry
    #[error("error-oidcreg-client-7 Storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Storage collaborator errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error when the backend connection fails
    #[error("error-oidcreg-storage-1 Storage connection failed: {0}")]
    ConnectionFailed(String),

    /// Error when a storage operation fails
    #[error("error-oidcreg-storage-2 Storage operation failed: {0}")]
    QueryFailed(String),

    /// Error when stored data cannot be serialized or deserialized
    #[error("error-oidcreg-storage-3 Data serialization failed: {0}")]
    SerializationFailed(String),

    /// Error when a bounded storage call exceeds its timeout
    #[error("error-oidcreg-storage-4 Storage operation timed out: {0}")]
    Timeout(String),

    /// Error when the backend is temporarily unavailable
    #[error("error-oidcreg-storage-5 Storage temporarily unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Whether the failure is transient and eligible for the single retry
    /// the lifecycle manager performs.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Unavailable(_))
    }
}
