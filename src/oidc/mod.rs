//! OpenID Connect Dynamic Client Registration core components.
//!
//! The claim catalog, metadata model, validation pipeline, collaborator
//! seams, and lifecycle manager.

pub mod catalog;
pub mod collaborators;
pub mod lifecycle;
pub mod metadata;
pub mod types;
pub mod validator;

// Re-export main types and services
pub use collaborators::{
    CredentialGenerator, RandomCredentialGenerator, RandomRegistrationTokenIssuer,
    RegistrationTokenIssuer, SigningAlgorithmRegistry, StaticAlgorithmRegistry,
};
pub use lifecycle::RegistrationLifecycleManager;
pub use metadata::{ClaimValue, ClientMetadata};
pub use validator::{MetadataValidator, RawClaims};
