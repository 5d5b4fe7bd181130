//! Claim catalog for OpenID Connect Dynamic Client Registration 1.0.
//!
//! A fixed, process-wide immutable registry of the recognized client
//! metadata claims, each carrying its value kind, mutability class, and
//! defaulting policy. Every other component consults the catalog; a claim
//! name absent from it is always rejected, never silently dropped.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::oidc::metadata::ClaimValue;
use crate::oidc::types::ClientAuthMethod;

/// Claim names defined by OpenID Connect Dynamic Client Registration 1.0
pub mod claims {
    /// `client_id` - the client identifier
    pub const CLIENT_ID: &str = "client_id";
    /// `client_id_issued_at` - the time at which the client identifier was issued
    pub const CLIENT_ID_ISSUED_AT: &str = "client_id_issued_at";
    /// `client_secret` - the client secret
    pub const CLIENT_SECRET: &str = "client_secret";
    /// `client_secret_expires_at` - the time at which the client secret will
    /// expire, or 0 if it will not expire
    pub const CLIENT_SECRET_EXPIRES_AT: &str = "client_secret_expires_at";
    /// `client_name` - the name of the client presented to the end user
    pub const CLIENT_NAME: &str = "client_name";
    /// `redirect_uris` - the redirection URI values used by the client
    pub const REDIRECT_URIS: &str = "redirect_uris";
    /// `token_endpoint_auth_method` - the authentication method used by the
    /// client for the token endpoint
    pub const TOKEN_ENDPOINT_AUTH_METHOD: &str = "token_endpoint_auth_method";
    /// `grant_types` - the OAuth 2.0 grant type values the client will
    /// restrict itself to using
    pub const GRANT_TYPES: &str = "grant_types";
    /// `response_types` - the OAuth 2.0 response type values the client will
    /// restrict itself to using
    pub const RESPONSE_TYPES: &str = "response_types";
    /// `scope` - a space-separated list of scope values the client will
    /// restrict itself to using
    pub const SCOPE: &str = "scope";
    /// `id_token_signed_response_alg` - the JWS algorithm required for
    /// signing the ID Token issued to the client
    pub const ID_TOKEN_SIGNED_RESPONSE_ALG: &str = "id_token_signed_response_alg";
    /// `registration_access_token` - the token usable at the client
    /// configuration endpoint
    pub const REGISTRATION_ACCESS_TOKEN: &str = "registration_access_token";
    /// `registration_client_uri` - the client configuration endpoint URL
    pub const REGISTRATION_CLIENT_URI: &str = "registration_client_uri";
}

/// Semantic kind of a claim value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    String,
    StringList,
    Timestamp,
    Boolean,
    UriList,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::StringList => "string list",
            Self::Timestamp => "timestamp",
            Self::Boolean => "boolean",
            Self::UriList => "URI list",
        };
        write!(f, "{}", name)
    }
}

/// Context handed to claim default providers.
///
/// Carries the deployment defaults so that defaulting stays a pure function
/// of its inputs; no provider reads a clock or configuration directly.
#[derive(Debug, Clone)]
pub struct DefaultContext {
    /// Default token endpoint auth method for this deployment
    pub auth_method: ClientAuthMethod,
    /// Default ID token signing algorithm from the signing registry
    pub signing_algorithm: String,
}

/// One catalog entry describing a recognized claim
pub struct ClaimDefinition {
    /// Claim name, unique within the catalog
    pub name: &'static str,
    /// Declared value kind used for type coercion
    pub value_kind: ValueKind,
    /// Whether clients may set this claim in registration/update requests
    pub mutable_by_client: bool,
    /// Whether the server assigns this claim; server-assigned claims in
    /// client input are always rejected
    pub server_assigned: bool,
    /// Optional default applied when the claim is absent from input
    pub default_provider: Option<fn(&DefaultContext) -> ClaimValue>,
}

fn default_auth_method(ctx: &DefaultContext) -> ClaimValue {
    ClaimValue::String(ctx.auth_method.as_str().to_string())
}

fn default_grant_types(_ctx: &DefaultContext) -> ClaimValue {
    ClaimValue::StringList(vec!["authorization_code".to_string()])
}

fn default_response_types(_ctx: &DefaultContext) -> ClaimValue {
    ClaimValue::StringList(vec!["code".to_string()])
}

fn default_id_token_alg(ctx: &DefaultContext) -> ClaimValue {
    ClaimValue::String(ctx.signing_algorithm.clone())
}

/// The catalog, in the order claims are emitted when serializing a
/// registration artifact.
static CATALOG: &[ClaimDefinition] = &[
    ClaimDefinition {
        name: claims::CLIENT_ID,
        value_kind: ValueKind::String,
        mutable_by_client: false,
        server_assigned: true,
        default_provider: None,
    },
    ClaimDefinition {
        name: claims::CLIENT_ID_ISSUED_AT,
        value_kind: ValueKind::Timestamp,
        mutable_by_client: false,
        server_assigned: true,
        default_provider: None,
    },
    ClaimDefinition {
        name: claims::CLIENT_SECRET,
        value_kind: ValueKind::String,
        mutable_by_client: false,
        server_assigned: true,
        default_provider: None,
    },
    ClaimDefinition {
        name: claims::CLIENT_SECRET_EXPIRES_AT,
        value_kind: ValueKind::Timestamp,
        mutable_by_client: false,
        server_assigned: true,
        default_provider: None,
    },
    ClaimDefinition {
        name: claims::CLIENT_NAME,
        value_kind: ValueKind::String,
        mutable_by_client: true,
        server_assigned: false,
        default_provider: None,
    },
    ClaimDefinition {
        name: claims::REDIRECT_URIS,
        value_kind: ValueKind::UriList,
        mutable_by_client: true,
        server_assigned: false,
        default_provider: None,
    },
    ClaimDefinition {
        name: claims::TOKEN_ENDPOINT_AUTH_METHOD,
        value_kind: ValueKind::String,
        mutable_by_client: true,
        server_assigned: false,
        default_provider: Some(default_auth_method),
    },
    ClaimDefinition {
        name: claims::GRANT_TYPES,
        value_kind: ValueKind::StringList,
        mutable_by_client: true,
        server_assigned: false,
        default_provider: Some(default_grant_types),
    },
    ClaimDefinition {
        name: claims::RESPONSE_TYPES,
        value_kind: ValueKind::StringList,
        mutable_by_client: true,
        server_assigned: false,
        default_provider: Some(default_response_types),
    },
    ClaimDefinition {
        name: claims::SCOPE,
        value_kind: ValueKind::String,
        mutable_by_client: true,
        server_assigned: false,
        default_provider: None,
    },
    ClaimDefinition {
        name: claims::ID_TOKEN_SIGNED_RESPONSE_ALG,
        value_kind: ValueKind::String,
        mutable_by_client: true,
        server_assigned: false,
        default_provider: Some(default_id_token_alg),
    },
    ClaimDefinition {
        name: claims::REGISTRATION_ACCESS_TOKEN,
        value_kind: ValueKind::String,
        mutable_by_client: false,
        server_assigned: true,
        default_provider: None,
    },
    ClaimDefinition {
        name: claims::REGISTRATION_CLIENT_URI,
        value_kind: ValueKind::String,
        mutable_by_client: false,
        server_assigned: true,
        default_provider: None,
    },
];

fn index() -> &'static HashMap<&'static str, &'static ClaimDefinition> {
    static INDEX: OnceLock<HashMap<&'static str, &'static ClaimDefinition>> = OnceLock::new();
    INDEX.get_or_init(|| CATALOG.iter().map(|def| (def.name, def)).collect())
}

/// Look up a claim definition by name
pub fn lookup(name: &str) -> Option<&'static ClaimDefinition> {
    index().get(name).copied()
}

/// All claim definitions in serialization order
pub fn all() -> &'static [ClaimDefinition] {
    CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_and_unknown() {
        let def = lookup(claims::CLIENT_ID).unwrap();
        assert!(def.server_assigned);
        assert_eq!(def.value_kind, ValueKind::String);

        assert!(lookup("software_statement").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_catalog_names_are_unique() {
        let mut names: Vec<_> = CATALOG.iter().map(|def| def.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CATALOG.len());
    }

    #[test]
    fn test_server_assigned_claims_are_immutable() {
        for def in all() {
            if def.server_assigned {
                assert!(!def.mutable_by_client, "{} must not be client-mutable", def.name);
            }
        }
    }

    #[test]
    fn test_defaults_are_pure_functions_of_context() {
        let ctx = DefaultContext {
            auth_method: ClientAuthMethod::ClientSecretBasic,
            signing_algorithm: "RS256".to_string(),
        };
        let alg = lookup(claims::ID_TOKEN_SIGNED_RESPONSE_ALG).unwrap();
        let provider = alg.default_provider.unwrap();
        assert_eq!(provider(&ctx), provider(&ctx));
        assert_eq!(provider(&ctx), ClaimValue::String("RS256".to_string()));
    }
}
