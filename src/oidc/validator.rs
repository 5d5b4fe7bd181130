//! Validation and normalization pipeline for client registration claims.
//!
//! [`MetadataValidator::validate`] applies a fixed-order rule pipeline over
//! an untyped claim mapping: unknown-claim rejection, read-only enforcement,
//! type coercion, per-field syntax, defaulting, update merge, and
//! cross-field consistency. All failures are collected into one
//! [`ValidationFailureSet`] so a single round trip reports every problem.
//!
//! Validation is pure: identical inputs always produce an identical result
//! or identical failure set. The clock and random sources live in the
//! lifecycle manager, never here.

use url::Url;

use crate::errors::{ValidationFailure, ValidationFailureSet};
use crate::oidc::catalog::{self, ClaimDefinition, DefaultContext, claims};
use crate::oidc::collaborators::SigningAlgorithmRegistry;
use crate::oidc::metadata::{ClaimValue, ClientMetadata};
use crate::oidc::types::{
    ClientAuthMethod, GrantType, ResponseType, normalize_scope, valid_scope_token,
};

/// Raw claim mapping as delivered by the registration endpoint
pub type RawClaims = serde_json::Map<String, serde_json::Value>;

/// Applies the registration validation pipeline
pub struct MetadataValidator<'a> {
    algorithms: &'a dyn SigningAlgorithmRegistry,
    default_auth_method: ClientAuthMethod,
    max_redirect_uris: usize,
}

impl<'a> MetadataValidator<'a> {
    pub fn new(algorithms: &'a dyn SigningAlgorithmRegistry) -> Self {
        Self {
            algorithms,
            default_auth_method: ClientAuthMethod::ClientSecretBasic,
            max_redirect_uris: 10,
        }
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

    /// Validate and normalize `raw` into a [`ClientMetadata`].
    ///
    /// On update, `existing` supplies the stored document: claims omitted
    /// from `raw` retain their existing values, and server-assigned claims
    /// carry over untouched. Defaults from the catalog fill claims absent
    /// from both.
    pub fn validate(
        &self,
        raw: &RawClaims,
        existing: Option<&ClientMetadata>,
    ) -> Result<ClientMetadata, ValidationFailureSet> {
        let mut failures = ValidationFailureSet::new();
        let mut accepted: Vec<(&'static ClaimDefinition, ClaimValue)> = Vec::new();

        // serde_json maps iterate in key order, so failure reporting is
        // reproducible for identical input.
        for (name, value) in raw {
            let Some(def) = catalog::lookup(name) else {
                failures.push(ValidationFailure::UnknownClaim(name.clone()));
                continue;
            };
            if def.server_assigned {
                failures.push(ValidationFailure::ReadOnlyClaim(name.clone()));
                continue;
            }
            let Some(coerced) = ClaimValue::coerce(def.value_kind, value) else {
                failures.push(ValidationFailure::TypeMismatch {
                    claim: name.clone(),
                    expected: def.value_kind,
                });
                continue;
            };
            if let Some(normalized) = self.check_field(def, coerced, &mut failures) {
                accepted.push((def, normalized));
            }
        }

        // Merge over the existing document, then fill catalog defaults for
        // claims absent from both.
        let mut merged = existing.cloned().unwrap_or_default();
        for (def, value) in accepted {
            merged.insert(def.name, value);
        }
        let ctx = DefaultContext {
            auth_method: self.default_auth_method,
            signing_algorithm: self.algorithms.default_algorithm().to_string(),
        };
        for def in catalog::all() {
            if merged.get(def.name).is_none() {
                if let Some(provider) = def.default_provider {
                    merged.insert(def.name, provider(&ctx));
                }
            }
        }

        self.check_consistency(&merged, existing.is_some(), &mut failures);

        failures.into_result(merged)
    }

    /// Per-field syntactic rules; returns the (possibly normalized) value
    /// when the claim passes.
    fn check_field(
        &self,
        def: &'static ClaimDefinition,
        value: ClaimValue,
        failures: &mut ValidationFailureSet,
    ) -> Option<ClaimValue> {
        match def.name {
            claims::REDIRECT_URIS => {
                let ClaimValue::UriList(uris) = &value else {
                    return Some(value);
                };
                let before = failures.len();
                if uris.is_empty() {
                    failures.push(ValidationFailure::invalid_value(
                        def.name,
                        "must contain at least one URI",
                    ));
                }
                if uris.len() > self.max_redirect_uris {
                    failures.push(ValidationFailure::invalid_value(
                        def.name,
                        format!(
                            "too many redirect URIs: {} (max: {})",
                            uris.len(),
                            self.max_redirect_uris
                        ),
                    ));
                }
                for uri in uris {
                    match Url::parse(uri) {
                        Ok(parsed) if parsed.fragment().is_some() => {
                            failures.push(ValidationFailure::invalid_value(
                                def.name,
                                format!("'{}' must not contain a fragment", uri),
                            ));
                        }
                        Ok(_) => {}
                        Err(err) => {
                            failures.push(ValidationFailure::invalid_value(
                                def.name,
                                format!("'{}' is not an absolute URI: {}", uri, err),
                            ));
                        }
                    }
                }
                (failures.len() == before).then_some(value)
            }
            claims::GRANT_TYPES => {
                self.check_vocabulary(def, value, failures, |item| GrantType::parse(item).is_some())
            }
            claims::RESPONSE_TYPES => self.check_vocabulary(def, value, failures, |item| {
                ResponseType::parse(item).is_some()
            }),
            claims::TOKEN_ENDPOINT_AUTH_METHOD => {
                let ClaimValue::String(method) = &value else {
                    return Some(value);
                };
                if ClientAuthMethod::parse(method).is_none() {
                    failures.push(ValidationFailure::invalid_value(
                        def.name,
                        format!("unknown auth method '{}'", method),
                    ));
                    return None;
                }
                Some(value)
            }
            claims::ID_TOKEN_SIGNED_RESPONSE_ALG => {
                let ClaimValue::String(alg) = &value else {
                    return Some(value);
                };
                if !self.algorithms.is_supported(alg) {
                    failures.push(ValidationFailure::invalid_value(
                        def.name,
                        format!("unsupported signing algorithm '{}'", alg),
                    ));
                    return None;
                }
                Some(value)
            }
            claims::SCOPE => {
                let ClaimValue::String(scope) = &value else {
                    return Some(value);
                };
                let invalid: Vec<_> = scope
                    .split_whitespace()
                    .filter(|token| !valid_scope_token(token))
                    .collect();
                if !invalid.is_empty() {
                    failures.push(ValidationFailure::invalid_value(
                        def.name,
                        format!("invalid scope tokens: {}", invalid.join(" ")),
                    ));
                    return None;
                }
                Some(ClaimValue::String(normalize_scope(scope)))
            }
            _ => Some(value),
        }
    }

    fn check_vocabulary(
        &self,
        def: &'static ClaimDefinition,
        value: ClaimValue,
        failures: &mut ValidationFailureSet,
        known: impl Fn(&str) -> bool,
    ) -> Option<ClaimValue> {
        let Some(items) = (match &value {
            ClaimValue::StringList(items) => Some(items),
            _ => None,
        }) else {
            return Some(value);
        };
        let before = failures.len();
        if items.is_empty() {
            failures.push(ValidationFailure::invalid_value(
                def.name,
                "must contain at least one value",
            ));
        }
        for item in items {
            if !known(item) {
                failures.push(ValidationFailure::invalid_value(
                    def.name,
                    format!("unknown value '{}'", item),
                ));
            }
        }
        (failures.len() == before).then_some(value)
    }

    /// Cross-field consistency rules over the merged, defaulted document
    fn check_consistency(
        &self,
        merged: &ClientMetadata,
        has_existing: bool,
        failures: &mut ValidationFailureSet,
    ) {
        if merged.grant_types().contains(&GrantType::AuthorizationCode)
            && !merged.response_types().contains(&ResponseType::Code)
        {
            failures.push(ValidationFailure::InconsistentMetadata(
                "the authorization_code grant type requires the code response type".to_string(),
            ));
        }

        // The create path issues the secret after validation, so presence is
        // only checked when validating against a stored document.
        if has_existing {
            if let Some(method) = merged.token_endpoint_auth_method() {
                if method.requires_secret() && merged.client_secret().is_none() {
                    failures.push(ValidationFailure::InconsistentMetadata(format!(
                        "auth method {} requires a client secret",
                        method.as_str()
                    )));
                }
            }
        }

        if let (Some(issued_at), Some(expires_at)) =
            (merged.client_id_issued_at(), merged.client_secret_expires_at())
        {
            if expires_at != 0 && expires_at <= issued_at {
                failures.push(ValidationFailure::InconsistentMetadata(
                    "client_secret_expires_at must be 0 or later than client_id_issued_at"
                        .to_string(),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oidc::collaborators::StaticAlgorithmRegistry;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawClaims {
        value.as_object().cloned().unwrap()
    }

    fn validator(registry: &StaticAlgorithmRegistry) -> MetadataValidator<'_> {
        MetadataValidator::new(registry)
    }

    #[test]
    fn test_valid_request_normalizes_and_defaults() {
        let registry = StaticAlgorithmRegistry::default();
        let metadata = validator(&registry)
            .validate(
                &raw(json!({
                    "client_name": "Test Client",
                    "redirect_uris": ["https://example.com/callback"],
                    "scope": "openid profile openid",
                })),
                None,
            )
            .unwrap();

        assert_eq!(metadata.client_name(), Some("Test Client"));
        assert_eq!(metadata.scope(), Some("openid profile"));
        // Catalog defaults fill what the request omitted.
        assert_eq!(metadata.grant_types(), vec![GrantType::AuthorizationCode]);
        assert_eq!(metadata.response_types(), vec![ResponseType::Code]);
        assert_eq!(
            metadata.token_endpoint_auth_method(),
            Some(ClientAuthMethod::ClientSecretBasic)
        );
        assert_eq!(metadata.id_token_signed_response_alg(), Some("RS256"));
    }

    #[test]
    fn test_unknown_claim_is_exactly_one_failure() {
        let registry = StaticAlgorithmRegistry::default();
        let failures = validator(&registry)
            .validate(&raw(json!({"software_statement": "eyJ..."})), None)
            .unwrap_err();
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures.iter().next(),
            Some(&ValidationFailure::UnknownClaim("software_statement".to_string()))
        );
    }

    #[test]
    fn test_server_assigned_claims_rejected_from_input() {
        let registry = StaticAlgorithmRegistry::default();
        let failures = validator(&registry)
            .validate(
                &raw(json!({
                    "client_id": "attacker-chosen",
                    "registration_access_token": "forged",
                })),
                None,
            )
            .unwrap_err();
        let collected: Vec<_> = failures.iter().cloned().collect();
        assert!(collected.contains(&ValidationFailure::ReadOnlyClaim("client_id".to_string())));
        assert!(collected.contains(&ValidationFailure::ReadOnlyClaim(
            "registration_access_token".to_string()
        )));
    }

    #[test]
    fn test_grant_response_pairing() {
        let registry = StaticAlgorithmRegistry::default();
        let failures = validator(&registry)
            .validate(
                &raw(json!({
                    "grant_types": ["authorization_code"],
                    "response_types": ["token"],
                })),
                None,
            )
            .unwrap_err();
        assert!(failures
            .iter()
            .any(|f| matches!(f, ValidationFailure::InconsistentMetadata(_))));

        // The reverse direction is additive: code response without the
        // authorization_code grant is allowed.
        let metadata = validator(&registry)
            .validate(
                &raw(json!({
                    "grant_types": ["client_credentials"],
                    "response_types": ["code"],
                })),
                None,
            )
            .unwrap();
        assert_eq!(metadata.grant_types(), vec![GrantType::ClientCredentials]);
    }

    #[test]
    fn test_redirect_uri_rules() {
        let registry = StaticAlgorithmRegistry::default();
        let failures = validator(&registry)
            .validate(
                &raw(json!({
                    "redirect_uris": [
                        "https://example.com/cb#fragment",
                        "/relative/path",
                        "https://example.com/ok",
                    ],
                })),
                None,
            )
            .unwrap_err();
        assert_eq!(failures.len(), 2);

        let failures = validator(&registry)
            .validate(&raw(json!({"redirect_uris": []})), None)
            .unwrap_err();
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn test_redirect_uri_count_cap() {
        let registry = StaticAlgorithmRegistry::default();
        let uris: Vec<String> = (0..3)
            .map(|i| format!("https://example.com/cb/{}", i))
            .collect();
        let failures = validator(&registry)
            .with_max_redirect_uris(2)
            .validate(&raw(json!({"redirect_uris": uris})), None)
            .unwrap_err();
        assert!(failures.iter().any(
            |f| matches!(f, ValidationFailure::InvalidValue { claim, .. } if claim == "redirect_uris")
        ));
    }

    #[test]
    fn test_type_mismatch_and_single_string_coercion() {
        let registry = StaticAlgorithmRegistry::default();
        let failures = validator(&registry)
            .validate(&raw(json!({"client_name": 42})), None)
            .unwrap_err();
        assert!(matches!(
            failures.iter().next(),
            Some(ValidationFailure::TypeMismatch { claim, .. }) if claim == "client_name"
        ));

        let metadata = validator(&registry)
            .validate(
                &raw(json!({"redirect_uris": "https://example.com/cb"})),
                None,
            )
            .unwrap();
        assert_eq!(
            metadata.redirect_uris(),
            Some(&["https://example.com/cb".to_string()][..])
        );
    }

    #[test]
    fn test_unsupported_signing_algorithm() {
        let registry = StaticAlgorithmRegistry::new(vec!["ES256".to_string()], "ES256".to_string());
        let failures = validator(&registry)
            .validate(&raw(json!({"id_token_signed_response_alg": "RS256"})), None)
            .unwrap_err();
        assert_eq!(failures.len(), 1);

        let metadata = validator(&registry).validate(&raw(json!({})), None).unwrap();
        assert_eq!(metadata.id_token_signed_response_alg(), Some("ES256"));
    }

    #[test]
    fn test_failures_are_aggregated_not_short_circuited() {
        let registry = StaticAlgorithmRegistry::default();
        let failures = validator(&registry)
            .validate(
                &raw(json!({
                    "bogus_claim": true,
                    "client_id": "nope",
                    "client_name": 42,
                    "grant_types": ["implicit"],
                })),
                None,
            )
            .unwrap_err();
        assert_eq!(failures.len(), 4);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let registry = StaticAlgorithmRegistry::default();
        let input = raw(json!({
            "zz_unknown": 1,
            "client_id": "nope",
            "grant_types": ["authorization_code"],
            "response_types": ["token"],
        }));
        let first = validator(&registry).validate(&input, None).unwrap_err();
        let second = validator(&registry).validate(&input, None).unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn test_update_merge_retains_omitted_claims() {
        let registry = StaticAlgorithmRegistry::default();
        // A public client, so the merged document stays consistent without
        // the secret the lifecycle manager would normally issue.
        let existing = validator(&registry)
            .validate(
                &raw(json!({
                    "client_name": "Original",
                    "redirect_uris": ["https://example.com/cb"],
                    "scope": "openid",
                    "token_endpoint_auth_method": "none",
                })),
                None,
            )
            .unwrap();

        let updated = validator(&registry)
            .validate(&raw(json!({"client_name": "Renamed"})), Some(&existing))
            .unwrap();

        assert_eq!(updated.client_name(), Some("Renamed"));
        assert_eq!(
            updated.redirect_uris(),
            Some(&["https://example.com/cb".to_string()][..])
        );
        assert_eq!(updated.scope(), Some("openid"));
    }

    #[test]
    fn test_secret_required_by_auth_method_on_revalidation() {
        let registry = StaticAlgorithmRegistry::default();
        let existing = validator(&registry)
            .validate(
                &raw(json!({"token_endpoint_auth_method": "client_secret_basic"})),
                None,
            )
            .unwrap();

        // Stored documents carry the issued secret; stripping it and
        // re-validating for a secret-bearing auth method must fail.
        let stripped = existing.without("client_secret");
        let failures = validator(&registry)
            .validate(&raw(json!({})), Some(&stripped))
            .unwrap_err();
        assert!(failures
            .iter()
            .any(|f| matches!(f, ValidationFailure::InconsistentMetadata(_))));

        // A public client needs no secret.
        let public = validator(&registry)
            .validate(
                &raw(json!({"token_endpoint_auth_method": "none"})),
                None,
            )
            .unwrap();
        let revalidated = validator(&registry).validate(&raw(json!({})), Some(&public));
        assert!(revalidated.is_ok());
    }
}
