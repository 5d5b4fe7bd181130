//! In-memory representation of one client's registration document.
//!
//! [`ClientMetadata`] maps claim names to typed values and enforces the
//! catalog's declared kinds on every mutation. Instances are copy-on-write:
//! `set` produces a new document, so a persisted instance is never mutated
//! in place. This component performs no I/O.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::errors::ValidationFailure;
use crate::oidc::catalog::{self, ValueKind, claims};
use crate::oidc::types::{ClientAuthMethod, ClientType, GrantType, ResponseType};

/// A typed claim value, tagged with the kind the catalog declares
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimValue {
    String(String),
    StringList(Vec<String>),
    Timestamp(i64),
    Boolean(bool),
    UriList(Vec<String>),
}

impl ClaimValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::StringList(_) => ValueKind::StringList,
            Self::Timestamp(_) => ValueKind::Timestamp,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::UriList(_) => ValueKind::UriList,
        }
    }

    /// Coerce a raw JSON value into the declared kind.
    ///
    /// A single string is accepted where a list kind is declared and becomes
    /// a one-element list. Returns `None` when no coercion exists.
    pub fn coerce(kind: ValueKind, raw: &serde_json::Value) -> Option<Self> {
        match kind {
            ValueKind::String => raw.as_str().map(|s| Self::String(s.to_string())),
            ValueKind::StringList | ValueKind::UriList => {
                let items = match raw {
                    serde_json::Value::String(s) => Some(vec![s.clone()]),
                    serde_json::Value::Array(values) => values
                        .iter()
                        .map(|v| v.as_str().map(|s| s.to_string()))
                        .collect::<Option<Vec<_>>>(),
                    _ => None,
                }?;
                match kind {
                    ValueKind::UriList => Some(Self::UriList(items)),
                    _ => Some(Self::StringList(items)),
                }
            }
            ValueKind::Timestamp => raw.as_i64().map(Self::Timestamp),
            ValueKind::Boolean => raw.as_bool().map(Self::Boolean),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::StringList(items) | Self::UriList(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|s| serde_json::Value::String(s.clone()))
                    .collect(),
            ),
            Self::Timestamp(ts) => serde_json::Value::Number((*ts).into()),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::StringList(items) | Self::UriList(items) => Some(items),
            _ => None,
        }
    }

    fn as_timestamp(&self) -> Option<i64> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

/// One client's registration document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientMetadata {
    values: HashMap<&'static str, ClaimValue>,
}

impl ClientMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a claim value by name
    pub fn get(&self, name: &str) -> Option<&ClaimValue> {
        self.values.get(name)
    }

    /// Produce a new document with `name` set to the coerced `value`.
    ///
    /// Fails with `UnknownClaim` for names absent from the catalog and
    /// `TypeMismatch` when the value cannot be coerced to the declared kind.
    pub fn set(
        &self,
        name: &str,
        value: serde_json::Value,
    ) -> Result<ClientMetadata, ValidationFailure> {
        let def = catalog::lookup(name)
            .ok_or_else(|| ValidationFailure::UnknownClaim(name.to_string()))?;
        let coerced =
            ClaimValue::coerce(def.value_kind, &value).ok_or(ValidationFailure::TypeMismatch {
                claim: name.to_string(),
                expected: def.value_kind,
            })?;
        let mut next = self.clone();
        next.values.insert(def.name, coerced);
        Ok(next)
    }

    /// Produce a new document without the named claim
    pub fn without(&self, name: &str) -> ClientMetadata {
        let mut next = self.clone();
        next.values.remove(name);
        next
    }

    /// Insert a value the caller has already coerced against the catalog
    pub(crate) fn insert(&mut self, name: &'static str, value: ClaimValue) {
        debug_assert!(
            catalog::lookup(name).map(|def| def.value_kind) == Some(value.kind()),
            "claim {} inserted with wrong kind",
            name
        );
        self.values.insert(name, value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serialize to an ordered claim-name-to-JSON-value mapping.
    ///
    /// Claims are emitted in catalog order so the artifact shape is stable
    /// across runs.
    pub fn to_claim_set(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        for def in catalog::all() {
            if let Some(value) = self.values.get(def.name) {
                map.insert(def.name.to_string(), value.to_json());
            }
        }
        map
    }

    // Typed accessors for the claims downstream components read.

    pub fn client_id(&self) -> Option<&str> {
        self.get(claims::CLIENT_ID).and_then(ClaimValue::as_str)
    }

    pub fn client_id_issued_at(&self) -> Option<i64> {
        self.get(claims::CLIENT_ID_ISSUED_AT)
            .and_then(ClaimValue::as_timestamp)
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.get(claims::CLIENT_SECRET).and_then(ClaimValue::as_str)
    }

    /// `client_secret_expires_at`; 0 means the secret never expires
    pub fn client_secret_expires_at(&self) -> Option<i64> {
        self.get(claims::CLIENT_SECRET_EXPIRES_AT)
            .and_then(ClaimValue::as_timestamp)
    }

    pub fn client_name(&self) -> Option<&str> {
        self.get(claims::CLIENT_NAME).and_then(ClaimValue::as_str)
    }

    pub fn redirect_uris(&self) -> Option<&[String]> {
        self.get(claims::REDIRECT_URIS).and_then(ClaimValue::as_list)
    }

    pub fn token_endpoint_auth_method(&self) -> Option<ClientAuthMethod> {
        self.get(claims::TOKEN_ENDPOINT_AUTH_METHOD)
            .and_then(ClaimValue::as_str)
            .and_then(ClientAuthMethod::parse)
    }

    /// Grant types, dropping any value outside the vocabulary (validation
    /// guarantees there are none in a persisted document)
    pub fn grant_types(&self) -> Vec<GrantType> {
        self.get(claims::GRANT_TYPES)
            .and_then(ClaimValue::as_list)
            .map(|items| items.iter().filter_map(|s| GrantType::parse(s)).collect())
            .unwrap_or_default()
    }

    pub fn response_types(&self) -> Vec<ResponseType> {
        self.get(claims::RESPONSE_TYPES)
            .and_then(ClaimValue::as_list)
            .map(|items| items.iter().filter_map(|s| ResponseType::parse(s)).collect())
            .unwrap_or_default()
    }

    pub fn scope(&self) -> Option<&str> {
        self.get(claims::SCOPE).and_then(ClaimValue::as_str)
    }

    pub fn id_token_signed_response_alg(&self) -> Option<&str> {
        self.get(claims::ID_TOKEN_SIGNED_RESPONSE_ALG)
            .and_then(ClaimValue::as_str)
    }

    pub fn registration_access_token(&self) -> Option<&str> {
        self.get(claims::REGISTRATION_ACCESS_TOKEN)
            .and_then(ClaimValue::as_str)
    }

    pub fn registration_client_uri(&self) -> Option<&str> {
        self.get(claims::REGISTRATION_CLIENT_URI)
            .and_then(ClaimValue::as_str)
    }

    /// Confidential when a client secret was issued, public otherwise
    pub fn client_type(&self) -> ClientType {
        if self.client_secret().is_some() {
            ClientType::Confidential
        } else {
            ClientType::Public
        }
    }

    /// Whether the client can still authenticate at the token endpoint:
    /// secret-bearing auth methods need a present, unexpired secret, other
    /// methods always pass.
    pub fn authenticatable(&self, now: DateTime<Utc>) -> bool {
        match self.token_endpoint_auth_method() {
            Some(method) if method.requires_secret() => {
                self.client_secret().is_some() && !self.secret_expired(now)
            }
            _ => true,
        }
    }

    /// Whether the client secret has passed its expiry at `now`.
    ///
    /// False when no secret exists or `client_secret_expires_at` is 0.
    pub fn secret_expired(&self, now: DateTime<Utc>) -> bool {
        if self.client_secret().is_none() {
            return false;
        }
        match self.client_secret_expires_at() {
            Some(0) | None => false,
            Some(expires_at) => expires_at <= now.timestamp(),
        }
    }
}

impl Serialize for ClientMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let claim_set = self.to_claim_set();
        let mut map = serializer.serialize_map(Some(claim_set.len()))?;
        for (name, value) in &claim_set {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
