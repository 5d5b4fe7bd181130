//! Fixed vocabularies for OIDC client metadata claims.
//!
//! Defines the grant type, response type, and token endpoint auth method
//! enumerations along with scope string helpers.

use serde::{Deserialize, Serialize};

/// OAuth 2.0 grant types a client may register for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
    RefreshToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "authorization_code" => Some(Self::AuthorizationCode),
            "client_credentials" => Some(Self::ClientCredentials),
            "refresh_token" => Some(Self::RefreshToken),
            _ => None,
        }
    }
}

/// OAuth 2.0 response types a client may register for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Code,
    Token,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Token => "token",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "code" => Some(Self::Code),
            "token" => Some(Self::Token),
            _ => None,
        }
    }
}

/// Token endpoint client authentication methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    ClientSecretBasic,
    ClientSecretPost,
    ClientSecretJwt,
    PrivateKeyJwt,
    None,
}

impl ClientAuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientSecretBasic => "client_secret_basic",
            Self::ClientSecretPost => "client_secret_post",
            Self::ClientSecretJwt => "client_secret_jwt",
            Self::PrivateKeyJwt => "private_key_jwt",
            Self::None => "none",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "client_secret_basic" => Some(Self::ClientSecretBasic),
            "client_secret_post" => Some(Self::ClientSecretPost),
            "client_secret_jwt" => Some(Self::ClientSecretJwt),
            "private_key_jwt" => Some(Self::PrivateKeyJwt),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Whether this method authenticates with a shared client secret
    pub fn requires_secret(&self) -> bool {
        matches!(
            self,
            Self::ClientSecretBasic | Self::ClientSecretPost | Self::ClientSecretJwt
        )
    }
}

/// Client type derived from credential shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Public,
    Confidential,
}

/// Validate a single scope token against the allowed character set
pub fn valid_scope_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ':')
}

/// Normalize a scope string: split on whitespace, drop duplicates while
/// preserving first-occurrence order, rejoin with single spaces.
pub fn normalize_scope(scope: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    scope
        .split_whitespace()
        .filter(|token| seen.insert(token.to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_method_secret_requirements() {
        assert!(ClientAuthMethod::ClientSecretBasic.requires_secret());
        assert!(ClientAuthMethod::ClientSecretPost.requires_secret());
        assert!(ClientAuthMethod::ClientSecretJwt.requires_secret());
        assert!(!ClientAuthMethod::PrivateKeyJwt.requires_secret());
        assert!(!ClientAuthMethod::None.requires_secret());
    }

    #[test]
    fn test_vocabulary_round_trips() {
        for method in [
            ClientAuthMethod::ClientSecretBasic,
            ClientAuthMethod::ClientSecretPost,
            ClientAuthMethod::ClientSecretJwt,
            ClientAuthMethod::PrivateKeyJwt,
            ClientAuthMethod::None,
        ] {
            assert_eq!(ClientAuthMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(GrantType::parse("authorization_code"), Some(GrantType::AuthorizationCode));
        assert_eq!(GrantType::parse("implicit"), None);
        assert_eq!(ResponseType::parse("code"), Some(ResponseType::Code));
    }

    #[test]
    fn test_normalize_scope_deduplicates_in_order() {
        assert_eq!(normalize_scope("openid  profile openid email"), "openid profile email");
        assert_eq!(normalize_scope(""), "");
        assert_eq!(normalize_scope("   "), "");
    }

    #[test]
    fn test_scope_token_charset() {
        assert!(valid_scope_token("openid"));
        assert!(valid_scope_token("read:messages"));
        assert!(valid_scope_token("offline_access"));
        assert!(!valid_scope_token("bad scope"));
        assert!(!valid_scope_token(""));
        assert!(!valid_scope_token("qu\"ote"));
    }
}
