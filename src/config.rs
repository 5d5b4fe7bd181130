//! Environment-based configuration for the registration core.

use anyhow::Result;
use url::Url;

use crate::errors::ConfigError;
use crate::oidc::types::ClientAuthMethod;

/// Base URL under which management URIs are issued
#[derive(Clone)]
pub struct ExternalBase(Url);

/// Whether dynamic registration is accepted
#[derive(Clone)]
pub struct RegistrationEnabled(bool);

/// Default token endpoint auth method for clients that omit one
#[derive(Clone)]
pub struct DefaultAuthMethod(ClientAuthMethod);

/// Lifetime of issued client secrets; None means secrets never expire
#[derive(Clone)]
pub struct ClientSecretTtl(Option<chrono::Duration>);

/// Maximum number of redirect URIs accepted per client
#[derive(Clone)]
pub struct MaxRedirectUris(usize);

/// Main configuration, assembled from environment variables
#[derive(Clone)]
pub struct Config {
    pub external_base: ExternalBase,
    pub storage_backend: String,
    pub registration_enabled: RegistrationEnabled,
    pub default_auth_method: DefaultAuthMethod,
    pub client_secret_ttl: ClientSecretTtl,
    pub max_redirect_uris: MaxRedirectUris,
}

impl Config {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        let external_base: ExternalBase = require_env("EXTERNAL_BASE")?.try_into()?;
        let storage_backend = default_env("STORAGE_BACKEND", "memory");
        let registration_enabled: RegistrationEnabled =
            default_env("REGISTRATION_ENABLED", "true").try_into()?;
        let default_auth_method: DefaultAuthMethod =
            default_env("CLIENT_DEFAULT_AUTH_METHOD", "client_secret_basic").try_into()?;
        let client_secret_ttl: ClientSecretTtl =
            default_env("CLIENT_SECRET_TTL", "never").try_into()?;
        let max_redirect_uris: MaxRedirectUris =
            default_env("CLIENT_MAX_REDIRECT_URIS", "10").try_into()?;

        Ok(Self {
            external_base,
            storage_backend,
            registration_enabled,
            default_auth_method,
            client_secret_ttl,
            max_redirect_uris,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| ConfigError::EnvVarRequired(name.to_string()).into())
}

fn default_env(name: &str, default_value: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default_value.to_string())
}

impl TryFrom<String> for ExternalBase {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Url::parse(&value)
            .map(Self)
            .map_err(|err| ConfigError::ExternalBaseInvalid(value, err).into())
    }
}

impl AsRef<Url> for ExternalBase {
    fn as_ref(&self) -> &Url {
        &self.0
    }
}

impl TryFrom<String> for RegistrationEnabled {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Self(true)),
            "false" | "0" | "no" | "off" => Ok(Self(false)),
            _ => Err(ConfigError::BoolParsingFailed(value).into()),
        }
    }
}

impl AsRef<bool> for RegistrationEnabled {
    fn as_ref(&self) -> &bool {
        &self.0
    }
}

impl TryFrom<String> for DefaultAuthMethod {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ClientAuthMethod::parse(&value)
            .map(Self)
            .ok_or_else(|| ConfigError::AuthMethodParsingFailed(value).into())
    }
}

impl AsRef<ClientAuthMethod> for DefaultAuthMethod {
    fn as_ref(&self) -> &ClientAuthMethod {
        &self.0
    }
}

impl TryFrom<String> for ClientSecretTtl {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() || value == "never" || value == "0" {
            return Ok(Self(None));
        }
        let duration = duration_str::parse(&value).map_err(|err| {
            ConfigError::DurationParsingFailed(value.clone(), err.to_string())
        })?;
        let duration = chrono::Duration::from_std(duration).map_err(|err| {
            ConfigError::DurationParsingFailed(value.clone(), err.to_string())
        })?;
        Ok(Self(Some(duration)))
    }
}

impl AsRef<Option<chrono::Duration>> for ClientSecretTtl {
    fn as_ref(&self) -> &Option<chrono::Duration> {
        &self.0
    }
}

impl TryFrom<String> for MaxRedirectUris {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse::<usize>()
            .map(Self)
            .map_err(|err| ConfigError::RedirectUriLimitParsingFailed(err).into())
    }
}

impl AsRef<usize> for MaxRedirectUris {
    fn as_ref(&self) -> &usize {
        &self.0
    }
}
