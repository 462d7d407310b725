//! Configuration for the account core.
//!
//! Built once at startup and handed to constructors. Nothing in this crate
//! reads flags or environment variables on its own.

use std::fmt;

use flow_db::Provider;

/// Top-level configuration of the account core.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    pub jwt: JwtConfig,
    pub oauth2: OAuth2Config,
}

/// Bearer token settings.
#[derive(Clone)]
pub struct JwtConfig {
    /// Value of the `iss` claim, checked on every request
    pub issuer: String,
    /// HMAC signing secret
    pub secret: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("secret", &"********")
            .finish()
    }
}

/// OAuth2 application credentials issued by a provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    /// Build credentials, returning `None` when either half is empty.
    ///
    /// A provider without credentials is treated as not offered at all.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Option<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return None;
        }
        Some(Self {
            client_id,
            client_secret,
        })
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"********")
            .finish()
    }
}

/// Credentials per provider. `None` disables the provider.
#[derive(Debug, Clone, Default)]
pub struct OAuth2Config {
    pub github: Option<ClientCredentials>,
    pub google: Option<ClientCredentials>,
    pub twitter: Option<ClientCredentials>,
}

impl OAuth2Config {
    pub fn credentials(&self, provider: Provider) -> Option<&ClientCredentials> {
        match provider {
            Provider::GitHub => self.github.as_ref(),
            Provider::Google => self.google.as_ref(),
            Provider::Twitter => self.twitter.as_ref(),
        }
    }

    /// Providers with credentials configured.
    pub fn enabled(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.credentials(*p).is_some())
            .collect()
    }
}
