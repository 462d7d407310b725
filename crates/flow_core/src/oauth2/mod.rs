//! OAuth2 provider clients.
//!
//! One [`OAuth2Client`] trait with an implementation per provider. The
//! clients only talk to the provider's HTTP API; storing what they return is
//! the orchestrator's job.

mod github;
mod google;
mod twitter;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use flow_db::Provider;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::OAuth2Config;
use crate::error::{ProviderError, ProviderResult};

pub use github::{GitHubClient, select_primary_email};
pub use google::GoogleClient;
pub use twitter::TwitterClient;

/// The provider's view of the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    /// Provider-assigned identifier
    pub id: String,
    pub name: String,
    /// Present when the identity endpoint already returns it (Google)
    pub email: Option<String>,
}

/// Result of exchanging a refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    pub access_token: String,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    /// `None` when the provider did not rotate the refresh token
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

/// Capabilities every provider offers.
#[async_trait]
pub trait OAuth2Client: Send + Sync + fmt::Debug {
    fn provider(&self) -> Provider;

    /// Exchange an access token for the owner's identity.
    async fn get_owner(&self, access_token: &str) -> ProviderResult<Owner>;

    /// Look up the owner's email address.
    async fn get_owner_email(&self, access_token: &str) -> ProviderResult<String>;

    /// Obtain a fresh access token. Not retried on failure.
    async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<RefreshedToken>;
}

/// HTTP client shared by all provider clients.
pub fn build_http_client() -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("flow-users/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ProviderError::Client)
}

/// Clients for the configured providers, keyed by [`Provider`].
#[derive(Clone, Default)]
pub struct OAuth2Clients {
    clients: HashMap<Provider, Arc<dyn OAuth2Client>>,
}

impl OAuth2Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client for every provider that has credentials.
    pub fn from_config(config: &OAuth2Config) -> ProviderResult<Self> {
        let http = build_http_client()?;
        let mut clients = Self::new();

        if let Some(credentials) = &config.github {
            clients = clients.with_client(Arc::new(GitHubClient::new(
                http.clone(),
                credentials.clone(),
            )));
        }
        if let Some(credentials) = &config.google {
            clients = clients.with_client(Arc::new(GoogleClient::new(
                http.clone(),
                credentials.clone(),
            )));
        }
        if let Some(credentials) = &config.twitter {
            clients = clients.with_client(Arc::new(TwitterClient::new(
                http.clone(),
                credentials.clone(),
            )));
        }

        tracing::info!(providers = ?clients.enabled(), "OAuth2 providers configured");
        Ok(clients)
    }

    /// Register a client, replacing any previous one for the same provider.
    pub fn with_client(mut self, client: Arc<dyn OAuth2Client>) -> Self {
        self.clients.insert(client.provider(), client);
        self
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn OAuth2Client>> {
        self.clients.get(&provider).cloned()
    }

    pub fn enabled(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.clients.contains_key(p))
            .collect()
    }
}

impl fmt::Debug for OAuth2Clients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Clients")
            .field("enabled", &self.enabled())
            .finish()
    }
}

/// Send a request and decode a successful JSON response.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: Provider,
    request: RequestBuilder,
) -> ProviderResult<T> {
    let response = request
        .send()
        .await
        .map_err(|source| ProviderError::Http { provider, source })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| ProviderError::Http { provider, source })?;

    if !status.is_success() {
        tracing::debug!(%provider, status = status.as_u16(), "provider rejected request");
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| ProviderError::Decode { provider, source })
}

/// Token endpoint response, shared by the three providers.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default, alias = "expire_in")]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default, alias = "refresh_token_expire_in")]
    refresh_token_expires_in: Option<i64>,
    /// GitHub reports failures with a 200 and an `error` field
    #[serde(default)]
    error: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_refreshed(
        self,
        provider: Provider,
        now: DateTime<Utc>,
    ) -> ProviderResult<RefreshedToken> {
        if let Some(error) = self.error {
            return Err(ProviderError::RefreshFailed {
                provider,
                reason: error,
            });
        }
        if self.access_token.is_empty() {
            return Err(ProviderError::RefreshFailed {
                provider,
                reason: "response carried no access token".to_string(),
            });
        }

        Ok(RefreshedToken {
            access_token: self.access_token,
            access_token_expires_at: expiry_from(now, self.expires_in),
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            refresh_token_expires_at: expiry_from(now, self.refresh_token_expires_in),
        })
    }
}

/// Send a refresh request, folding any failure into `RefreshFailed`.
pub(crate) async fn request_refresh(
    provider: Provider,
    request: RequestBuilder,
) -> ProviderResult<RefreshedToken> {
    let response: TokenResponse = fetch_json(provider, request).await.map_err(|e| {
        tracing::warn!(%provider, error = %e, "token refresh failed");
        ProviderError::RefreshFailed {
            provider,
            reason: e.to_string(),
        }
    })?;
    response.into_refreshed(provider, Utc::now())
}

/// Turn a relative lifetime in seconds into an absolute instant.
///
/// Zero or negative lifetimes mean the provider gave no expiry.
pub fn expiry_from(now: DateTime<Utc>, expires_in: Option<i64>) -> Option<DateTime<Utc>> {
    expires_in
        .filter(|secs| *secs > 0)
        .map(|secs| now + Duration::seconds(secs))
}

pub(crate) fn trim_base(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}
