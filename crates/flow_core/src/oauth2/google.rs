use async_trait::async_trait;
use flow_db::Provider;
use serde::Deserialize;

use super::{OAuth2Client, Owner, RefreshedToken, fetch_json, request_refresh, trim_base};
use crate::config::ClientCredentials;
use crate::error::{ProviderError, ProviderResult};

const API_BASE: &str = "https://www.googleapis.com";
const TOKEN_BASE: &str = "https://oauth2.googleapis.com";

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    credentials: ClientCredentials,
    api_base: String,
    token_base: String,
}

impl GoogleClient {
    pub fn new(http: reqwest::Client, credentials: ClientCredentials) -> Self {
        Self::with_base_urls(http, credentials, API_BASE, TOKEN_BASE)
    }

    pub fn with_base_urls(
        http: reqwest::Client,
        credentials: ClientCredentials,
        api_base: impl Into<String>,
        token_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            api_base: trim_base(api_base),
            token_base: trim_base(token_base),
        }
    }

    async fn user_info(&self, access_token: &str) -> ProviderResult<GoogleUserInfo> {
        let request = self
            .http
            .get(format!("{}/oauth2/v2/userinfo", self.api_base))
            .bearer_auth(access_token);
        fetch_json(Provider::Google, request).await
    }
}

#[async_trait]
impl OAuth2Client for GoogleClient {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn get_owner(&self, access_token: &str) -> ProviderResult<Owner> {
        let info = self.user_info(access_token).await?;
        Ok(Owner {
            id: info.id,
            name: info.name,
            email: info.email.filter(|e| !e.is_empty()),
        })
    }

    /// Google returns the email with the identity, so this is the same call.
    async fn get_owner_email(&self, access_token: &str) -> ProviderResult<String> {
        self.get_owner(access_token)
            .await?
            .email
            .ok_or(ProviderError::MissingEmail {
                provider: Provider::Google,
            })
    }

    async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<RefreshedToken> {
        let request = self
            .http
            .post(format!("{}/token", self.token_base))
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ]);
        request_refresh(Provider::Google, request).await
    }
}
