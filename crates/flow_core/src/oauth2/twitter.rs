use async_trait::async_trait;
use flow_db::Provider;
use serde::Deserialize;

use super::{OAuth2Client, Owner, RefreshedToken, fetch_json, request_refresh, trim_base};
use crate::config::ClientCredentials;
use crate::error::{ProviderError, ProviderResult};

const API_BASE: &str = "https://api.twitter.com";

#[derive(Debug, Deserialize)]
struct UsersMe {
    data: TwitterUser,
}

#[derive(Debug, Deserialize)]
struct TwitterUser {
    id: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct VerifyCredentials {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TwitterClient {
    http: reqwest::Client,
    credentials: ClientCredentials,
    api_base: String,
}

impl TwitterClient {
    pub fn new(http: reqwest::Client, credentials: ClientCredentials) -> Self {
        Self::with_base_url(http, credentials, API_BASE)
    }

    pub fn with_base_url(
        http: reqwest::Client,
        credentials: ClientCredentials,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            api_base: trim_base(api_base),
        }
    }
}

#[async_trait]
impl OAuth2Client for TwitterClient {
    fn provider(&self) -> Provider {
        Provider::Twitter
    }

    async fn get_owner(&self, access_token: &str) -> ProviderResult<Owner> {
        let request = self
            .http
            .get(format!("{}/2/users/me", self.api_base))
            .bearer_auth(access_token);
        let me: UsersMe = fetch_json(Provider::Twitter, request).await?;
        Ok(Owner {
            id: me.data.id,
            name: me.data.username,
            email: None,
        })
    }

    async fn get_owner_email(&self, access_token: &str) -> ProviderResult<String> {
        let request = self
            .http
            .get(format!(
                "{}/1.1/account/verify_credentials.json",
                self.api_base
            ))
            .query(&[("include_email", "true")])
            .bearer_auth(access_token);
        let credentials: VerifyCredentials = fetch_json(Provider::Twitter, request).await?;
        credentials
            .email
            .filter(|e| !e.is_empty())
            .ok_or(ProviderError::MissingEmail {
                provider: Provider::Twitter,
            })
    }

    async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<RefreshedToken> {
        let request = self
            .http
            .post(format!("{}/2/oauth2/token", self.api_base))
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
                ("client_id", self.credentials.client_id.as_str()),
            ]);
        request_refresh(Provider::Twitter, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TwitterClient {
        TwitterClient::with_base_url(
            reqwest::Client::new(),
            ClientCredentials::new("tw-id", "tw-secret").unwrap(),
            server.uri(),
        )
    }

    #[tokio::test]
    async fn test_get_owner() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2/users/me"))
            .and(header("authorization", "Bearer tw-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "2244994945", "name": "Ann", "username": "ann_x"}
            })))
            .mount(&server)
            .await;

        let owner = client(&server).get_owner("tw-token").await.unwrap();
        assert_eq!(
            owner,
            Owner {
                id: "2244994945".to_string(),
                name: "ann_x".to_string(),
                email: None,
            }
        );
    }

    #[tokio::test]
    async fn test_get_owner_email_asks_for_email() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/account/verify_credentials.json"))
            .and(query_param("include_email", "true"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id_str": "2244994945", "email": "ann@x.com"})),
            )
            .mount(&server)
            .await;

        let email = client(&server).get_owner_email("tw-token").await.unwrap();
        assert_eq!(email, "ann@x.com");
    }

    #[tokio::test]
    async fn test_get_owner_email_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/1.1/account/verify_credentials.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id_str": "1"})))
            .mount(&server)
            .await;

        let err = client(&server).get_owner_email("tw-token").await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingEmail { .. }));
    }

    #[tokio::test]
    async fn test_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/oauth2/token"))
            .and(header_exists("authorization"))
            .and(body_string_contains("refresh_token=tw-old"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "bearer",
                "expires_in": 7200,
                "access_token": "tw-new",
                "scope": "users.read offline.access",
                "refresh_token": "tw-refresh-new"
            })))
            .mount(&server)
            .await;

        let refreshed = client(&server).refresh_token("tw-old").await.unwrap();
        assert_eq!(refreshed.access_token, "tw-new");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("tw-refresh-new"));
        assert!(refreshed.access_token_expires_at.is_some());
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/oauth2/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).refresh_token("tw-old").await.unwrap_err();
        assert!(matches!(err, ProviderError::RefreshFailed { .. }));
    }
}
