use async_trait::async_trait;
use flow_db::Provider;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use super::{OAuth2Client, Owner, RefreshedToken, fetch_json, request_refresh, trim_base};
use crate::config::ClientCredentials;
use crate::error::{ProviderError, ProviderResult};

const API_BASE: &str = "https://api.github.com";
const OAUTH_BASE: &str = "https://github.com";

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitHubEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
}

/// Pick the address GitHub marks as primary.
pub fn select_primary_email(emails: Vec<GitHubEmail>) -> ProviderResult<String> {
    emails
        .into_iter()
        .find(|e| e.primary)
        .map(|e| e.email)
        .ok_or(ProviderError::PrimaryEmailNotFound {
            provider: Provider::GitHub,
        })
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    credentials: ClientCredentials,
    api_base: String,
    oauth_base: String,
}

impl GitHubClient {
    pub fn new(http: reqwest::Client, credentials: ClientCredentials) -> Self {
        Self::with_base_urls(http, credentials, API_BASE, OAUTH_BASE)
    }

    pub fn with_base_urls(
        http: reqwest::Client,
        credentials: ClientCredentials,
        api_base: impl Into<String>,
        oauth_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            credentials,
            api_base: trim_base(api_base),
            oauth_base: trim_base(oauth_base),
        }
    }

    fn api_get(&self, path: &str, access_token: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}{}", self.api_base, path))
            .header(AUTHORIZATION, format!("token {access_token}"))
            .header(ACCEPT, "application/vnd.github+json")
    }
}

#[async_trait]
impl OAuth2Client for GitHubClient {
    fn provider(&self) -> Provider {
        Provider::GitHub
    }

    async fn get_owner(&self, access_token: &str) -> ProviderResult<Owner> {
        let user: GitHubUser =
            fetch_json(Provider::GitHub, self.api_get("/user", access_token)).await?;
        Ok(Owner {
            id: user.id.to_string(),
            name: user.login,
            email: None,
        })
    }

    async fn get_owner_email(&self, access_token: &str) -> ProviderResult<String> {
        let emails: Vec<GitHubEmail> =
            fetch_json(Provider::GitHub, self.api_get("/user/emails", access_token)).await?;
        select_primary_email(emails)
    }

    async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<RefreshedToken> {
        let request = self
            .http
            .post(format!("{}/login/oauth/access_token", self.oauth_base))
            .header(ACCEPT, "application/json")
            .json(&RefreshBody {
                refresh_token,
                grant_type: "refresh_token",
                client_id: &self.credentials.client_id,
                client_secret: &self.credentials.client_secret,
            });
        request_refresh(Provider::GitHub, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::with_base_urls(
            reqwest::Client::new(),
            ClientCredentials::new("gh-id", "gh-secret").unwrap(),
            server.uri(),
            server.uri(),
        )
    }

    fn email(address: &str, primary: bool) -> GitHubEmail {
        GitHubEmail {
            email: address.to_string(),
            primary,
            verified: true,
        }
    }

    #[test]
    fn test_select_primary_email() {
        let emails = vec![email("work@x.com", false), email("ann@x.com", true)];
        assert_eq!(select_primary_email(emails).unwrap(), "ann@x.com");
    }

    #[test]
    fn test_no_primary_email() {
        let err = select_primary_email(vec![email("work@x.com", false)]).unwrap_err();
        assert!(matches!(err, ProviderError::PrimaryEmailNotFound { .. }));

        let err = select_primary_email(Vec::new()).unwrap_err();
        assert!(matches!(err, ProviderError::PrimaryEmailNotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_owner() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", "token gho_abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "login": "ann",
                "id": 1234,
                "avatar_url": "https://avatars.example/ann"
            })))
            .mount(&server)
            .await;

        let owner = client(&server).get_owner("gho_abc").await.unwrap();
        assert_eq!(
            owner,
            Owner {
                id: "1234".to_string(),
                name: "ann".to_string(),
                email: None,
            }
        );
    }

    #[tokio::test]
    async fn test_get_owner_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .mount(&server)
            .await;

        let err = client(&server).get_owner("bad").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_get_owner_email_picks_primary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/emails"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"email": "work@x.com", "primary": false, "verified": true, "visibility": null},
                {"email": "ann@x.com", "primary": true, "verified": true, "visibility": "public"}
            ])))
            .mount(&server)
            .await;

        let email = client(&server).get_owner_email("gho_abc").await.unwrap();
        assert_eq!(email, "ann@x.com");
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/emails"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server).get_owner_email("gho_abc").await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({
                "refresh_token": "ghr_old",
                "grant_type": "refresh_token",
                "client_id": "gh-id",
                "client_secret": "gh-secret"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "gho_new",
                "expires_in": 28800,
                "refresh_token": "ghr_new",
                "refresh_token_expires_in": 15811200,
                "token_type": "bearer"
            })))
            .mount(&server)
            .await;

        let refreshed = client(&server).refresh_token("ghr_old").await.unwrap();
        assert_eq!(refreshed.access_token, "gho_new");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("ghr_new"));
        assert!(refreshed.access_token_expires_at.is_some());
        assert!(refreshed.refresh_token_expires_at > refreshed.access_token_expires_at);
    }

    #[tokio::test]
    async fn test_refresh_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server).refresh_token("ghr_old").await.unwrap_err();
        assert!(matches!(err, ProviderError::RefreshFailed { .. }));
    }
}
