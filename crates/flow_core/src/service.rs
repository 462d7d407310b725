//! Request-level account workflows.
//!
//! [`AccountService`] composes the account repository, the link queries, the
//! provider clients and the token service into the operations the HTTP layer
//! exposes. It validates input, decides outcomes and returns plain data; the
//! transport decides how those outcomes look on the wire.
//!
//! Workflows run their steps in order without compensation. An account
//! created by [`AccountService::oauth2_register`] stays even if storing its
//! link fails afterwards.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use flow_db::{Account, OAuth2Link, Provider, UsersDb, queries};
use serde::{Deserialize, Serialize};

use crate::accounts::{AccountRepository, AccountUpdate};
use crate::config::FlowConfig;
use crate::credential::CredentialStore;
use crate::error::{ProviderResult, ServiceError, ServiceResult};
use crate::oauth2::{OAuth2Client, OAuth2Clients, expiry_from};
use crate::token::TokenService;

/// Body of a password sign-up.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

/// Partial self-service update. Omitted fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Tokens the client obtained from a provider's authorization flow.
///
/// GitHub grants only need the access token. Google and Twitter grants must
/// also carry the refresh token and the access token lifetime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuth2Grant {
    pub access_token: String,
    /// Access token lifetime in seconds
    #[serde(default, alias = "expire_in")]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Refresh token lifetime in seconds
    #[serde(default, alias = "refresh_token_expire_in")]
    pub refresh_token_expires_in: Option<i64>,
}

/// A grant plus the password of the account to create.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2Registration {
    #[serde(flatten)]
    pub grant: OAuth2Grant,
    pub password: String,
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
        }
    }
}

/// An account together with a freshly issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(flatten)]
    pub account: AccountView,
    pub token: String,
}

/// Public view of a link. Tokens stay server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkView {
    pub provider: Provider,
    pub owner_id: String,
    pub access_token_expires_at: Option<DateTime<Utc>>,
}

impl From<&OAuth2Link> for LinkView {
    fn from(link: &OAuth2Link) -> Self {
        Self {
            provider: link.provider,
            owner_id: link.owner_id.clone(),
            access_token_expires_at: link.access_token_expires_at,
        }
    }
}

/// The account and OAuth2 workflows.
#[derive(Debug, Clone)]
pub struct AccountService {
    db: UsersDb,
    accounts: AccountRepository,
    tokens: TokenService,
    providers: OAuth2Clients,
}

impl AccountService {
    pub fn new(
        db: UsersDb,
        credentials: CredentialStore,
        tokens: TokenService,
        providers: OAuth2Clients,
    ) -> Self {
        Self {
            accounts: AccountRepository::new(db.clone(), credentials),
            db,
            tokens,
            providers,
        }
    }

    /// Wire up the service from startup configuration.
    pub fn from_config(db: UsersDb, config: &FlowConfig) -> ProviderResult<Self> {
        Ok(Self::new(
            db,
            CredentialStore::default(),
            TokenService::from_config(&config.jwt),
            OAuth2Clients::from_config(&config.oauth2)?,
        ))
    }

    pub fn db(&self) -> &UsersDb {
        &self.db
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Resolve the account id a bearer token was issued for.
    pub fn resolve_caller(&self, token: &str) -> ServiceResult<i64> {
        Ok(self.tokens.verify(token)?)
    }

    pub async fn sign_up(&self, body: SignUp) -> ServiceResult<Session> {
        validate_name(&body.name)?;
        validate_email(&body.email)?;
        validate_password(&body.password)?;

        let account = self
            .accounts
            .create(&body.name, &body.email, &body.password)
            .await?;
        self.session(&account)
    }

    pub async fn sign_in(&self, body: SignIn) -> ServiceResult<Session> {
        validate_email(&body.email)?;
        validate_password(&body.password)?;

        let account = self
            .accounts
            .find_by_email(&body.email)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))?;

        let matched = self
            .accounts
            .credentials()
            .verify_blocking(&account.password_hash, &body.password)
            .await?;
        if !matched {
            tracing::debug!(account_id = account.id, "sign-in with wrong password");
            return Err(ServiceError::WrongPassword);
        }

        self.session(&account)
    }

    pub async fn get_self(&self, caller: i64) -> ServiceResult<AccountView> {
        let account = self.existing_account(caller).await?;
        Ok(AccountView::from(&account))
    }

    pub async fn update_self(&self, caller: i64, patch: AccountPatch) -> ServiceResult<AccountView> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(email) = &patch.email {
            validate_email(email)?;
        }
        if let Some(password) = &patch.password {
            validate_password(password)?;
        }

        let update = AccountUpdate {
            name: patch.name,
            email: patch.email,
            password: patch.password,
        };
        let account = self
            .accounts
            .update(caller, update)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))?;
        Ok(AccountView::from(&account))
    }

    pub async fn delete_self(&self, caller: i64) -> ServiceResult<()> {
        if self.accounts.delete(caller).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("user"))
        }
    }

    /// Create an account from a provider identity and link it.
    pub async fn oauth2_register(
        &self,
        provider: &str,
        body: OAuth2Registration,
    ) -> ServiceResult<Session> {
        let client = self.client_for(provider)?;
        let provider = client.provider();
        validate_grant(provider, &body.grant)?;
        validate_password(&body.password)?;

        let access_token = body.grant.access_token.as_str();
        let owner = client.get_owner(access_token).await?;
        let email = match owner.email {
            Some(email) => email,
            None => client.get_owner_email(access_token).await?,
        };
        validate_name(&owner.name)?;
        validate_email(&email)?;

        let account = self
            .accounts
            .create(&owner.name, &email, &body.password)
            .await?;

        let link = link_from_grant(account.id, provider, &body.grant, owner.id, Utc::now());
        queries::put_oauth2_link(self.db.pool(), &link).await?;
        tracing::info!(account_id = account.id, %provider, "account registered via OAuth2");

        self.session(&account)
    }

    /// Link a provider identity to the caller's account, replacing any
    /// previous link for that provider.
    pub async fn oauth2_connect(
        &self,
        caller: i64,
        provider: &str,
        grant: OAuth2Grant,
    ) -> ServiceResult<Session> {
        let client = self.client_for(provider)?;
        let provider = client.provider();
        validate_grant(provider, &grant)?;

        let account = self.existing_account(caller).await?;
        let owner = client.get_owner(&grant.access_token).await?;

        let link = link_from_grant(account.id, provider, &grant, owner.id, Utc::now());
        queries::put_oauth2_link(self.db.pool(), &link).await?;
        tracing::info!(account_id = account.id, %provider, "OAuth2 link stored");

        self.session(&account)
    }

    /// Exchange the stored refresh token and replace the link.
    pub async fn oauth2_refresh(&self, caller: i64, provider: &str) -> ServiceResult<LinkView> {
        let client = self.client_for(provider)?;
        let provider = client.provider();

        self.existing_account(caller).await?;
        let link = queries::get_oauth2_link(self.db.pool(), caller, provider)
            .await?
            .ok_or_else(|| ServiceError::not_found("oauth2 link"))?;

        let stored_refresh = link.refresh_token.as_deref().ok_or_else(|| {
            ServiceError::validation(format!("no refresh token stored for {provider}"))
        })?;
        tracing::debug!(
            account_id = caller,
            %provider,
            expired = link.is_expired(Utc::now()),
            "refreshing OAuth2 access token"
        );
        let refreshed = client.refresh_token(stored_refresh).await?;

        let (refresh_token, refresh_token_expires_at) = match refreshed.refresh_token {
            Some(token) => (Some(token), refreshed.refresh_token_expires_at),
            None => (link.refresh_token.clone(), link.refresh_token_expires_at),
        };
        let replaced = OAuth2Link {
            access_token: refreshed.access_token,
            access_token_expires_at: refreshed.access_token_expires_at,
            refresh_token,
            refresh_token_expires_at,
            ..link
        };
        queries::put_oauth2_link(self.db.pool(), &replaced).await?;
        tracing::info!(account_id = caller, %provider, "OAuth2 token refreshed");

        Ok(LinkView::from(&replaced))
    }

    pub async fn oauth2_disconnect(&self, caller: i64, provider: &str) -> ServiceResult<()> {
        let client = self.client_for(provider)?;
        let provider = client.provider();

        if queries::delete_oauth2_link(self.db.pool(), caller, provider).await? {
            tracing::info!(account_id = caller, %provider, "OAuth2 link removed");
            Ok(())
        } else {
            Err(ServiceError::not_found("oauth2 link"))
        }
    }

    /// The caller's linked providers.
    pub async fn connections(&self, caller: i64) -> ServiceResult<Vec<LinkView>> {
        let links = queries::list_oauth2_links(self.db.pool(), caller).await?;
        Ok(links.iter().map(LinkView::from).collect())
    }

    /// Look up the client for a provider path segment.
    ///
    /// Unknown and unconfigured providers are both "not found".
    fn client_for(&self, provider: &str) -> ServiceResult<Arc<dyn OAuth2Client>> {
        let parsed: Provider = provider.parse().map_err(|_| {
            tracing::debug!(provider, "unknown provider");
            ServiceError::not_found("provider")
        })?;
        self.providers
            .get(parsed)
            .ok_or_else(|| ServiceError::not_found("provider"))
    }

    async fn existing_account(&self, id: i64) -> ServiceResult<Account> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))
    }

    fn session(&self, account: &Account) -> ServiceResult<Session> {
        let token = self.tokens.issue(account.id, &account.email)?;
        Ok(Session {
            account: AccountView::from(account),
            token,
        })
    }
}

fn link_from_grant(
    user_id: i64,
    provider: Provider,
    grant: &OAuth2Grant,
    owner_id: String,
    now: DateTime<Utc>,
) -> OAuth2Link {
    OAuth2Link {
        user_id,
        provider,
        access_token: grant.access_token.clone(),
        access_token_expires_at: expiry_from(now, grant.expires_in),
        refresh_token: grant.refresh_token.clone().filter(|t| !t.is_empty()),
        refresh_token_expires_at: expiry_from(now, grant.refresh_token_expires_in),
        owner_id,
    }
}

fn validate_name(name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::validation("name is required"));
    }
    Ok(())
}

/// `local@domain`, both parts non-empty, no whitespace anywhere.
pub fn validate_email(email: &str) -> ServiceResult<()> {
    let valid = !email.chars().any(char::is_whitespace)
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            });
    if valid {
        Ok(())
    } else {
        Err(ServiceError::validation("invalid email"))
    }
}

fn validate_password(password: &str) -> ServiceResult<()> {
    if password.is_empty() {
        return Err(ServiceError::validation("password is required"));
    }
    Ok(())
}

fn validate_grant(provider: Provider, grant: &OAuth2Grant) -> ServiceResult<()> {
    if grant.access_token.trim().is_empty() {
        return Err(ServiceError::validation("access_token is required"));
    }
    match provider {
        Provider::GitHub => Ok(()),
        Provider::Google | Provider::Twitter => {
            if grant.refresh_token.as_deref().is_none_or(str::is_empty) {
                return Err(ServiceError::validation("refresh_token is required"));
            }
            if grant.expires_in.is_none() {
                return Err(ServiceError::validation("expires_in is required"));
            }
            Ok(())
        }
    }
}
