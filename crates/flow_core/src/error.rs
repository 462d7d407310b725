//! Error types for the account core.

use flow_db::{DbError, Provider};
use miette::Diagnostic;
use thiserror::Error;

pub type CredentialResult<T> = Result<T, CredentialError>;
pub type TokenResult<T> = Result<T, TokenError>;
pub type ProviderResult<T> = Result<T, ProviderError>;
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures of the password hash machinery.
///
/// A wrong password is not an error; see
/// [`CredentialStore::verify`](crate::credential::CredentialStore::verify).
#[derive(Debug, Error, Diagnostic)]
pub enum CredentialError {
    #[error("Failed to hash password: {0}")]
    #[diagnostic(code(flow_core::credential::hash))]
    Hash(String),

    #[error("Stored password hash is unreadable: {0}")]
    #[diagnostic(
        code(flow_core::credential::corrupt_hash),
        help("The account's password hash was not produced by this service or was damaged")
    )]
    CorruptHash(String),

    #[error("Password hashing task failed: {0}")]
    #[diagnostic(code(flow_core::credential::task))]
    Task(String),
}

/// Bearer token failures.
#[derive(Debug, Error, Diagnostic)]
pub enum TokenError {
    #[error("invalid token")]
    #[diagnostic(code(flow_core::token::invalid))]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("token issued by another issuer")]
    #[diagnostic(code(flow_core::token::wrong_issuer))]
    WrongIssuer,

    #[error("token expired")]
    #[diagnostic(code(flow_core::token::expired))]
    Expired,

    #[error("failed to sign token: {0}")]
    #[diagnostic(code(flow_core::token::encode))]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// Failures talking to an OAuth2 provider's API.
#[derive(Debug, Error, Diagnostic)]
pub enum ProviderError {
    #[error("Request to {provider} failed: {source}")]
    #[diagnostic(code(flow_core::provider::http))]
    Http {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} responded with status {status}")]
    #[diagnostic(code(flow_core::provider::status))]
    Status {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("Failed to read response from {provider}: {source}")]
    #[diagnostic(code(flow_core::provider::decode))]
    Decode {
        provider: Provider,
        #[source]
        source: serde_json::Error,
    },

    #[error("primary email not found in response from {provider}")]
    #[diagnostic(
        code(flow_core::provider::no_primary_email),
        help("The owner must have a primary email address on their account")
    )]
    PrimaryEmailNotFound { provider: Provider },

    #[error("{provider} did not return an email address")]
    #[diagnostic(code(flow_core::provider::missing_email))]
    MissingEmail { provider: Provider },

    #[error("failed to refresh {provider} token")]
    #[diagnostic(code(flow_core::provider::refresh_failed))]
    RefreshFailed { provider: Provider, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    #[diagnostic(code(flow_core::provider::client))]
    Client(#[source] reqwest::Error),
}

/// Account repository failures.
#[derive(Debug, Error, Diagnostic)]
pub enum AccountError {
    #[error("email already used")]
    #[diagnostic(code(flow_core::account::email_already_used))]
    EmailAlreadyUsed,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(DbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Credential(#[from] CredentialError),
}

impl From<DbError> for AccountError {
    fn from(err: DbError) -> Self {
        if err.is_already_exists() {
            AccountError::EmailAlreadyUsed
        } else {
            AccountError::Database(err)
        }
    }
}

/// Outcome categories of the account workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    AuthFailure,
    Upstream,
}

/// Errors returned by [`AccountService`](crate::service::AccountService).
///
/// Everything except the upstream variants is an expected outcome reported
/// back to the client.
#[derive(Debug, Error, Diagnostic)]
pub enum ServiceError {
    #[error("{0}")]
    #[diagnostic(code(flow_core::service::validation))]
    Validation(String),

    #[error("{0} not found")]
    #[diagnostic(code(flow_core::service::not_found))]
    NotFound(String),

    #[error("email already used")]
    #[diagnostic(code(flow_core::service::email_already_used))]
    EmailAlreadyUsed,

    #[error("incorrect password")]
    #[diagnostic(code(flow_core::service::wrong_password))]
    WrongPassword,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Provider(#[from] ProviderError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::EmailAlreadyUsed => ErrorKind::Conflict,
            ServiceError::WrongPassword => ErrorKind::AuthFailure,
            ServiceError::Token(TokenError::Encode(_)) => ErrorKind::Upstream,
            ServiceError::Token(_) => ErrorKind::AuthFailure,
            ServiceError::Database(_)
            | ServiceError::Credential(_)
            | ServiceError::Provider(_) => ErrorKind::Upstream,
        }
    }
}

impl From<AccountError> for ServiceError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::EmailAlreadyUsed => ServiceError::EmailAlreadyUsed,
            AccountError::Database(e) => ServiceError::Database(e),
            AccountError::Credential(e) => ServiceError::Credential(e),
        }
    }
}
