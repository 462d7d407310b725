//! Flow Users Core
//!
//! Account management, password credentials, bearer tokens and OAuth2
//! provider linking for the flow-users service.
//!
//! The entry point is [`AccountService`], which owns the workflows:
//! sign-up, sign-in, self-service updates, and registering, connecting,
//! refreshing and disconnecting OAuth2 providers. Everything it needs is
//! handed in at construction; nothing reads global state.

pub mod accounts;
pub mod config;
pub mod credential;
pub mod error;
pub mod oauth2;
pub mod service;
pub mod token;

pub use accounts::{AccountRepository, AccountUpdate};
pub use config::{ClientCredentials, FlowConfig, JwtConfig, OAuth2Config};
pub use credential::CredentialStore;
pub use error::{
    AccountError, CredentialError, ErrorKind, ProviderError, ServiceError, ServiceResult,
    TokenError,
};
pub use oauth2::{OAuth2Client, OAuth2Clients, Owner, RefreshedToken};
pub use service::{
    AccountPatch, AccountService, AccountView, LinkView, OAuth2Grant, OAuth2Registration,
    Session, SignIn, SignUp,
};
pub use token::{Claims, TokenService};

pub use flow_db::Provider;
