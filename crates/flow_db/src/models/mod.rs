//! Database models.

mod account;
mod oauth2_link;

pub use account::{Account, AccountChanges, PasswordHash};
pub use oauth2_link::{OAuth2Link, Provider};
