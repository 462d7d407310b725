//! Database query functions.
//!
//! Organized by domain:
//! - `account`: Account CRUD
//! - `oauth2_link`: Per-provider OAuth2 credentials of an account

mod account;
mod oauth2_link;

pub use account::*;
pub use oauth2_link::*;
