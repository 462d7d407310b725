//! Flow Users Database Layer
//!
//! SQLite-based storage for user accounts and their OAuth2 links.
//!
//! # Architecture
//!
//! - **Uniqueness lives in the schema** - `accounts.email` is `UNIQUE` and
//!   links are keyed by `(user_id, provider)`, so racing writers cannot create
//!   duplicates
//! - **Links are upserted** - storing a link replaces the previous one in a
//!   single statement
//! - **Password hashes are opaque** - stored as bytes, interpreted only by the
//!   credential store in `flow-core`
//!
//! # Usage
//!
//! ```rust,ignore
//! use flow_db::{UsersDb, queries};
//!
//! let db = UsersDb::connect("sqlite://flow-users.db").await?;
//! let account = queries::get_account_by_email(db.pool(), "ann@x.com").await?;
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod queries;

pub use connection::UsersDb;
pub use error::{DbError, DbResult};
pub use models::{Account, AccountChanges, OAuth2Link, PasswordHash, Provider};
