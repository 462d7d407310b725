//! Account models.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Stored password hash.
///
/// Opaque outside the credential store: the database layer only moves the
/// bytes around and never inspects them.
#[derive(Clone, PartialEq, Eq, sqlx::Type)]
#[sqlx(transparent)]
pub struct PasswordHash(Vec<u8>);

impl PasswordHash {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// A registered user account.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    /// Assigned by the database on insert
    pub id: i64,

    /// Display name
    pub name: String,

    /// Unique across all accounts, compared case-sensitively
    pub email: String,

    pub password_hash: PasswordHash,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of an account. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<PasswordHash>,
}

impl AccountChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}
