//! OAuth2 link models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DbError;

/// External OAuth2 identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    Google,
    Twitter,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::GitHub, Provider::Google, Provider::Twitter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::GitHub => "github",
            Provider::Google => "google",
            Provider::Twitter => "twitter",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github" => Ok(Provider::GitHub),
            "google" => Ok(Provider::Google),
            "twitter" => Ok(Provider::Twitter),
            other => Err(DbError::invalid_data(format!("unknown provider: {other}"))),
        }
    }
}

/// Stored credentials binding an account to one provider identity.
///
/// There is at most one link per `(user_id, provider)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Link {
    pub user_id: i64,
    pub provider: Provider,
    pub access_token: String,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    /// Identifier the provider assigned to the owner
    pub owner_id: String,
}

impl OAuth2Link {
    /// Whether the access token has passed its expiry.
    ///
    /// Links without an expiry never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.access_token_expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }
}
