//! Account repository.
//!
//! Wraps the account queries with password hashing so plain passwords never
//! reach the database layer.

use flow_db::{Account, AccountChanges, UsersDb, queries};

use crate::credential::CredentialStore;
use crate::error::AccountError;

pub type AccountResult<T> = Result<T, AccountError>;

/// Account fields a caller may change. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: UsersDb,
    credentials: CredentialStore,
}

impl AccountRepository {
    pub fn new(db: UsersDb, credentials: CredentialStore) -> Self {
        Self { db, credentials }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Create an account, hashing the password first.
    ///
    /// Fails with [`AccountError::EmailAlreadyUsed`] when the email is taken.
    pub async fn create(&self, name: &str, email: &str, password: &str) -> AccountResult<Account> {
        let hash = self.credentials.hash_blocking(password).await?;
        let account = queries::create_account(self.db.pool(), name, email, &hash).await?;
        tracing::info!(account_id = account.id, "account created");
        Ok(account)
    }

    pub async fn find_by_id(&self, id: i64) -> AccountResult<Option<Account>> {
        Ok(queries::get_account(self.db.pool(), id).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> AccountResult<Option<Account>> {
        Ok(queries::get_account_by_email(self.db.pool(), email).await?)
    }

    /// Apply a partial update. A new password is re-hashed.
    ///
    /// Returns `None` when no account has this id.
    pub async fn update(&self, id: i64, update: AccountUpdate) -> AccountResult<Option<Account>> {
        let password_hash = match update.password {
            Some(password) => Some(self.credentials.hash_blocking(&password).await?),
            None => None,
        };

        let changes = AccountChanges {
            name: update.name,
            email: update.email,
            password_hash,
        };
        Ok(queries::update_account(self.db.pool(), id, &changes).await?)
    }

    pub async fn delete(&self, id: i64) -> AccountResult<bool> {
        let found = queries::delete_account(self.db.pool(), id).await?;
        if found {
            tracing::info!(account_id = id, "account deleted");
        }
        Ok(found)
    }
}
