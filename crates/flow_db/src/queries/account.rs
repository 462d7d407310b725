//! Account database queries.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{DbResult, map_unique_violation};
use crate::models::{Account, AccountChanges, PasswordHash};

const ACCOUNT_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

/// Get an account by ID.
pub async fn get_account(pool: &SqlitePool, id: i64) -> DbResult<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(account)
}

/// Get an account by email.
pub async fn get_account_by_email(pool: &SqlitePool, email: &str) -> DbResult<Option<Account>> {
    let account = sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(account)
}

/// Create a new account.
///
/// Fails with [`DbError::AlreadyExists`](crate::DbError::AlreadyExists) if the
/// email is taken. The check is the table's unique constraint, so concurrent
/// inserts of the same email cannot both succeed.
pub async fn create_account(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &PasswordHash,
) -> DbResult<Account> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO accounts (name, email, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| map_unique_violation(e, "account", email))?;

    Ok(Account {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: password_hash.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Apply a partial update to an account.
///
/// Returns `None` if no account has this ID. Changing the email to one that
/// is already used fails with `AlreadyExists`.
pub async fn update_account(
    pool: &SqlitePool,
    id: i64,
    changes: &AccountChanges,
) -> DbResult<Option<Account>> {
    if changes.is_empty() {
        return get_account(pool, id).await;
    }

    let result = sqlx::query(
        r#"
        UPDATE accounts SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            password_hash = COALESCE(?, password_hash),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(changes.name.as_deref())
    .bind(changes.email.as_deref())
    .bind(changes.password_hash.as_ref())
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| map_unique_violation(e, "account", changes.email.clone().unwrap_or_default()))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_account(pool, id).await
}

/// Delete an account. Returns whether a row was removed.
///
/// Linked OAuth2 credentials are removed with it.
pub async fn delete_account(pool: &SqlitePool, id: i64) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Count registered accounts.
pub async fn count_accounts(pool: &SqlitePool) -> DbResult<u64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
        .fetch_one(pool)
        .await?;
    Ok(count.0 as u64)
}
