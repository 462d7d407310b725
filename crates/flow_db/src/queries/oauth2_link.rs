//! OAuth2 link database queries.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use crate::models::{OAuth2Link, Provider};

/// Database row for the oauth2_links table.
#[derive(Debug, sqlx::FromRow)]
struct OAuth2LinkRow {
    user_id: i64,
    provider: Provider,
    access_token: String,
    access_token_expires_at: Option<i64>,
    refresh_token: Option<String>,
    refresh_token_expires_at: Option<i64>,
    owner_id: String,
}

impl OAuth2LinkRow {
    fn into_link(self) -> OAuth2Link {
        OAuth2Link {
            user_id: self.user_id,
            provider: self.provider,
            access_token: self.access_token,
            access_token_expires_at: self.access_token_expires_at.map(timestamp_to_datetime),
            refresh_token: self.refresh_token,
            refresh_token_expires_at: self.refresh_token_expires_at.map(timestamp_to_datetime),
            owner_id: self.owner_id,
        }
    }
}

/// Convert a Unix timestamp (seconds) to a DateTime<Utc>.
fn timestamp_to_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Get the link between an account and a provider.
pub async fn get_oauth2_link(
    pool: &SqlitePool,
    user_id: i64,
    provider: Provider,
) -> DbResult<Option<OAuth2Link>> {
    let row = sqlx::query_as::<_, OAuth2LinkRow>(
        r#"
        SELECT
            user_id, provider, access_token, access_token_expires_at,
            refresh_token, refresh_token_expires_at, owner_id
        FROM oauth2_links
        WHERE user_id = ? AND provider = ?
        "#,
    )
    .bind(user_id)
    .bind(provider)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(OAuth2LinkRow::into_link))
}

/// List every link of an account, ordered by provider.
pub async fn list_oauth2_links(pool: &SqlitePool, user_id: i64) -> DbResult<Vec<OAuth2Link>> {
    let rows = sqlx::query_as::<_, OAuth2LinkRow>(
        r#"
        SELECT
            user_id, provider, access_token, access_token_expires_at,
            refresh_token, refresh_token_expires_at, owner_id
        FROM oauth2_links
        WHERE user_id = ?
        ORDER BY provider
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(OAuth2LinkRow::into_link).collect())
}

/// Store a link, replacing any existing link for the same account and
/// provider.
///
/// This is a single upsert, so a concurrent reader sees either the old link
/// or the new one, never neither.
pub async fn put_oauth2_link(pool: &SqlitePool, link: &OAuth2Link) -> DbResult<()> {
    let now = Utc::now().timestamp();

    sqlx::query(
        r#"
        INSERT INTO oauth2_links (
            user_id, provider, access_token, access_token_expires_at,
            refresh_token, refresh_token_expires_at, owner_id,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, provider) DO UPDATE SET
            access_token = excluded.access_token,
            access_token_expires_at = excluded.access_token_expires_at,
            refresh_token = excluded.refresh_token,
            refresh_token_expires_at = excluded.refresh_token_expires_at,
            owner_id = excluded.owner_id,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(link.user_id)
    .bind(link.provider)
    .bind(&link.access_token)
    .bind(link.access_token_expires_at.map(|dt| dt.timestamp()))
    .bind(link.refresh_token.as_deref())
    .bind(link.refresh_token_expires_at.map(|dt| dt.timestamp()))
    .bind(&link.owner_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete the link between an account and a provider. Returns whether a link
/// existed.
pub async fn delete_oauth2_link(
    pool: &SqlitePool,
    user_id: i64,
    provider: Provider,
) -> DbResult<bool> {
    let result = sqlx::query("DELETE FROM oauth2_links WHERE user_id = ? AND provider = ?")
        .bind(user_id)
        .bind(provider)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::UsersDb;
    use crate::models::PasswordHash;
    use crate::queries::{create_account, delete_account};
    use pretty_assertions::assert_eq;

    async fn db_with_account() -> (UsersDb, i64) {
        let db = UsersDb::open_in_memory().await.unwrap();
        let account = create_account(
            db.pool(),
            "Ann",
            "ann@x.com",
            &PasswordHash::from_bytes(b"hash".to_vec()),
        )
        .await
        .unwrap();
        (db, account.id)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_put_and_get_link() {
        let (db, user_id) = db_with_account().await;

        assert!(
            get_oauth2_link(db.pool(), user_id, Provider::Twitter)
                .await
                .unwrap()
                .is_none()
        );

        let link = OAuth2Link {
            user_id,
            provider: Provider::Twitter,
            access_token: "access-1".to_string(),
            access_token_expires_at: Some(at(1_700_000_000)),
            refresh_token: Some("refresh-1".to_string()),
            refresh_token_expires_at: Some(at(1_800_000_000)),
            owner_id: "owner-1".to_string(),
        };
        put_oauth2_link(db.pool(), &link).await.unwrap();

        let stored = get_oauth2_link(db.pool(), user_id, Provider::Twitter)
            .await
            .unwrap()
            .expect("link should exist");
        assert_eq!(stored, link);

        // Other providers are independent
        assert!(
            get_oauth2_link(db.pool(), user_id, Provider::GitHub)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_second_put_replaces_first() {
        let (db, user_id) = db_with_account().await;

        let first = OAuth2Link {
            user_id,
            provider: Provider::GitHub,
            access_token: "first".to_string(),
            access_token_expires_at: Some(at(1_700_000_000)),
            refresh_token: Some("first-refresh".to_string()),
            refresh_token_expires_at: None,
            owner_id: "111".to_string(),
        };
        put_oauth2_link(db.pool(), &first).await.unwrap();

        let second = OAuth2Link {
            user_id,
            provider: Provider::GitHub,
            access_token: "second".to_string(),
            access_token_expires_at: None,
            refresh_token: None,
            refresh_token_expires_at: None,
            owner_id: "222".to_string(),
        };
        put_oauth2_link(db.pool(), &second).await.unwrap();

        let stored = get_oauth2_link(db.pool(), user_id, Provider::GitHub)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, second);
        assert_eq!(list_oauth2_links(db.pool(), user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_link() {
        let (db, user_id) = db_with_account().await;

        assert!(
            !delete_oauth2_link(db.pool(), user_id, Provider::Google)
                .await
                .unwrap()
        );

        let link = OAuth2Link {
            user_id,
            provider: Provider::Google,
            access_token: "token".to_string(),
            access_token_expires_at: None,
            refresh_token: None,
            refresh_token_expires_at: None,
            owner_id: "g-1".to_string(),
        };
        put_oauth2_link(db.pool(), &link).await.unwrap();

        assert!(
            delete_oauth2_link(db.pool(), user_id, Provider::Google)
                .await
                .unwrap()
        );
        assert!(
            get_oauth2_link(db.pool(), user_id, Provider::Google)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_links_removed_with_account() {
        let (db, user_id) = db_with_account().await;

        for provider in Provider::ALL {
            let link = OAuth2Link {
                user_id,
                provider,
                access_token: format!("{provider}-token"),
                access_token_expires_at: None,
                refresh_token: None,
                refresh_token_expires_at: None,
                owner_id: format!("{provider}-owner"),
            };
            put_oauth2_link(db.pool(), &link).await.unwrap();
        }

        let links = list_oauth2_links(db.pool(), user_id).await.unwrap();
        let providers: Vec<Provider> = links.iter().map(|l| l.provider).collect();
        assert_eq!(
            providers,
            vec![Provider::GitHub, Provider::Google, Provider::Twitter]
        );

        assert!(delete_account(db.pool(), user_id).await.unwrap());
        assert!(list_oauth2_links(db.pool(), user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_link_requires_existing_account() {
        let db = UsersDb::open_in_memory().await.unwrap();
        let link = OAuth2Link {
            user_id: 999,
            provider: Provider::GitHub,
            access_token: "token".to_string(),
            access_token_expires_at: None,
            refresh_token: None,
            refresh_token_expires_at: None,
            owner_id: "1".to_string(),
        };
        assert!(put_oauth2_link(db.pool(), &link).await.is_err());
    }
}
