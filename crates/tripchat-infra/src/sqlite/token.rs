//! SQLite access token repository implementation.
//!
//! Only SHA-256 hashes of tokens are stored. Hashing and generation happen
//! at the API edge.

use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use tripchat_core::repository::token::AccessTokenRepository;
use tripchat_types::error::RepositoryError;
use tripchat_types::identity::Identity;
use tripchat_types::user::{Role, UserId};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `AccessTokenRepository`.
#[derive(Clone)]
pub struct SqliteAccessTokenRepository {
    pool: DatabasePool,
}

impl SqliteAccessTokenRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl AccessTokenRepository for SqliteAccessTokenRepository {
    async fn store_token(&self, user_id: UserId, token_hash: &str) -> Result<(), RepositoryError> {
        let id = uuid::Uuid::now_v7().to_string();
        let now = format_datetime(&Utc::now());

        let result = sqlx::query(
            "INSERT INTO access_tokens (id, user_id, token_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id.0)
        .bind(token_hash)
        .bind(&now)
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict("token hash already registered".to_string()),
            ),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("FOREIGN KEY") => {
                Err(RepositoryError::NotFound)
            }
            Err(e) => Err(query_error(e)),
        }
    }

    async fn resolve_identity(&self, token_hash: &str) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query(
            "SELECT t.id AS token_id, t.last_used_at, u.id AS user_id, u.role, u.banned
             FROM access_tokens t
             JOIN users u ON u.id = t.user_id
             WHERE t.token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let token_id: String = row.try_get("token_id").map_err(query_error)?;
        let user_id: i64 = row.try_get("user_id").map_err(query_error)?;
        let role: String = row.try_get("role").map_err(query_error)?;
        let banned: bool = row.try_get("banned").map_err(query_error)?;
        let role: Role = role.parse().map_err(RepositoryError::Query)?;

        let last_used: Option<String> = row.try_get("last_used_at").map_err(query_error)?;
        let last_used = last_used.as_deref().map(parse_datetime).transpose()?;
        let now = Utc::now();

        // Best effort; a failed bookkeeping write never fails the lookup.
        if needs_touch(last_used, now) {
            if let Err(e) = sqlx::query("UPDATE access_tokens SET last_used_at = ? WHERE id = ?")
                .bind(format_datetime(&now))
                .bind(&token_id)
                .execute(&self.pool.writer)
                .await
            {
                tracing::debug!(error = %e, "Failed to record token use");
            }
        }

        Ok(Some(Identity {
            id: UserId(user_id),
            role,
            banned,
        }))
    }

    async fn revoke_tokens(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE user_id = ?")
            .bind(user_id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected())
    }
}

/// Minimum gap between `last_used_at` updates for one token.
const TOUCH_INTERVAL_SECS: i64 = 60;

/// Whether a lookup should record the token's use. Most requests skip the
/// write so reads do not queue behind the writer connection.
fn needs_touch(last_used: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_used {
        Some(last) => now - last >= Duration::seconds(TOUCH_INTERVAL_SECS),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::test_pool;
    use crate::sqlite::user::{SqliteUserDirectory, seed_users};
    use tripchat_core::repository::user::UserDirectory;

    #[tokio::test]
    async fn test_store_and_resolve() {
        let pool = test_pool().await;
        seed_users(&pool, &[7]).await;
        let repo = SqliteAccessTokenRepository::new(pool.clone());

        repo.store_token(UserId(7), "abc123").await.unwrap();
        let identity = repo.resolve_identity("abc123").await.unwrap().unwrap();

        assert_eq!(identity.id, UserId(7));
        assert_eq!(identity.role, Role::User);
        assert!(!identity.banned);
        assert!(repo.resolve_identity("nope").await.unwrap().is_none());

        let used: Option<String> =
            sqlx::query_scalar("SELECT last_used_at FROM access_tokens WHERE token_hash = 'abc123'")
                .fetch_one(&pool.reader)
                .await
                .unwrap();
        assert!(used.is_some());
    }

    #[tokio::test]
    async fn test_resolve_reflects_ban_flag() {
        let pool = test_pool().await;
        seed_users(&pool, &[7]).await;
        let repo = SqliteAccessTokenRepository::new(pool.clone());
        repo.store_token(UserId(7), "h").await.unwrap();

        SqliteUserDirectory::new(pool)
            .set_banned(UserId(7), true)
            .await
            .unwrap();

        let identity = repo.resolve_identity("h").await.unwrap().unwrap();
        assert!(identity.banned);
    }

    #[tokio::test]
    async fn test_store_for_unknown_user() {
        let repo = SqliteAccessTokenRepository::new(test_pool().await);
        let err = repo.store_token(UserId(1), "h").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_revoke_tokens() {
        let pool = test_pool().await;
        seed_users(&pool, &[1]).await;
        let repo = SqliteAccessTokenRepository::new(pool);
        repo.store_token(UserId(1), "a").await.unwrap();
        repo.store_token(UserId(1), "b").await.unwrap();

        assert_eq!(repo.revoke_tokens(UserId(1)).await.unwrap(), 2);
        assert!(repo.resolve_identity("a").await.unwrap().is_none());
        assert_eq!(repo.revoke_tokens(UserId(1)).await.unwrap(), 0);
    }

    async fn last_used(pool: &DatabasePool, hash: &str) -> Option<String> {
        sqlx::query_scalar("SELECT last_used_at FROM access_tokens WHERE token_hash = ?")
            .bind(hash)
            .fetch_one(&pool.reader)
            .await
            .unwrap()
    }

    #[test]
    fn test_needs_touch() {
        let now = Utc::now();
        assert!(needs_touch(None, now));
        assert!(!needs_touch(Some(now - Duration::seconds(5)), now));
        assert!(needs_touch(Some(now - Duration::seconds(TOUCH_INTERVAL_SECS)), now));
    }

    #[tokio::test]
    async fn test_repeated_lookups_write_last_used_once() {
        let pool = test_pool().await;
        seed_users(&pool, &[7]).await;
        let repo = SqliteAccessTokenRepository::new(pool.clone());
        repo.store_token(UserId(7), "t").await.unwrap();

        repo.resolve_identity("t").await.unwrap().unwrap();
        let first = last_used(&pool, "t").await;
        assert!(first.is_some());

        repo.resolve_identity("t").await.unwrap().unwrap();
        assert_eq!(last_used(&pool, "t").await, first);

        let stale = "2020-01-01T00:00:00.000000Z";
        sqlx::query("UPDATE access_tokens SET last_used_at = ? WHERE token_hash = 't'")
            .bind(stale)
            .execute(&pool.writer)
            .await
            .unwrap();
        repo.resolve_identity("t").await.unwrap().unwrap();
        let refreshed = last_used(&pool, "t").await.unwrap();
        assert!(refreshed.as_str() > stale);
    }
}
