//! SQLite user directory implementation.

use sqlx::Row;
use tripchat_core::repository::user::UserDirectory;
use tripchat_types::error::RepositoryError;
use tripchat_types::user::{Role, User, UserId};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `UserDirectory`.
#[derive(Clone)]
pub struct SqliteUserDirectory {
    pool: DatabasePool,
}

impl SqliteUserDirectory {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    id: i64,
    display_name: String,
    avatar: Option<String>,
    role: String,
    banned: bool,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            display_name: row.try_get("display_name")?,
            avatar: row.try_get("avatar")?,
            role: row.try_get("role")?,
            banned: row.try_get("banned")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        let role: Role = self.role.parse().map_err(RepositoryError::Query)?;
        Ok(User {
            id: UserId(self.id),
            display_name: self.display_name,
            avatar: self.avatar,
            role,
            banned: self.banned,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl UserDirectory for SqliteUserDirectory {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let user_row =
                    UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(user_row.into_user()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_user(&self, user: &User) -> Result<User, RepositoryError> {
        let row = sqlx::query(
            "INSERT INTO users (id, display_name, avatar, role, banned, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                display_name = excluded.display_name,
                avatar = excluded.avatar,
                role = excluded.role,
                updated_at = excluded.updated_at
             RETURNING *",
        )
        .bind(user.id.0)
        .bind(&user.display_name)
        .bind(&user.avatar)
        .bind(user.role.to_string())
        .bind(user.banned)
        .bind(format_datetime(&user.created_at))
        .bind(format_datetime(&user.updated_at))
        .fetch_one(&self.pool.writer)
        .await
        .map_err(query_error)?;

        UserRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_user()
    }

    async fn set_banned(&self, id: UserId, banned: bool) -> Result<(), RepositoryError> {
        let now = format_datetime(&chrono::Utc::now());
        let result = sqlx::query("UPDATE users SET banned = ?, updated_at = ? WHERE id = ?")
            .bind(banned)
            .bind(&now)
            .bind(id.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count_users(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        Ok(count as u64)
    }
}

/// Insert a plain user row. Shared by the repository tests in this crate.
#[cfg(test)]
pub(crate) async fn seed_users(pool: &DatabasePool, ids: &[i64]) {
    let repo = SqliteUserDirectory::new(pool.clone());
    let now = chrono::Utc::now();
    for id in ids {
        repo.upsert_user(&User {
            id: UserId(*id),
            display_name: format!("User {id}"),
            avatar: None,
            role: Role::User,
            banned: false,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
    }
}
