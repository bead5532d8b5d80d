//! SQLite room repository implementation.
//!
//! Rooms and their membership rows are written in one transaction. Direct
//! rooms carry a UNIQUE `pair_key`; a violation surfaces as
//! `RepositoryError::Conflict` so the resolver can re-read the winner.

use sqlx::Row;
use tripchat_core::repository::room::RoomRepository;
use tripchat_types::error::RepositoryError;
use tripchat_types::room::{Room, RoomId, RoomKind};
use tripchat_types::user::{MemberSummary, UserId};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `RoomRepository`.
#[derive(Clone)]
pub struct SqliteRoomRepository {
    pool: DatabasePool,
}

impl SqliteRoomRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct RoomRow {
    id: String,
    name: Option<String>,
    kind: String,
    pair_key: Option<String>,
    created_at: String,
    updated_at: String,
}

impl RoomRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            kind: row.try_get("kind")?,
            pair_key: row.try_get("pair_key")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_room(self) -> Result<Room, RepositoryError> {
        let id = self
            .id
            .parse::<RoomId>()
            .map_err(|e| RepositoryError::Query(format!("invalid room id: {e}")))?;
        let kind: RoomKind = self.kind.parse().map_err(RepositoryError::Query)?;

        Ok(Room {
            id,
            name: self.name,
            kind,
            pair_key: self.pair_key,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn rows_into_rooms(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Room>, RepositoryError> {
    rows.iter()
        .map(|row| {
            RoomRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?
                .into_room()
        })
        .collect()
}

impl RoomRepository for SqliteRoomRepository {
    async fn create_room(&self, room: &Room, members: &[UserId]) -> Result<Room, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let result = sqlx::query(
            "INSERT INTO rooms (id, name, kind, pair_key, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(room.id.to_string())
        .bind(&room.name)
        .bind(room.kind.to_string())
        .bind(&room.pair_key)
        .bind(format_datetime(&room.created_at))
        .bind(format_datetime(&room.updated_at))
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                return Err(RepositoryError::Conflict(format!(
                    "pair '{}' already has a room",
                    room.pair_key.as_deref().unwrap_or_default()
                )));
            }
            Err(e) => return Err(query_error(e)),
        }

        let joined_at = format_datetime(&room.created_at);
        for member in members {
            sqlx::query("INSERT INTO room_members (room_id, user_id, joined_at) VALUES (?, ?, ?)")
                .bind(room.id.to_string())
                .bind(member.0)
                .bind(&joined_at)
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }

        tx.commit().await.map_err(query_error)?;
        Ok(room.clone())
    }

    async fn get_room(&self, id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM rooms WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let room_row =
                    RoomRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(room_row.into_room()?))
            }
            None => Ok(None),
        }
    }

    async fn find_direct_room(&self, pair_key: &str) -> Result<Option<Room>, RepositoryError> {
        // Served by the writer so a room committed by a concurrent creator
        // is always visible to the losing side of the race.
        let row = sqlx::query("SELECT * FROM rooms WHERE kind = 'direct' AND pair_key = ?")
            .bind(pair_key)
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let room_row =
                    RoomRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(room_row.into_room()?))
            }
            None => Ok(None),
        }
    }

    async fn list_members(&self, room_id: &RoomId) -> Result<Vec<MemberSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT u.id, u.display_name, u.avatar
             FROM room_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.room_id = ?
             ORDER BY u.id ASC",
        )
        .bind(room_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| -> Result<MemberSummary, RepositoryError> {
                Ok(MemberSummary {
                    id: UserId(row.try_get("id").map_err(query_error)?),
                    display_name: row.try_get("display_name").map_err(query_error)?,
                    avatar: row.try_get("avatar").map_err(query_error)?,
                })
            })
            .collect()
    }

    async fn is_member(&self, room_id: &RoomId, user_id: UserId) -> Result<bool, RepositoryError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM room_members WHERE room_id = ? AND user_id = ?")
                .bind(room_id.to_string())
                .bind(user_id.0)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(query_error)?;
        Ok(found.is_some())
    }

    async fn list_rooms_for_user(
        &self,
        user_id: UserId,
        limit: u32,
        after: Option<&RoomId>,
    ) -> Result<Vec<Room>, RepositoryError> {
        let mut sql = String::from(
            "SELECT r.* FROM rooms r
             JOIN room_members m ON m.room_id = r.id
             WHERE m.user_id = ?",
        );
        if after.is_some() {
            sql.push_str(" AND r.id > ?");
        }
        sql.push_str(" ORDER BY r.id ASC LIMIT ?");

        let mut query = sqlx::query(&sql).bind(user_id.0);
        if let Some(after) = after {
            query = query.bind(after.to_string());
        }
        let rows = query
            .bind(i64::from(limit))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows_into_rooms(&rows)
    }

    async fn add_member(&self, room_id: &RoomId, user_id: UserId) -> Result<(), RepositoryError> {
        let now = format_datetime(&chrono::Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO room_members (room_id, user_id, joined_at) VALUES (?, ?, ?)",
        )
        .bind(room_id.to_string())
        .bind(user_id.0)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        if inserted.rows_affected() > 0 {
            sqlx::query("UPDATE rooms SET updated_at = ? WHERE id = ?")
                .bind(&now)
                .bind(room_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }

        tx.commit().await.map_err(query_error)?;
        Ok(())
    }

    async fn remove_member(&self, room_id: &RoomId, user_id: UserId) -> Result<bool, RepositoryError> {
        let now = format_datetime(&chrono::Utc::now());
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let deleted = sqlx::query("DELETE FROM room_members WHERE room_id = ? AND user_id = ?")
            .bind(room_id.to_string())
            .bind(user_id.0)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            sqlx::query("UPDATE rooms SET updated_at = ? WHERE id = ?")
                .bind(&now)
                .bind(room_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(query_error)?;
        }

        tx.commit().await.map_err(query_error)?;
        Ok(removed)
    }

    async fn count_rooms(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::test_pool;
    use crate::sqlite::user::seed_users;
    use chrono::Utc;
    use tripchat_types::room::pair_key;

    fn group_room(name: Option<&str>) -> Room {
        let now = Utc::now();
        Room {
            id: RoomId::new(),
            name: name.map(String::from),
            kind: RoomKind::Group,
            pair_key: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn direct_room(a: i64, b: i64) -> Room {
        let now = Utc::now();
        Room {
            id: RoomId::new(),
            name: None,
            kind: RoomKind::Direct,
            pair_key: Some(pair_key(UserId(a), UserId(b))),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_room_with_members() {
        let pool = test_pool().await;
        seed_users(&pool, &[3, 7, 12]).await;
        let repo = SqliteRoomRepository::new(pool);

        let room = group_room(Some("Goa trip"));
        repo.create_room(&room, &[UserId(12), UserId(3), UserId(7)])
            .await
            .unwrap();

        let loaded = repo.get_room(&room.id).await.unwrap().unwrap();
        assert_eq!(loaded.name.as_deref(), Some("Goa trip"));
        assert_eq!(loaded.kind, RoomKind::Group);
        assert!(loaded.pair_key.is_none());

        let members = repo.list_members(&room.id).await.unwrap();
        let ids: Vec<UserId> = members.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![UserId(3), UserId(7), UserId(12)]);
        assert_eq!(members[0].display_name, "User 3");
    }

    #[tokio::test]
    async fn test_create_room_is_atomic_on_unknown_member() {
        let pool = test_pool().await;
        seed_users(&pool, &[1]).await;
        let repo = SqliteRoomRepository::new(pool);

        let room = group_room(None);
        let err = repo
            .create_room(&room, &[UserId(1), UserId(404)])
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Query(_)));
        assert!(repo.get_room(&room.id).await.unwrap().is_none());
        assert_eq!(repo.count_rooms().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_pair_key_is_conflict() {
        let pool = test_pool().await;
        seed_users(&pool, &[1, 2]).await;
        let repo = SqliteRoomRepository::new(pool);

        let first = direct_room(1, 2);
        repo.create_room(&first, &[UserId(1), UserId(2)]).await.unwrap();

        let err = repo
            .create_room(&direct_room(2, 1), &[UserId(1), UserId(2)])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let found = repo.find_direct_room("1:2").await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(repo.count_rooms().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_direct_room_ignores_groups() {
        let pool = test_pool().await;
        seed_users(&pool, &[1, 2]).await;
        let repo = SqliteRoomRepository::new(pool);

        repo.create_room(&group_room(None), &[UserId(1), UserId(2)])
            .await
            .unwrap();
        assert!(repo.find_direct_room("1:2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_rooms_for_user_keyset_pagination() {
        let pool = test_pool().await;
        seed_users(&pool, &[1, 2]).await;
        let repo = SqliteRoomRepository::new(pool);

        let mut mine = Vec::new();
        for _ in 0..3 {
            let room = group_room(None);
            repo.create_room(&room, &[UserId(1)]).await.unwrap();
            mine.push(room.id);
        }
        repo.create_room(&group_room(None), &[UserId(2)]).await.unwrap();
        mine.sort();

        let page = repo.list_rooms_for_user(UserId(1), 2, None).await.unwrap();
        let ids: Vec<RoomId> = page.iter().map(|r| r.id).collect();
        assert_eq!(ids, mine[..2].to_vec());

        let rest = repo
            .list_rooms_for_user(UserId(1), 2, Some(&ids[1]))
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, mine[2]);
    }

    #[tokio::test]
    async fn test_membership_changes() {
        let pool = test_pool().await;
        seed_users(&pool, &[1, 2]).await;
        let repo = SqliteRoomRepository::new(pool);
        let room = group_room(None);
        repo.create_room(&room, &[UserId(1)]).await.unwrap();

        assert!(!repo.is_member(&room.id, UserId(2)).await.unwrap());
        repo.add_member(&room.id, UserId(2)).await.unwrap();
        repo.add_member(&room.id, UserId(2)).await.unwrap();
        assert!(repo.is_member(&room.id, UserId(2)).await.unwrap());
        assert_eq!(repo.list_members(&room.id).await.unwrap().len(), 2);

        assert!(repo.remove_member(&room.id, UserId(2)).await.unwrap());
        assert!(!repo.remove_member(&room.id, UserId(2)).await.unwrap());
        assert!(!repo.is_member(&room.id, UserId(2)).await.unwrap());
    }
}
