//! SQLite message repository implementation.
//!
//! Messages are append-only. The membership check and the insert are a
//! single statement on the writer connection, so a non-member can never
//! leave a row behind. Timestamps are assigned inside the writer
//! transaction, which makes `(created_at, id)` order equal commit order.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use sqlx::Row;
use tripchat_core::repository::message::MessageRepository;
use tripchat_types::error::RepositoryError;
use tripchat_types::message::{Message, MessageId};
use tripchat_types::room::RoomId;
use tripchat_types::user::UserId;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `MessageRepository`.
#[derive(Clone)]
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct MessageRow {
    id: String,
    room_id: String,
    sender_id: i64,
    body: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            room_id: row.try_get("room_id")?,
            sender_id: row.try_get("sender_id")?,
            body: row.try_get("body")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let id = self
            .id
            .parse::<MessageId>()
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let room_id = self
            .room_id
            .parse::<RoomId>()
            .map_err(|e| RepositoryError::Query(format!("invalid room id: {e}")))?;

        Ok(Message {
            id,
            room_id,
            sender_id: UserId(self.sender_id),
            body: self.body,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl MessageRepository for SqliteMessageRepository {
    async fn append_message(&self, message: &Message) -> Result<Message, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        // The single writer connection is held from here to commit, so the
        // stamp below is ordered with every other append.
        let last: Option<String> =
            sqlx::query_scalar("SELECT MAX(created_at) FROM messages WHERE room_id = ?")
                .bind(message.room_id.to_string())
                .fetch_one(&mut *tx)
                .await
                .map_err(query_error)?;
        let last = last.as_deref().map(parse_datetime).transpose()?;
        let created_at = commit_timestamp(Utc::now(), last);

        let result = sqlx::query(
            "INSERT INTO messages (id, room_id, sender_id, body, created_at)
             SELECT ?, ?, ?, ?, ?
             WHERE EXISTS (SELECT 1 FROM room_members WHERE room_id = ? AND user_id = ?)",
        )
        .bind(message.id.to_string())
        .bind(message.room_id.to_string())
        .bind(message.sender_id.0)
        .bind(&message.body)
        .bind(format_datetime(&created_at))
        .bind(message.room_id.to_string())
        .bind(message.sender_id.0)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(query_error)?;
            return Err(RepositoryError::NotFound);
        }
        tx.commit().await.map_err(query_error)?;

        Ok(Message {
            created_at,
            ..message.clone()
        })
    }

    async fn get_message(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let message_row = MessageRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(message_row.into_message()?))
            }
            None => Ok(None),
        }
    }

    async fn list_messages(
        &self,
        room_id: &RoomId,
        limit: u32,
        before: Option<&Message>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM messages WHERE room_id = ?");
        if before.is_some() {
            sql.push_str(" AND (created_at < ? OR (created_at = ? AND id < ?))");
        }
        // Newest first so LIMIT keeps the page adjacent to the cursor.
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");

        let mut query = sqlx::query(&sql).bind(room_id.to_string());
        if let Some(cursor) = before {
            let ts = format_datetime(&cursor.created_at);
            query = query.bind(ts.clone()).bind(ts).bind(cursor.id.to_string());
        }
        let rows = query
            .bind(i64::from(limit))
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let mut messages = rows
            .iter()
            .map(|row| {
                MessageRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_message()
            })
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn count_messages(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(query_error)?;
        Ok(count as u64)
    }
}

/// Microsecond timestamp for a new message, strictly after `last`.
fn commit_timestamp(now: DateTime<Utc>, last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(6);
    match last {
        Some(last) if last >= now => last + Duration::microseconds(1),
        _ => now,
    }
}
