//! Message store service.
//!
//! Append-only storage and ordered retrieval of room messages. The canonical
//! order is creation timestamp ascending, ties broken by message id.

use chrono::{SubsecRound, Utc};
use tracing::{debug, info};
use tripchat_types::config::ChatConfig;
use tripchat_types::error::{ChatError, RepositoryError};
use tripchat_types::message::{Message, MessageId, MessageQuery};
use tripchat_types::room::RoomId;
use tripchat_types::user::UserId;

use crate::repository::message::MessageRepository;
use crate::repository::room::RoomRepository;
use crate::service::storage::StorageGuard;

pub struct MessageStore<M: MessageRepository, R: RoomRepository> {
    messages: M,
    rooms: R,
    guard: StorageGuard,
    config: ChatConfig,
}

impl<M: MessageRepository, R: RoomRepository> MessageStore<M, R> {
    pub fn new(messages: M, rooms: R, config: ChatConfig) -> Self {
        Self {
            messages,
            rooms,
            guard: StorageGuard::from_config(&config),
            config,
        }
    }

    /// Append a message to a room on behalf of one of its members.
    ///
    /// The body is stored exactly as given. The store assigns the timestamp
    /// when the write commits. The write is never retried.
    pub async fn send_message(
        &self,
        room_id: &RoomId,
        sender_id: UserId,
        body: &str,
    ) -> Result<Message, ChatError> {
        if body.trim().is_empty() {
            return Err(ChatError::Validation(
                "message body cannot be empty".to_string(),
            ));
        }
        let len = body.chars().count();
        if len > self.config.max_body_len {
            return Err(ChatError::Validation(format!(
                "message body is {len} characters, the maximum is {}",
                self.config.max_body_len
            )));
        }
        self.require_room(room_id).await?;

        let draft = Message {
            id: MessageId::new(),
            room_id: *room_id,
            sender_id,
            body: body.to_string(),
            created_at: Utc::now().trunc_subsecs(6),
        };

        let message = match self.guard.write(self.messages.append_message(&draft)).await {
            Ok(message) => message,
            Err(RepositoryError::NotFound) => {
                return Err(ChatError::NotFound(format!(
                    "user {sender_id} is not a member of room {room_id}"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            room_id = %room_id,
            message_id = %message.id,
            sender_id = %sender_id,
            "Message stored"
        );
        Ok(message)
    }

    /// A page of messages in canonical ascending order.
    ///
    /// Without a cursor the page holds the most recent messages. With a
    /// `before` cursor it holds the messages immediately preceding it.
    pub async fn get_messages(
        &self,
        room_id: &RoomId,
        query: MessageQuery,
    ) -> Result<Vec<Message>, ChatError> {
        let limit = self.config.resolve_limit(query.limit)?;
        self.require_room(room_id).await?;

        let cursor = match query.before {
            Some(before) => Some(self.resolve_cursor(room_id, &before).await?),
            None => None,
        };

        let page = self
            .guard
            .read(|| self.messages.list_messages(room_id, limit, cursor.as_ref()))
            .await?;

        debug!(room_id = %room_id, count = page.len(), limit, "Listed messages");
        Ok(page)
    }

    pub async fn count_messages(&self) -> Result<u64, ChatError> {
        Ok(self.guard.read(|| self.messages.count_messages()).await?)
    }

    async fn resolve_cursor(
        &self,
        room_id: &RoomId,
        before: &MessageId,
    ) -> Result<Message, ChatError> {
        let cursor = self
            .guard
            .read(|| self.messages.get_message(before))
            .await?;
        match cursor {
            Some(message) if message.room_id == *room_id => Ok(message),
            _ => Err(ChatError::Validation(format!(
                "cursor {before} does not belong to room {room_id}"
            ))),
        }
    }

    async fn require_room(&self, room_id: &RoomId) -> Result<(), ChatError> {
        match self.guard.read(|| self.rooms.get_room(room_id)).await? {
            Some(_) => Ok(()),
            None => Err(ChatError::NotFound(format!("room {room_id} not found"))),
        }
    }
}
