//! Query parameter extractors for list endpoints.
//!
//! Ids arrive as strings and are parsed here so that a malformed id is a
//! `VALIDATION_ERROR` in the usual envelope.

use serde::Deserialize;

use tripchat_types::message::{MessageId, MessageQuery};
use tripchat_types::room::{RoomId, RoomPage};

use crate::http::error::AppError;

/// Query parameters for `GET /rooms`.
#[derive(Debug, Deserialize, Default)]
pub struct RoomListQuery {
    pub limit: Option<u32>,
    /// Keyset cursor: only rooms with a greater id.
    pub after: Option<String>,
}

impl RoomListQuery {
    pub fn into_page(self) -> Result<RoomPage, AppError> {
        Ok(RoomPage {
            limit: self.limit,
            after: self.after.as_deref().map(parse_room_id).transpose()?,
        })
    }
}

/// Query parameters for `GET /rooms/{room_id}/messages`.
#[derive(Debug, Deserialize, Default)]
pub struct MessageListQuery {
    pub limit: Option<u32>,
    /// Cursor: only messages strictly older than this message.
    pub before: Option<String>,
}

impl MessageListQuery {
    pub fn into_query(self) -> Result<MessageQuery, AppError> {
        let before = self
            .before
            .as_deref()
            .map(|s| {
                s.parse::<MessageId>()
                    .map_err(|_| AppError::Validation(format!("invalid message id '{s}'")))
            })
            .transpose()?;
        Ok(MessageQuery {
            limit: self.limit,
            before,
        })
    }
}

pub fn parse_room_id(s: &str) -> Result<RoomId, AppError> {
    s.parse()
        .map_err(|_| AppError::Validation(format!("invalid room id '{s}'")))
}
