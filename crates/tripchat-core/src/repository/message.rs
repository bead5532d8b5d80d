//! Message repository trait definition.

use tripchat_types::error::RepositoryError;
use tripchat_types::message::{Message, MessageId};
use tripchat_types::room::RoomId;

/// Repository trait for append-only message storage.
pub trait MessageRepository: Send + Sync {
    /// Append a message and return it as stored.
    ///
    /// `created_at` is assigned by the store at commit time and is strictly
    /// greater than every earlier message in the room, so canonical order is
    /// commit order. The timestamp on the input is ignored.
    ///
    /// The sender's membership is checked in the same write as the insert;
    /// returns `NotFound` (and writes nothing) when the sender is not a member
    /// of the room.
    fn append_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// Get a message by its unique ID.
    fn get_message(
        &self,
        id: &MessageId,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// The `limit` most recent messages strictly before `before` (or the most
    /// recent overall when `None`), returned in ascending canonical order.
    fn list_messages(
        &self,
        room_id: &RoomId,
        limit: u32,
        before: Option<&Message>,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Count messages across all rooms.
    fn count_messages(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
