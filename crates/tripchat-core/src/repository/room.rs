//! Room repository trait definition.

use tripchat_types::error::RepositoryError;
use tripchat_types::room::{Room, RoomId};
use tripchat_types::user::{MemberSummary, UserId};

/// Repository trait for rooms and their membership.
///
/// Implementations live in tripchat-infra (e.g., `SqliteRoomRepository`).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait RoomRepository: Send + Sync {
    /// Insert a room and one membership row per member as a single atomic unit.
    ///
    /// Returns `Conflict` when a direct room with the same pair key already
    /// exists.
    fn create_room(
        &self,
        room: &Room,
        members: &[UserId],
    ) -> impl std::future::Future<Output = Result<Room, RepositoryError>> + Send;

    /// Get a room by its unique ID.
    fn get_room(
        &self,
        id: &RoomId,
    ) -> impl std::future::Future<Output = Result<Option<Room>, RepositoryError>> + Send;

    /// Find the direct room registered under a canonical pair key.
    fn find_direct_room(
        &self,
        pair_key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Room>, RepositoryError>> + Send;

    /// Members of a room, ordered by user id.
    fn list_members(
        &self,
        room_id: &RoomId,
    ) -> impl std::future::Future<Output = Result<Vec<MemberSummary>, RepositoryError>> + Send;

    /// Whether a membership row exists for the pair.
    fn is_member(
        &self,
        room_id: &RoomId,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Rooms the user belongs to, ordered by room id ascending.
    fn list_rooms_for_user(
        &self,
        user_id: UserId,
        limit: u32,
        after: Option<&RoomId>,
    ) -> impl std::future::Future<Output = Result<Vec<Room>, RepositoryError>> + Send;

    /// Add a member. Adding an existing member is a no-op.
    fn add_member(
        &self,
        room_id: &RoomId,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove a member. Returns `false` if no membership existed.
    fn remove_member(
        &self,
        room_id: &RoomId,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Count rooms across all users.
    fn count_rooms(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
