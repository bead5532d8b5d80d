//! HTTP request handlers for the REST API.

pub mod message;
pub mod room;

use tripchat_types::error::ChatError;
use tripchat_types::identity::Identity;
use tripchat_types::room::RoomId;

use crate::http::error::AppError;
use crate::state::AppState;

/// Allow the caller to read or manage a room.
///
/// Members and admins pass. Everyone else gets `NotFound` for a missing room
/// and `Forbidden` for an existing one.
pub(crate) async fn ensure_room_access(
    state: &AppState,
    identity: &Identity,
    room_id: &RoomId,
) -> Result<(), AppError> {
    if !identity.is_admin() && state.rooms.is_member(room_id, identity.id).await? {
        return Ok(());
    }
    if !state.rooms.room_exists(room_id).await {
        return Err(ChatError::NotFound(format!("room {room_id} not found")).into());
    }
    if identity.is_admin() {
        return Ok(());
    }
    Err(ChatError::Forbidden(format!("not a member of room {room_id}")).into())
}
