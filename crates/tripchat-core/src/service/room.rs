//! Room registry service.
//!
//! Creates group rooms, reports membership, lists a user's rooms and checks
//! room existence. Direct rooms are created by the
//! [`RoomResolver`](crate::service::resolver::RoomResolver) and only read here.

use std::collections::BTreeSet;

use chrono::{SubsecRound, Utc};
use tracing::{debug, info, warn};
use tripchat_types::config::ChatConfig;
use tripchat_types::error::ChatError;
use tripchat_types::room::{Room, RoomDetail, RoomId, RoomKind, RoomPage};
use tripchat_types::user::UserId;

use crate::repository::room::RoomRepository;
use crate::repository::user::UserDirectory;
use crate::service::storage::StorageGuard;

/// Service owning room and membership rules.
///
/// Generic over the room repository and user directory so that
/// tripchat-core never depends on tripchat-infra.
pub struct RoomRegistry<R: RoomRepository, U: UserDirectory> {
    rooms: R,
    users: U,
    guard: StorageGuard,
    config: ChatConfig,
}

impl<R: RoomRepository, U: UserDirectory> RoomRegistry<R, U> {
    pub fn new(rooms: R, users: U, config: ChatConfig) -> Self {
        Self {
            rooms,
            users,
            guard: StorageGuard::from_config(&config),
            config,
        }
    }

    /// Create a named or unnamed group room with the given members.
    ///
    /// Duplicate ids are collapsed. Every member must be a known user.
    pub async fn create_room(
        &self,
        name: Option<String>,
        member_ids: &[UserId],
    ) -> Result<RoomDetail, ChatError> {
        let members: BTreeSet<UserId> = member_ids.iter().copied().collect();
        if members.is_empty() {
            return Err(ChatError::Validation(
                "a room needs at least one member".to_string(),
            ));
        }
        for id in &members {
            self.require_user(*id).await?;
        }

        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let now = Utc::now().trunc_subsecs(6);
        let room = Room {
            id: RoomId::new(),
            name,
            kind: RoomKind::Group,
            pair_key: None,
            created_at: now,
            updated_at: now,
        };

        let members: Vec<UserId> = members.into_iter().collect();
        let room = self
            .guard
            .write(self.rooms.create_room(&room, &members))
            .await?;

        info!(room_id = %room.id, members = members.len(), "Created group room");
        self.load_detail(room).await
    }

    /// Rooms the user belongs to, ordered by room id, each with its members.
    pub async fn get_rooms_for_user(
        &self,
        user_id: UserId,
        page: RoomPage,
    ) -> Result<Vec<RoomDetail>, ChatError> {
        let limit = self.config.resolve_limit(page.limit)?;
        let after = page.after;
        let rooms = self
            .guard
            .read(|| self.rooms.list_rooms_for_user(user_id, limit, after.as_ref()))
            .await?;

        debug!(user_id = %user_id, count = rooms.len(), "Listed rooms for user");

        let mut details = Vec::with_capacity(rooms.len());
        for room in rooms {
            details.push(self.load_detail(room).await?);
        }
        Ok(details)
    }

    /// Room plus its full member list.
    pub async fn get_room_detail(&self, room_id: &RoomId) -> Result<RoomDetail, ChatError> {
        let room = self.require_room(room_id).await?;
        self.load_detail(room).await
    }

    /// Existence check for request pre-validation. Storage failures are
    /// logged and reported as `false`.
    pub async fn room_exists(&self, room_id: &RoomId) -> bool {
        match self.guard.read(|| self.rooms.get_room(room_id)).await {
            Ok(room) => room.is_some(),
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Room existence check failed");
                false
            }
        }
    }

    pub async fn is_member(&self, room_id: &RoomId, user_id: UserId) -> Result<bool, ChatError> {
        Ok(self
            .guard
            .read(|| self.rooms.is_member(room_id, user_id))
            .await?)
    }

    /// Add a user to a group room. Adding an existing member is a no-op.
    pub async fn add_member(
        &self,
        room_id: &RoomId,
        user_id: UserId,
    ) -> Result<RoomDetail, ChatError> {
        let room = self.require_group(room_id).await?;
        self.require_user(user_id).await?;

        self.guard
            .write(self.rooms.add_member(room_id, user_id))
            .await?;

        info!(room_id = %room_id, user_id = %user_id, "Added room member");
        self.load_detail(room).await
    }

    /// Remove a user from a group room.
    pub async fn remove_member(&self, room_id: &RoomId, user_id: UserId) -> Result<(), ChatError> {
        self.require_group(room_id).await?;

        let removed = self
            .guard
            .write(self.rooms.remove_member(room_id, user_id))
            .await?;
        if !removed {
            return Err(ChatError::NotFound(format!(
                "user {user_id} is not a member of room {room_id}"
            )));
        }

        info!(room_id = %room_id, user_id = %user_id, "Removed room member");
        Ok(())
    }

    async fn load_detail(&self, room: Room) -> Result<RoomDetail, ChatError> {
        let members = self
            .guard
            .read(|| self.rooms.list_members(&room.id))
            .await?;
        Ok(RoomDetail { room, members })
    }

    async fn require_room(&self, room_id: &RoomId) -> Result<Room, ChatError> {
        self.guard
            .read(|| self.rooms.get_room(room_id))
            .await?
            .ok_or_else(|| ChatError::NotFound(format!("room {room_id} not found")))
    }

    async fn require_group(&self, room_id: &RoomId) -> Result<Room, ChatError> {
        let room = self.require_room(room_id).await?;
        if room.kind == RoomKind::Direct {
            return Err(ChatError::Validation(
                "direct room membership cannot be changed".to_string(),
            ));
        }
        Ok(room)
    }

    async fn require_user(&self, user_id: UserId) -> Result<(), ChatError> {
        match self.guard.read(|| self.users.get_user(user_id)).await? {
            Some(_) => Ok(()),
            None => Err(ChatError::NotFound(format!("user {user_id} not found"))),
        }
    }

    pub async fn count_rooms(&self) -> Result<u64, ChatError> {
        Ok(self.guard.read(|| self.rooms.count_rooms()).await?)
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}
