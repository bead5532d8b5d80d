//! Direct room resolver.
//!
//! Finds or creates the unique direct room between two users. Uniqueness is
//! enforced by the storage layer on the canonical pair key; a creator that
//! loses a race sees a `Conflict` and re-reads the winner's room.

use chrono::{SubsecRound, Utc};
use tracing::{debug, info, warn};
use tripchat_types::config::ChatConfig;
use tripchat_types::error::{ChatError, RepositoryError};
use tripchat_types::room::{Room, RoomDetail, RoomId, RoomKind, pair_key};
use tripchat_types::user::UserId;

use crate::repository::room::RoomRepository;
use crate::repository::user::UserDirectory;
use crate::service::storage::StorageGuard;

/// Number of lookup/create rounds before giving up.
const MAX_ATTEMPTS: usize = 2;

pub struct RoomResolver<R: RoomRepository, U: UserDirectory> {
    rooms: R,
    users: U,
    guard: StorageGuard,
}

impl<R: RoomRepository, U: UserDirectory> RoomResolver<R, U> {
    pub fn new(rooms: R, users: U, config: &ChatConfig) -> Self {
        Self {
            rooms,
            users,
            guard: StorageGuard::from_config(config),
        }
    }

    /// Return the direct room for the unordered pair, creating it on first use.
    ///
    /// Idempotent under argument order and safe under concurrent callers.
    pub async fn get_or_create_room(
        &self,
        user_a: UserId,
        user_b: UserId,
    ) -> Result<RoomDetail, ChatError> {
        if user_a == user_b {
            return Err(ChatError::Validation(
                "cannot open a direct room with yourself".to_string(),
            ));
        }
        for id in [user_a, user_b] {
            if self.guard.read(|| self.users.get_user(id)).await?.is_none() {
                return Err(ChatError::NotFound(format!("user {id} not found")));
            }
        }

        let key = pair_key(user_a, user_b);
        let members = if user_a < user_b {
            [user_a, user_b]
        } else {
            [user_b, user_a]
        };

        for attempt in 0..MAX_ATTEMPTS {
            if let Some(room) = self.guard.read(|| self.rooms.find_direct_room(&key)).await? {
                debug!(room_id = %room.id, pair = %key, "Found direct room");
                return self.load_detail(room).await;
            }

            let now = Utc::now().trunc_subsecs(6);
            let room = Room {
                id: RoomId::new(),
                name: None,
                kind: RoomKind::Direct,
                pair_key: Some(key.clone()),
                created_at: now,
                updated_at: now,
            };

            match self.guard.write(self.rooms.create_room(&room, &members)).await {
                Ok(room) => {
                    info!(room_id = %room.id, pair = %key, "Created direct room");
                    return self.load_detail(room).await;
                }
                Err(RepositoryError::Conflict(_)) => {
                    warn!(pair = %key, attempt, "Direct room created concurrently, re-reading");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ChatError::Storage(format!(
            "direct room for pair {key} could not be resolved"
        )))
    }

    async fn load_detail(&self, room: Room) -> Result<RoomDetail, ChatError> {
        let members = self
            .guard
            .read(|| self.rooms.list_members(&room.id))
            .await?;
        Ok(RoomDetail { room, members })
    }
}
