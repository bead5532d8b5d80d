//! In-memory repository doubles for service tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, SubsecRound, Utc};
use tripchat_types::error::RepositoryError;
use tripchat_types::message::{Message, MessageId};
use tripchat_types::room::{Room, RoomId, RoomKind};
use tripchat_types::user::{MemberSummary, Role, User, UserId};

use crate::repository::message::MessageRepository;
use crate::repository::room::RoomRepository;
use crate::repository::user::UserDirectory;

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    rooms: BTreeMap<RoomId, Room>,
    members: BTreeSet<(RoomId, UserId)>,
    messages: Vec<Message>,
}

/// Shared in-memory store implementing every chat port.
///
/// Clones share state, so one clone can be handed to each service.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    /// Number of upcoming reads that fail with a transient error.
    failing_reads: Arc<AtomicU32>,
    /// When set, the next direct-room insert loses a race to a phantom writer.
    lose_next_direct_race: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn with_users(ids: &[i64]) -> Self {
        let store = Self::default();
        for id in ids {
            store.add_user(*id, &format!("User {id}"));
        }
        store
    }

    pub fn add_user(&self, id: i64, name: &str) {
        let now = Utc::now();
        self.state.lock().unwrap().users.insert(
            UserId(id),
            User {
                id: UserId(id),
                display_name: name.to_string(),
                avatar: None,
                role: Role::User,
                banned: false,
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub fn fail_next_reads(&self, n: u32) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    pub fn lose_next_direct_race(&self) {
        self.lose_next_direct_race.store(true, Ordering::SeqCst);
    }

    pub fn room_count(&self) -> usize {
        self.state.lock().unwrap().rooms.len()
    }

    pub fn message_count(&self) -> usize {
        self.state.lock().unwrap().messages.len()
    }

    fn check_read(&self) -> Result<(), RepositoryError> {
        let remaining = self.failing_reads.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_reads.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Query("database is locked".to_string()));
        }
        Ok(())
    }
}

impl RoomRepository for InMemoryStore {
    async fn create_room(&self, room: &Room, members: &[UserId]) -> Result<Room, RepositoryError> {
        let mut state = self.state.lock().unwrap();

        if let Some(key) = &room.pair_key {
            if self.lose_next_direct_race.swap(false, Ordering::SeqCst) {
                let winner = Room {
                    id: RoomId::new(),
                    ..room.clone()
                };
                for member in members {
                    state.members.insert((winner.id, *member));
                }
                state.rooms.insert(winner.id, winner);
            }
            if state.rooms.values().any(|r| r.pair_key.as_ref() == Some(key)) {
                return Err(RepositoryError::Conflict(format!("pair '{key}' already exists")));
            }
        }
        if members.iter().any(|m| !state.users.contains_key(m)) {
            return Err(RepositoryError::Query("FOREIGN KEY constraint failed".to_string()));
        }

        for member in members {
            state.members.insert((room.id, *member));
        }
        state.rooms.insert(room.id, room.clone());
        Ok(room.clone())
    }

    async fn get_room(&self, id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        self.check_read()?;
        Ok(self.state.lock().unwrap().rooms.get(id).cloned())
    }

    async fn find_direct_room(&self, pair_key: &str) -> Result<Option<Room>, RepositoryError> {
        self.check_read()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .rooms
            .values()
            .find(|r| r.kind == RoomKind::Direct && r.pair_key.as_deref() == Some(pair_key))
            .cloned())
    }

    async fn list_members(&self, room_id: &RoomId) -> Result<Vec<MemberSummary>, RepositoryError> {
        self.check_read()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .members
            .iter()
            .filter(|(r, _)| r == room_id)
            .filter_map(|(_, u)| state.users.get(u).map(MemberSummary::from))
            .collect())
    }

    async fn is_member(&self, room_id: &RoomId, user_id: UserId) -> Result<bool, RepositoryError> {
        self.check_read()?;
        Ok(self.state.lock().unwrap().members.contains(&(*room_id, user_id)))
    }

    async fn list_rooms_for_user(
        &self,
        user_id: UserId,
        limit: u32,
        after: Option<&RoomId>,
    ) -> Result<Vec<Room>, RepositoryError> {
        self.check_read()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .rooms
            .values()
            .filter(|r| state.members.contains(&(r.id, user_id)))
            .filter(|r| after.is_none_or(|a| r.id > *a))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn add_member(&self, room_id: &RoomId, user_id: UserId) -> Result<(), RepositoryError> {
        self.state.lock().unwrap().members.insert((*room_id, user_id));
        Ok(())
    }

    async fn remove_member(&self, room_id: &RoomId, user_id: UserId) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().unwrap().members.remove(&(*room_id, user_id)))
    }

    async fn count_rooms(&self) -> Result<u64, RepositoryError> {
        Ok(self.room_count() as u64)
    }
}

impl MessageRepository for InMemoryStore {
    async fn append_message(&self, message: &Message) -> Result<Message, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if !state.members.contains(&(message.room_id, message.sender_id)) {
            return Err(RepositoryError::NotFound);
        }
        let last = state
            .messages
            .iter()
            .filter(|m| m.room_id == message.room_id)
            .map(|m| m.created_at)
            .max();
        let now = Utc::now().trunc_subsecs(6);
        let stored = Message {
            created_at: match last {
                Some(last) if last >= now => last + Duration::microseconds(1),
                _ => now,
            },
            ..message.clone()
        };
        state.messages.push(stored.clone());
        Ok(stored)
    }

    async fn get_message(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError> {
        self.check_read()?;
        let state = self.state.lock().unwrap();
        Ok(state.messages.iter().find(|m| m.id == *id).cloned())
    }

    async fn list_messages(
        &self,
        room_id: &RoomId,
        limit: u32,
        before: Option<&Message>,
    ) -> Result<Vec<Message>, RepositoryError> {
        self.check_read()?;
        let state = self.state.lock().unwrap();
        let mut page: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.room_id == *room_id)
            .filter(|m| before.is_none_or(|c| m.order_key() < c.order_key()))
            .cloned()
            .collect();
        page.sort_by_key(Message::order_key);
        let skip = page.len().saturating_sub(limit as usize);
        Ok(page.split_off(skip))
    }

    async fn count_messages(&self) -> Result<u64, RepositoryError> {
        Ok(self.message_count() as u64)
    }
}

impl UserDirectory for InMemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.check_read()?;
        Ok(self.state.lock().unwrap().users.get(&id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let banned = state.users.get(&user.id).map(|u| u.banned).unwrap_or(user.banned);
        let stored = User {
            banned,
            ..user.clone()
        };
        state.users.insert(user.id, stored.clone());
        Ok(stored)
    }

    async fn set_banned(&self, id: UserId, banned: bool) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let user = state.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.banned = banned;
        Ok(())
    }

    async fn count_users(&self) -> Result<u64, RepositoryError> {
        Ok(self.state.lock().unwrap().users.len() as u64)
    }
}
