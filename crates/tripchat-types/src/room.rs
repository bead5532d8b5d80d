//! Room and membership types.
//!
//! A room is either a named group with any number of members, or a direct
//! room between exactly two users. The kind is stored explicitly so that a
//! two-member group is never mistaken for a direct room.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::user::{MemberSummary, UserId};

/// Unique identifier for a room, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub Uuid);

impl RoomId {
    /// Create a new RoomId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// How a room came to exist.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (kind IN ('direct', 'group'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    /// Two-party room created by the resolver. Membership is fixed.
    Direct,
    /// Explicitly created room, optionally named.
    Group,
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKind::Direct => write!(f, "direct"),
            RoomKind::Group => write!(f, "group"),
        }
    }
}

impl FromStr for RoomKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(RoomKind::Direct),
            "group" => Ok(RoomKind::Group),
            other => Err(format!("invalid room kind: '{other}'")),
        }
    }
}

/// A persisted chat room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: Option<String>,
    pub kind: RoomKind,
    /// Canonical pair key, set only for direct rooms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A room together with its member list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetail {
    #[serde(flatten)]
    pub room: Room,
    pub members: Vec<MemberSummary>,
}

impl RoomDetail {
    pub fn member_ids(&self) -> Vec<UserId> {
        self.members.iter().map(|m| m.id).collect()
    }

    pub fn has_member(&self, user_id: UserId) -> bool {
        self.members.iter().any(|m| m.id == user_id)
    }
}

/// Keyset pagination over a user's rooms, ordered by room id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoomPage {
    pub limit: Option<u32>,
    /// Only rooms with an id strictly greater than this one.
    pub after: Option<RoomId>,
}

/// Order-independent key identifying the direct room between two users.
///
/// `pair_key(a, b) == pair_key(b, a)` for all `a`, `b`.
pub fn pair_key(a: UserId, b: UserId) -> String {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    format!("{lo}:{hi}")
}
