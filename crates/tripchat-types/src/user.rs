use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Identifier of a user, as assigned by the identity subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Account role.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'advisor', 'admin'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Advisor,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Advisor => write!(f, "advisor"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "advisor" => Ok(Role::Advisor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("invalid role: '{other}'")),
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// A user account known to the chat layer.
///
/// Users are owned by the identity subsystem. The chat layer reads them to
/// annotate member lists and never creates them as a side effect of a chat
/// operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    /// Opaque reference to an avatar hosted elsewhere.
    pub avatar: Option<String>,
    pub role: Role,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a room member. Carries no sensitive fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: UserId,
    pub display_name: String,
    pub avatar: Option<String>,
}

impl From<&User> for MemberSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        for role in [Role::User, Role::Advisor, Role::Admin] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(role, parsed);
        }
        assert!("moderator".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_id_is_transparent_in_json() {
        let json = serde_json::to_string(&UserId(12)).unwrap();
        assert_eq!(json, "12");
        assert_eq!(" 7 ".parse::<UserId>().unwrap(), UserId(7));
    }

    #[test]
    fn test_member_summary_drops_sensitive_fields() {
        let user = User {
            id: UserId(7),
            display_name: "Amira".to_string(),
            avatar: Some("avatars/7.png".to_string()),
            role: Role::Advisor,
            banned: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let summary = MemberSummary::from(&user);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["display_name"], "Amira");
        assert!(json.get("role").is_none());
        assert!(json.get("banned").is_none());
    }
}
