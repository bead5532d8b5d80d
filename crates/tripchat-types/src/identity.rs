use serde::{Deserialize, Serialize};

use crate::user::{Role, UserId};

/// The verified caller of a chat operation.
///
/// Attached to each inbound request by the access gate and passed explicitly
/// to every call site. The chat services trust it as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub role: Role,
    pub banned: bool,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin() {
        let admin = Identity {
            id: UserId(1),
            role: Role::Admin,
            banned: false,
        };
        let advisor = Identity {
            role: Role::Advisor,
            ..admin
        };
        assert!(admin.is_admin());
        assert!(!advisor.is_admin());
    }
}
