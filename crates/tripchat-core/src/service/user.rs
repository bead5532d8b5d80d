//! User provisioning service.
//!
//! Users belong to the identity subsystem; this is the small administrative
//! surface the CLI uses to seed and moderate them.

use chrono::{SubsecRound, Utc};
use tracing::info;
use tripchat_types::config::ChatConfig;
use tripchat_types::error::{ChatError, RepositoryError};
use tripchat_types::user::{Role, User, UserId};

use crate::repository::user::UserDirectory;
use crate::service::storage::StorageGuard;

pub struct UserService<U: UserDirectory> {
    users: U,
    guard: StorageGuard,
}

impl<U: UserDirectory> UserService<U> {
    pub fn new(users: U, config: &ChatConfig) -> Self {
        Self {
            users,
            guard: StorageGuard::from_config(config),
        }
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, ChatError> {
        self.guard
            .read(|| self.users.get_user(id))
            .await?
            .ok_or_else(|| ChatError::NotFound(format!("user {id} not found")))
    }

    /// Create a user or update its display name, avatar and role.
    pub async fn upsert_user(
        &self,
        id: UserId,
        display_name: &str,
        avatar: Option<String>,
        role: Role,
    ) -> Result<User, ChatError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(ChatError::Validation(
                "display name cannot be empty".to_string(),
            ));
        }

        let now = Utc::now().trunc_subsecs(6);
        let user = User {
            id,
            display_name: display_name.to_string(),
            avatar,
            role,
            banned: false,
            created_at: now,
            updated_at: now,
        };
        let user = self.guard.write(self.users.upsert_user(&user)).await?;

        info!(user_id = %user.id, role = %user.role, "Upserted user");
        Ok(user)
    }

    pub async fn set_banned(&self, id: UserId, banned: bool) -> Result<User, ChatError> {
        match self.guard.write(self.users.set_banned(id, banned)).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => {
                return Err(ChatError::NotFound(format!("user {id} not found")));
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %id, banned, "Updated ban flag");
        self.get_user(id).await
    }

    pub async fn count_users(&self) -> Result<u64, ChatError> {
        Ok(self.guard.read(|| self.users.count_users()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryStore;

    fn service(store: &InMemoryStore) -> UserService<InMemoryStore> {
        UserService::new(store.clone(), &ChatConfig::default())
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let store = InMemoryStore::default();
        let users = service(&store);

        let user = users
            .upsert_user(UserId(7), "  Asha ", None, Role::Advisor)
            .await
            .unwrap();
        assert_eq!(user.display_name, "Asha");

        let loaded = users.get_user(UserId(7)).await.unwrap();
        assert_eq!(loaded.role, Role::Advisor);
        assert!(!loaded.banned);
        assert_eq!(users.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_ban_flag() {
        let store = InMemoryStore::default();
        let users = service(&store);
        users.upsert_user(UserId(1), "Ravi", None, Role::User).await.unwrap();
        users.set_banned(UserId(1), true).await.unwrap();

        let updated = users
            .upsert_user(UserId(1), "Ravi K", Some("a.png".to_string()), Role::User)
            .await
            .unwrap();
        assert!(updated.banned);
        assert_eq!(updated.avatar.as_deref(), Some("a.png"));
    }

    #[tokio::test]
    async fn test_ban_unknown_user() {
        let store = InMemoryStore::default();
        let err = service(&store).set_banned(UserId(9), true).await.unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_blank_display_name_rejected() {
        let store = InMemoryStore::default();
        let err = service(&store)
            .upsert_user(UserId(1), " ", None, Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }
}
