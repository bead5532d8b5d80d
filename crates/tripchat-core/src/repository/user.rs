//! User directory trait definition.

use tripchat_types::error::RepositoryError;
use tripchat_types::user::{User, UserId};

/// Read access to users owned by the identity subsystem, plus the small
/// administrative surface used to provision them.
pub trait UserDirectory: Send + Sync {
    /// Get a user by ID.
    fn get_user(
        &self,
        id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Insert a user or update its profile fields. The ban flag is untouched
    /// on update.
    fn upsert_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Set or clear the ban flag. Returns `NotFound` for unknown users.
    fn set_banned(
        &self,
        id: UserId,
        banned: bool,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Count known users.
    fn count_users(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
