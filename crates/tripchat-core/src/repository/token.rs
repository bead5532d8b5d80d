//! Access token repository trait definition.
//!
//! Tokens are opaque bearer strings. Only their SHA-256 hash is stored; the
//! plaintext is shown once at issue time.

use tripchat_types::error::RepositoryError;
use tripchat_types::identity::Identity;
use tripchat_types::user::UserId;

pub trait AccessTokenRepository: Send + Sync {
    /// Store the hash of a freshly issued token for a user.
    fn store_token(
        &self,
        user_id: UserId,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Resolve a token hash to the identity of its owner.
    fn resolve_identity(
        &self,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<Identity>, RepositoryError>> + Send;

    /// Revoke every token of a user. Returns the number revoked.
    fn revoke_tokens(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
