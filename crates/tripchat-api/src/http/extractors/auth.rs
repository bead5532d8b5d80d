//! Access token authentication extractor.
//!
//! Extracts the caller's token from:
//! - `Authorization: Bearer <token>` header
//! - `X-Access-Token: <token>` header
//!
//! Tokens are SHA-256 hashed and resolved against the `access_tokens` table.
//! The resulting [`Identity`] is handed to each handler explicitly.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};

use tripchat_core::repository::token::AccessTokenRepository;
use tripchat_types::error::ChatError;
use tripchat_types::identity::Identity;
use tripchat_types::user::UserId;

use crate::http::error::AppError;
use crate::state::AppState;

/// Prefix of every issued token.
pub const TOKEN_PREFIX: &str = "tc_";

/// The verified caller. Extracting this rejects missing, unknown and banned
/// identities before any chat operation runs.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Identity);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or(ChatError::Unauthenticated)?;
        let token_hash = hash_token(&token);

        let identity = state
            .tokens
            .resolve_identity(&token_hash)
            .await
            .map_err(ChatError::from)?
            .ok_or(ChatError::Unauthenticated)?;

        if identity.banned {
            tracing::info!(user_id = %identity.id, "Rejected request from banned user");
            return Err(ChatError::Forbidden("account is banned".to_string()).into());
        }

        Ok(Authenticated(identity))
    }
}

/// Extract the raw token from request headers.
///
/// Headers that are present but unreadable or empty count as missing.
pub fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(auth) = parts.headers.get("authorization") {
        if let Some(token) = auth
            .to_str()
            .ok()
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            return Some(token.to_string());
        }
    }

    parts
        .headers
        .get("x-access-token")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Compute SHA-256 hash of a token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

/// Generate a token for a user and store its hash.
///
/// Returns the plaintext token, which is never stored.
pub async fn issue_token(state: &AppState, user_id: UserId) -> anyhow::Result<String> {
    // Fails with NotFound for unknown users.
    state.users.get_user(user_id).await?;

    use aes_gcm::aead::{OsRng, rand_core::RngCore};
    let mut token_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut token_bytes);
    let token = format!(
        "{TOKEN_PREFIX}{}",
        token_bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    );

    state
        .tokens
        .store_token(user_id, &hash_token(&token))
        .await
        .map_err(ChatError::from)?;

    tracing::info!(user_id = %user_id, "Issued access token");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use axum::http::Request;

    fn parts_with(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/rooms");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_extract_bearer_token() {
        let parts = parts_with(&[("authorization", "Bearer tc_abc ")]);
        assert_eq!(extract_token(&parts).as_deref(), Some("tc_abc"));
    }

    #[test]
    fn test_extract_x_access_token() {
        let parts = parts_with(&[("x-access-token", "tc_xyz")]);
        assert_eq!(extract_token(&parts).as_deref(), Some("tc_xyz"));
    }

    #[test]
    fn test_non_bearer_authorization_falls_back_to_header() {
        let parts = parts_with(&[("authorization", "Basic Zm9v"), ("x-access-token", "tc_1")]);
        assert_eq!(extract_token(&parts).as_deref(), Some("tc_1"));
    }

    #[test]
    fn test_missing_or_empty_token() {
        assert!(extract_token(&parts_with(&[])).is_none());
        assert!(extract_token(&parts_with(&[("authorization", "Bearer   ")])).is_none());
        assert!(extract_token(&parts_with(&[("x-access-token", "")])).is_none());
    }

    #[test]
    fn test_hash_token_known_value() {
        assert_eq!(
            hash_token(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(hash_token("tc_a"), hash_token("tc_a"));
        assert_ne!(hash_token("tc_a"), hash_token("tc_b"));
    }

    #[tokio::test]
    async fn test_issued_token_authenticates() {
        let (state, _dir) = test_state().await;
        let token = issue_token(&state, UserId(2)).await.unwrap();
        assert!(token.starts_with(TOKEN_PREFIX));

        let bearer = format!("Bearer {token}");
        let mut parts = parts_with(&[("authorization", bearer.as_str())]);
        let Authenticated(identity) = Authenticated::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(identity.id, UserId(2));
        assert!(!identity.banned);
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthenticated() {
        let (state, _dir) = test_state().await;
        let mut parts = parts_with(&[("x-access-token", "tc_nope")]);
        let err = Authenticated::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Chat(ChatError::Unauthenticated)));

        let mut parts = parts_with(&[]);
        let err = Authenticated::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Chat(ChatError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_banned_user_is_forbidden() {
        let (state, _dir) = test_state().await;
        let token = issue_token(&state, UserId(3)).await.unwrap();
        state.users.set_banned(UserId(3), true).await.unwrap();

        let mut parts = parts_with(&[("x-access-token", token.as_str())]);
        let err = Authenticated::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Chat(ChatError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_issue_token_for_unknown_user_fails() {
        let (state, _dir) = test_state().await;
        assert!(issue_token(&state, UserId(404)).await.is_err());
    }
}
