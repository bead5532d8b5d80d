//! Message handlers for the REST API.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use tripchat_types::message::Message;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::{MessageListQuery, parse_room_id};
use crate::http::handlers::ensure_room_access;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    pub room_id: String,
    pub body: String,
}

/// POST /api/v1/messages - Send a message as the caller.
///
/// Unknown rooms and rooms the caller does not belong to are both 404.
pub async fn send_message(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Json(body): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<ApiResponse<Message>>), AppError> {
    let clock = RequestClock::start();
    let room_id = parse_room_id(&body.room_id)?;

    let message = state
        .messages
        .send_message(&room_id, identity.id, &body.body)
        .await?;
    let room_link = format!("/api/v1/rooms/{room_id}/messages");

    Ok((
        StatusCode::CREATED,
        Json(clock.finish(message).with_link("room", &room_link)),
    ))
}

/// GET /api/v1/rooms/{room_id}/messages - A page of history, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(room_id): Path<String>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<Message>>>, AppError> {
    let clock = RequestClock::start();
    let room_id = parse_room_id(&room_id)?;
    let query = query.into_query()?;

    ensure_room_access(&state, &identity, &room_id).await?;
    let messages = state.messages.get_messages(&room_id, query).await?;

    let prev = messages
        .first()
        .map(|oldest| format!("/api/v1/rooms/{room_id}/messages?before={}", oldest.id));

    let mut resp = clock.finish(messages);
    if let Some(prev) = prev {
        resp = resp.with_link("prev", &prev);
    }
    Ok(Json(resp))
}
