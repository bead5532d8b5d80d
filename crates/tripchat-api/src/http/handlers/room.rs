//! Room handlers for the REST API.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use tripchat_types::room::RoomDetail;
use tripchat_types::user::UserId;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::{RoomListQuery, parse_room_id};
use crate::http::handlers::ensure_room_access;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRoomBody {
    pub name: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct PeerBody {
    pub user_id: UserId,
}

/// POST /api/v1/rooms - Create a group room. The caller is always a member.
pub async fn create_room(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Json(body): Json<CreateRoomBody>,
) -> Result<(StatusCode, Json<ApiResponse<RoomDetail>>), AppError> {
    let clock = RequestClock::start();

    if body.member_ids.is_empty() {
        return Err(AppError::Validation(
            "member_ids must name at least one user".to_string(),
        ));
    }
    let mut members = body.member_ids;
    members.push(identity.id);

    let detail = state.rooms.create_room(body.name, &members).await?;
    let self_link = format!("/api/v1/rooms/{}", detail.room.id);
    let messages_link = format!("/api/v1/rooms/{}/messages", detail.room.id);

    let resp = clock
        .finish(detail)
        .with_link("self", &self_link)
        .with_link("messages", &messages_link);
    Ok((StatusCode::CREATED, Json(resp)))
}

/// POST /api/v1/rooms/get-or-create - Direct room between the caller and a peer.
pub async fn get_or_create_room(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Json(body): Json<PeerBody>,
) -> Result<Json<ApiResponse<RoomDetail>>, AppError> {
    let clock = RequestClock::start();

    let detail = state
        .resolver
        .get_or_create_room(identity.id, body.user_id)
        .await?;
    let self_link = format!("/api/v1/rooms/{}", detail.room.id);

    Ok(Json(clock.finish(detail).with_link("self", &self_link)))
}

/// GET /api/v1/rooms - Rooms the caller belongs to.
pub async fn list_rooms(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Query(query): Query<RoomListQuery>,
) -> Result<Json<ApiResponse<Vec<RoomDetail>>>, AppError> {
    let clock = RequestClock::start();

    let page = query.into_page()?;
    let rooms = state.rooms.get_rooms_for_user(identity.id, page).await?;

    let next = rooms
        .last()
        .map(|last| format!("/api/v1/rooms?after={}", last.room.id));

    let mut resp = clock.finish(rooms).with_link("self", "/api/v1/rooms");
    if let Some(next) = next {
        resp = resp.with_link("next", &next);
    }
    Ok(Json(resp))
}

/// GET /api/v1/rooms/{room_id} - Room with its members.
pub async fn get_room(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(room_id): Path<String>,
) -> Result<Json<ApiResponse<RoomDetail>>, AppError> {
    let clock = RequestClock::start();
    let room_id = parse_room_id(&room_id)?;

    ensure_room_access(&state, &identity, &room_id).await?;
    let detail = state.rooms.get_room_detail(&room_id).await?;
    let messages_link = format!("/api/v1/rooms/{room_id}/messages");

    Ok(Json(clock.finish(detail).with_link("messages", &messages_link)))
}

/// POST /api/v1/rooms/{room_id}/members - Add a member to a group room.
pub async fn add_member(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(room_id): Path<String>,
    Json(body): Json<PeerBody>,
) -> Result<Json<ApiResponse<RoomDetail>>, AppError> {
    let clock = RequestClock::start();
    let room_id = parse_room_id(&room_id)?;

    ensure_room_access(&state, &identity, &room_id).await?;
    let detail = state.rooms.add_member(&room_id, body.user_id).await?;

    Ok(Json(clock.finish(detail)))
}

/// DELETE /api/v1/rooms/{room_id}/members/{user_id} - Remove a member from a group room.
pub async fn remove_member(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path((room_id, user_id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let clock = RequestClock::start();
    let room_id = parse_room_id(&room_id)?;

    ensure_room_access(&state, &identity, &room_id).await?;
    state.rooms.remove_member(&room_id, UserId(user_id)).await?;

    Ok(Json(clock.finish(serde_json::json!({
        "room_id": room_id,
        "user_id": user_id,
        "removed": true,
    }))))
}
