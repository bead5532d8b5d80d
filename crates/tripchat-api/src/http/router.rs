//! Axum router configuration with middleware.
//!
//! All chat routes are under `/api/v1/`. Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Rooms
        .route(
            "/rooms",
            get(handlers::room::list_rooms).post(handlers::room::create_room),
        )
        .route(
            "/rooms/get-or-create",
            post(handlers::room::get_or_create_room),
        )
        .route("/rooms/{room_id}", get(handlers::room::get_room))
        // Membership
        .route(
            "/rooms/{room_id}/members",
            post(handlers::room::add_member),
        )
        .route(
            "/rooms/{room_id}/members/{user_id}",
            delete(handlers::room::remove_member),
        )
        // Messages
        .route(
            "/rooms/{room_id}/messages",
            get(handlers::message::list_messages),
        )
        .route("/messages", post(handlers::message::send_message));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
