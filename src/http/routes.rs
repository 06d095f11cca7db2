//! HTTP surface: health, lobby listing, room creation and join.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::GameError;
use crate::game::engine::{self, Action};
use crate::game::state::RoomState;
use crate::session::{self, Identity, Role};
use crate::store::{DocStore, RoomSummary};
use crate::util::id::new_room_code;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocStore>,
}

// Map errors to 500 for JSON endpoints
fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

pub async fn health() -> &'static str {
    "ok"
}

/// Lobby listing: every open room with its player count.
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    Json(state.store.list())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub code: String,
}

pub async fn create_room(State(state): State<AppState>) -> Json<CreateRoomResponse> {
    let code = new_room_code();
    state
        .store
        .create(&code, RoomState::fresh(&mut rand::thread_rng()));
    info!(%code, "room created");
    Json(CreateRoomResponse { code })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinRequest {
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JoinResponse {
    pub token: String,
    pub room: RoomState,
}

pub async fn join_room(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, (StatusCode, String)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name required".into()));
    }
    let Some(room) = state.store.get(&code) else {
        return Err((StatusCode::NOT_FOUND, "room not found".into()));
    };

    let who = Identity {
        name: name.to_string(),
        role: req.role,
    };
    let outcome = engine::apply(&room, &who, Action::Join, &mut rand::thread_rng()).map_err(
        |err| match err {
            GameError::RefereeTaken => (StatusCode::CONFLICT, err.to_string()),
            _ => (StatusCode::BAD_REQUEST, err.to_string()),
        },
    )?;

    let room = if outcome.patch.is_empty() {
        room
    } else {
        state
            .store
            .update(&code, &outcome.patch)
            .map_err(internal_error)?
    };

    let token = session::issue_token(&code, &who).map_err(internal_error)?;
    info!(%code, name = %who.name, role = ?who.role, "joined room");
    Ok(Json(JoinResponse { token, room }))
}
