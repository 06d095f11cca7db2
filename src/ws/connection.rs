//! Subscription bridge: one websocket per client per room.
//!
//! On upgrade the socket subscribes to the room document and a forward task
//! pushes every snapshot to the client; the read loop turns client messages
//! into engine actions and writes the resulting patches back to the store.
//! Engine rejections become error frames; there is no retry queue.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::game::engine::{self, Action, Effect, MateMode};
use crate::game::state::RoomState;
use crate::http::routes::AppState;
use crate::session::{self, Identity, Role};
use crate::store::DocStore;

/// Delay before a penalty banner clears itself.
const ANNOUNCEMENT_CLEAR: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientToServer {
    Ping,
    Draw,
    EndTurn,
    SetRule { text: String },
    ChooseMate { target: String },
    ConfirmMatePair { first: String, second: String },
    MarkViolation { target: String, reason: String },
    Pause { reason: String },
    Resume,
    RemovePlayer { target: String },
    Leave,
    CloseRoom,
    ResetRound,
}

impl ClientToServer {
    /// `None` for messages that are not engine actions (ping).
    fn into_action(self) -> Option<Action> {
        Some(match self {
            ClientToServer::Ping => return None,
            ClientToServer::Draw => Action::Draw,
            ClientToServer::EndTurn => Action::EndTurn,
            ClientToServer::SetRule { text } => Action::SetRule { text },
            ClientToServer::ChooseMate { target } => Action::ChooseMate { target },
            ClientToServer::ConfirmMatePair { first, second } => {
                Action::ConfirmMatePair { first, second }
            }
            ClientToServer::MarkViolation { target, reason } => {
                Action::MarkViolation { target, reason }
            }
            ClientToServer::Pause { reason } => Action::Pause { reason },
            ClientToServer::Resume => Action::Resume,
            ClientToServer::RemovePlayer { target } => Action::RemovePlayer { target },
            ClientToServer::Leave => Action::Leave,
            ClientToServer::CloseRoom => Action::CloseRoom,
            ClientToServer::ResetRound => Action::ResetRound,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerToClient {
    Welcome {
        you: String,
        role: Role,
        room: RoomState,
    },
    RoomUpdate {
        room: RoomState,
    },
    MateSelect {
        mode: MateMode,
    },
    Error {
        message: String,
    },
    Pong,
}

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: String,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(WsQuery { token }): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (token_room, who) = session::verify_token(&token)
        .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid token".to_string()))?;
    if token_room != code {
        return Err((StatusCode::UNAUTHORIZED, "token-room mismatch".into()));
    }
    if !state.store.contains(&code) {
        return Err((StatusCode::NOT_FOUND, "room not found".into()));
    }
    Ok(ws.on_upgrade(move |socket| handle_socket(state.store, code, who, socket)))
}

async fn handle_socket(store: Arc<DocStore>, code: String, who: Identity, socket: WebSocket) {
    let conn_id = Uuid::new_v4();
    let Ok((snapshot, mut updates)) = store.subscribe(&code) else {
        return;
    };

    let (ws_tx, mut ws_rx) = socket.split();
    // channel for server -> client messages
    let (sv_tx, mut sv_rx) = mpsc::unbounded_channel::<ServerToClient>();

    tokio::spawn(async move {
        let mut ws_tx = ws_tx;
        while let Some(msg) = sv_rx.recv().await {
            let text = serde_json::to_string(&msg).unwrap();
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // pump remote snapshots into the local mirror stream
    let pump_tx = sv_tx.clone();
    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(room) => {
                    if pump_tx.send(ServerToClient::RoomUpdate { room }).is_err() {
                        break;
                    }
                }
                // missed snapshots are superseded by the next one
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let _ = sv_tx.send(ServerToClient::Welcome {
        you: who.name.clone(),
        role: who.role,
        room: snapshot,
    });

    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientToServer>(&text) {
                Ok(ClientToServer::Ping) => {
                    let _ = sv_tx.send(ServerToClient::Pong);
                }
                Ok(msg) => {
                    if let Some(action) = msg.into_action() {
                        dispatch(&store, &code, &who, action, &sv_tx);
                    }
                }
                Err(err) => {
                    let _ = sv_tx.send(ServerToClient::Error {
                        message: format!("bad message: {}", err),
                    });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    debug!(%code, %conn_id, name = %who.name, "ws closed");
}

/// Run one action against the current snapshot and write the patch back.
fn dispatch(
    store: &Arc<DocStore>,
    code: &str,
    who: &Identity,
    action: Action,
    out: &mpsc::UnboundedSender<ServerToClient>,
) {
    let Some(room) = store.get(code) else {
        let _ = out.send(ServerToClient::Error {
            message: "room is gone".into(),
        });
        return;
    };
    match engine::apply(&room, who, action, &mut rand::thread_rng()) {
        Ok(outcome) => {
            if !outcome.patch.is_empty() {
                if let Err(err) = store.update(code, &outcome.patch) {
                    warn!(%code, %err, "store update failed");
                    let _ = out.send(ServerToClient::Error {
                        message: err.to_string(),
                    });
                    return;
                }
            }
            match outcome.effect {
                Some(Effect::MateSelection { mode }) => {
                    let _ = out.send(ServerToClient::MateSelect { mode });
                }
                Some(Effect::AnnouncementPosted { text }) => {
                    schedule_announcement_clear(Arc::clone(store), code.to_string(), text);
                }
                None => {}
            }
        }
        Err(err) => {
            let _ = out.send(ServerToClient::Error {
                message: err.to_string(),
            });
        }
    }
}

/// Fire-and-forget follow-up write clearing the banner, unless a newer one
/// replaced it in the meantime.
fn schedule_announcement_clear(store: Arc<DocStore>, code: String, text: String) {
    tokio::spawn(async move {
        sleep(ANNOUNCEMENT_CLEAR).await;
        let Some(room) = store.get(&code) else { return };
        if let Some(patch) = engine::clear_announcement(&room, &text) {
            if let Err(err) = store.update(&code, &patch) {
                debug!(%code, %err, "announcement clear skipped");
            }
        }
    });
}
