//! # Live Session Routes
//!
//! WebSocket upgrade endpoint binding a user identity to a live push
//! session. The dispatch engine's accept notifications reach exactly
//! this user's socket as JSON [`PushEvent`](crate::notify::PushEvent)
//! frames.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use fieldops_core::UserId;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/sessions/:user_id/ws", get(session_ws))
}

/// GET /v1/sessions/:user_id/ws — Upgrade to a live push session.
async fn session_ws(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let user: UserId = user_id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid user id: '{user_id}'")))?;
    Ok(ws.on_upgrade(move |socket| session_loop(socket, state, user)))
}

/// Drain engine notifications into the socket until either side goes
/// away. A reconnect replaces the registration, so the cleanup at the
/// bottom only removes this connection's own channel.
async fn session_loop(mut socket: WebSocket, state: AppState, user: UserId) {
    let (handle, mut events) = state.sessions.register(user);
    tracing::info!(%user, "live session connected");

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let Ok(text) = serde_json::to_string(&event) else { continue };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Client chatter (pings are answered by axum).
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.sessions.unregister(&handle);
    tracing::info!(%user, "live session disconnected");
}
