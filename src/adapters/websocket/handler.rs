//! WebSocket upgrade handler for live client connections.
//!
//! Handles the HTTP → WebSocket upgrade and hands the socket to a session:
//! 1. Read the client identity supplied by the upstream auth layer
//! 2. Upgrade to WebSocket
//! 3. Register the connection with the hub
//! 4. Run the read/write pumps until disconnect

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use http::StatusCode;
use futures::{future, SinkExt, StreamExt};
use serde::Deserialize;

use crate::domain::foundation::{TenantId, UserId};
use crate::ports::{Frame, TransportError};

use super::hub::{ClientConnection, ConnectionHub};
use super::session::{ClientSession, SessionSettings};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub hub: Arc<ConnectionHub>,
    pub settings: SessionSettings,
}

impl WebSocketState {
    /// Create a new WebSocket state.
    pub fn new(hub: Arc<ConnectionHub>, settings: SessionSettings) -> Self {
        Self { hub, settings }
    }
}

/// Identity of the connecting client, set by the authentication layer.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws?user_id=..&tenant_id=..`
///
/// Responds `401` without a user id and `426` for plain HTTP requests.
pub async fn ws_handler(
    Query(params): Query<ConnectParams>,
    State(state): State<WebSocketState>,
    ws: Option<WebSocketUpgrade>,
) -> Response {
    let user_id = match params.user_id.map(UserId::new) {
        Some(Ok(user_id)) => user_id,
        _ => return (StatusCode::UNAUTHORIZED, "missing user id").into_response(),
    };
    let tenant_id = params.tenant_id.and_then(|t| TenantId::new(t).ok());

    let Some(ws) = ws else {
        return (StatusCode::UPGRADE_REQUIRED, "websocket upgrade required").into_response();
    };

    ws.max_message_size(state.settings.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, user_id, tenant_id, state))
}

/// Register the connection and run its session to completion.
async fn handle_socket(
    socket: WebSocket,
    user_id: UserId,
    tenant_id: Option<TenantId>,
    state: WebSocketState,
) {
    let (conn, outbound) =
        ClientConnection::new(user_id, tenant_id, state.settings.send_queue_capacity);
    let connection_id = state.hub.register(conn);

    let (sender, receiver) = socket.split();
    let sink = sender
        .sink_map_err(|e| TransportError::Io(e.to_string()))
        .with(|frame: Frame| future::ready(Ok::<_, TransportError>(into_message(frame))));
    let stream = receiver.map(|result| {
        result
            .map(from_message)
            .map_err(|e| TransportError::Io(e.to_string()))
    });

    ClientSession::new(state.hub, connection_id, state.settings)
        .run(sink, stream, outbound)
        .await;
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text),
        Frame::Binary(data) => Message::Binary(data),
        Frame::Ping(data) => Message::Ping(data),
        Frame::Pong(data) => Message::Pong(data),
        Frame::Close => Message::Close(None),
    }
}

fn from_message(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text),
        Message::Binary(data) => Frame::Binary(data),
        Message::Ping(data) => Frame::Ping(data),
        Message::Pong(data) => Frame::Pong(data),
        Message::Close(_) => Frame::Close,
    }
}

/// Create axum router for the WebSocket endpoint.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .merge(websocket_router().with_state(ws_state));
/// ```
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
