//! WebSocket endpoint for live games.
//!
//! Each upgraded socket is split in two:
//!
//! - a writer task drains the connection's outbound queue, serializing every
//!   [`ServerEvent`] to a text frame
//! - the inbound half is rate limited and handed to a [`ConnectionHandler`]
//!   as a stream of text frames
//!
//! The handler owns the only strong sender of the outbound queue (sessions
//! hold weak ones), so once it returns the writer flushes what is left,
//! closes the socket and exits.
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8001/');
//! ws.onopen = () => ws.send(JSON.stringify({ type: "init" }));
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   if (data.type === "init") shareLink(data.join);
//! };
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use connect_four::{
    net::{ConnectionHandler, HandlerError, ProtocolError, ServerEvent},
    session::ConnectionId,
};
use futures_util::{SinkExt, StreamExt, stream::SplitStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::{AppState, rate_limiter::ConnectionLimits};
use crate::logging::log_protocol_event;

/// Upgrade an HTTP request to a game connection.
///
/// The first text frame decides whether the connection starts a new game or
/// joins one; see [`ConnectionHandler`] for the conversation.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Run one connection until the client leaves or is disconnected.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let id = ConnectionId::new();
    let (mut sender, receiver) = socket.split();
    let (outbox, mut outbound) =
        mpsc::channel::<ServerEvent>(state.registry.config().outbound_buffer);

    info!(connection = %id, "WebSocket connected");

    let send_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let json = match event.to_json() {
                Ok(json) => json,
                Err(e) => {
                    error!(connection = %id, "Failed to serialize event: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                debug!(connection = %id, "WebSocket writer closed");
                return;
            }
        }
        let _ = sender.close().await;
    });

    let inbound = Inbound {
        id,
        receiver,
        limits: ConnectionLimits::new(&state.config.rate_limit),
        outbox: outbox.clone(),
    };
    let frames = Box::pin(futures_util::stream::unfold(inbound, |mut inbound| async move {
        let text = inbound.next_text().await?;
        Some((text, inbound))
    }));

    let handler = ConnectionHandler::new(id, state.registry.clone(), frames, outbox);

    match handler.run().await {
        Ok(()) => info!(connection = %id, "WebSocket disconnected"),
        Err(HandlerError::Protocol(ProtocolError::Closed)) => {
            info!(connection = %id, "WebSocket closed before the game began");
        }
        Err(HandlerError::Protocol(e)) => {
            log_protocol_event(&id.to_string(), "malformed", &e.to_string());
        }
        Err(HandlerError::Session(e)) => {
            info!(connection = %id, "WebSocket rejected: {}", e);
        }
    }

    if let Err(e) = send_task.await {
        warn!(connection = %id, "WebSocket writer task failed: {}", e);
    }
}

/// Inbound half of a socket, filtered down to admitted text frames.
struct Inbound {
    id: ConnectionId,
    receiver: SplitStream<WebSocket>,
    limits: ConnectionLimits,
    outbox: mpsc::Sender<ServerEvent>,
}

impl Inbound {
    /// Next admitted frame, or `None` once the client is gone.
    ///
    /// Frames over the rate limit are answered with an `error` event and
    /// dropped.
    async fn next_text(&mut self) -> Option<String> {
        loop {
            let text = match self.receiver.next().await? {
                Ok(Message::Text(text)) => text.to_string(),
                // Binary frames go through the same decoder and fail there
                // unless they carry a valid event.
                Ok(Message::Binary(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
                Ok(Message::Close(_)) => return None,
                Ok(Message::Ping(_) | Message::Pong(_)) => continue,
                Err(e) => {
                    debug!(connection = %self.id, "WebSocket read error: {}", e);
                    return None;
                }
            };

            if let Err(limited) = self.limits.admit() {
                log_protocol_event(
                    &self.id.to_string(),
                    "rate_limit",
                    &format!("{limited} limit exceeded, dropping message"),
                );
                let notice = ServerEvent::error(limited.client_message());
                if self.outbox.send(notice).await.is_err() {
                    return None;
                }
                continue;
            }

            return Some(text);
        }
    }
}
