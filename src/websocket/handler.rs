use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::protocol::{ClientMessage, ServerMessage};
use crate::websocket::dispatcher::Connection;
use crate::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<Arc<ServerMessage>>();
    let mut conn = Connection::new(tx);

    info!("Connection {} opened", conn.id);

    // Spawn task for sending outgoing messages
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.to_json())).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match ClientMessage::parse(&text) {
                Some(msg) => state.dispatcher.handle(&mut conn, msg).await,
                None => debug!("Dropped malformed frame from {}: {}", conn.id, text),
            },
            Ok(Message::Close(_)) => {
                info!("Connection {} closed", conn.id);
                break;
            }
            Ok(_) => {
                // Ignore other message types (binary, ping, pong)
            }
            Err(e) => {
                warn!("WebSocket error on {}: {}", conn.id, e);
                break;
            }
        }
    }

    // Leave the session; the seat is held for the grace period
    state.dispatcher.disconnect(&mut conn).await;

    // Abort the send task
    send_task.abort();
}
