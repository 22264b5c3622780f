use std::sync::Arc;
use tokio::sync::mpsc;
use warp::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};

use crate::raffle::{ClientEvent, ConnectionId, RaffleServer, ServerEvent};

pub async fn handle_raffle_websocket(
    websocket: WebSocket,
    raffle_server: Arc<RaffleServer>,
) {
    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let connection_id = raffle_server.connect(tx).await;

    // Spawn task to send events to client
    let writer_id = connection_id.clone();
    let sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match event.to_json() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(connection_id = %writer_id, error = %e, "Failed to encode event");
                    continue;
                }
            };
            if let Err(e) = ws_sender.send(Message::text(text)).await {
                tracing::error!(connection_id = %writer_id, error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(message) => {
                if message.is_close() {
                    break;
                }
                handle_websocket_message(&raffle_server, &connection_id, message).await;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    raffle_server.disconnect(&connection_id).await;
    sender_task.abort();
}

async fn handle_websocket_message(
    raffle_server: &RaffleServer,
    connection_id: &ConnectionId,
    message: Message,
) {
    let Ok(text) = message.to_str() else {
        return;
    };
    tracing::debug!(connection_id = %connection_id, "Received raffle message: {}", text);

    match ClientEvent::parse(text) {
        Ok(event) => raffle_server.handle_event(connection_id, event).await,
        Err(e) => {
            tracing::warn!(
                connection_id = %connection_id,
                error = %e,
                raw_message = %text,
                "Failed to parse raffle message"
            );
        }
    }
}
