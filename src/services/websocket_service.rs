use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientFrame, ServerFrame},
    error::ServiceError,
    services::{sse_events, timer_service},
    state::{ClientConnection, ConnectionId, SharedState, relay::Dispatch, unix_millis},
};

/// Handle the full lifecycle of a host or controller WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let connection_id = Uuid::new_v4();
    state.connections().insert(
        connection_id,
        ClientConnection {
            id: connection_id,
            tx: outbound_tx.clone(),
        },
    );
    info!(connection = %connection_id, "client connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(connection = %connection_id, payload = %text, "received client frame");
                let frame = match serde_json::from_str::<ClientFrame>(&text) {
                    Ok(frame) => frame,
                    Err(err) => {
                        warn!(connection = %connection_id, error = %err, "failed to parse client frame");
                        continue;
                    }
                };

                if let Err(err) = handle_frame(&state, connection_id, frame).await {
                    warn!(connection = %connection_id, error = %err, "error while handling client frame");
                    if matches!(err, ServiceError::ConnectionClosed) {
                        break;
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(connection = %connection_id, "client closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(connection = %connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.connections().remove(&connection_id);
    disconnect(&state, connection_id).await;
    info!(connection = %connection_id, "client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Run one inbound frame through the room and flush every side effect it produced.
///
/// The relay lock is held until delivery is queued so clients observe events in emission order.
async fn handle_frame(
    state: &SharedState,
    connection: ConnectionId,
    frame: ClientFrame,
) -> Result<(), ServiceError> {
    let mut relay = state.relay().lock().await;
    let reply = relay.handle(connection, &frame.event, frame.data, unix_millis());
    let dispatch = relay.drain();

    let acked = match (frame.ack, reply) {
        (Some(ack), Some(data)) => {
            send_to_connection(state, connection, &ServerFrame::Ack { ack, data })
        }
        _ => Ok(()),
    };
    deliver(state, dispatch);
    acked
}

/// Remove `connection` from the room and flush the resulting notifications.
pub async fn disconnect(state: &SharedState, connection: ConnectionId) {
    let mut relay = state.relay().lock().await;
    relay.disconnect(connection);
    let dispatch = relay.drain();
    deliver(state, dispatch);
}

/// Push drained frames to their sockets, apply timer commands and refresh the room SSE stream.
///
/// Callers must still hold the relay lock.
pub fn deliver(state: &SharedState, dispatch: Dispatch) {
    let Dispatch {
        deliveries,
        timers,
        room_update,
    } = dispatch;

    for delivery in deliveries {
        let frame = ServerFrame::Event {
            event: delivery.event,
            data: delivery.data,
        };
        if let Err(err) = send_to_connection(state, delivery.connection, &frame) {
            debug!(connection = %delivery.connection, error = %err, "dropping frame for closed connection");
        }
    }

    timer_service::apply(state, timers);

    if let Some(room) = room_update {
        sse_events::broadcast_room_updated(state, room);
    }
}

fn send_to_connection(
    state: &SharedState,
    connection: ConnectionId,
    frame: &ServerFrame,
) -> Result<(), ServiceError> {
    let Some(client) = state
        .connections()
        .get(&connection)
        .map(|entry| entry.tx.clone())
    else {
        return Err(ServiceError::ConnectionClosed);
    };
    send_message_to_websocket(&client, frame)
}

/// Serialize `value` and queue it on the socket writer.
fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), ServiceError>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| ServiceError::ConnectionClosed)
}

async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
