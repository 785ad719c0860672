use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::{SharedState, SseHub},
};

const ROOM_STREAM: &str = "room";

/// Subscribe to the room SSE stream.
pub fn subscribe_room(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.room_sse().subscribe()
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        // Skip lagged messages but keep the stream alive.
                        Err(RecvError::Lagged(_)) => continue,
                    }
                }
            }
        }

        info!("Room SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Announce a new subscriber on the room stream.
pub fn broadcast_handshake(hub: &SseHub, room_code: &str) {
    if let Ok(event) = ServerEvent::json(
        Some("handshake".to_string()),
        &Handshake {
            stream: ROOM_STREAM.to_string(),
            message: "room stream connected".to_string(),
            room_code: room_code.to_string(),
        },
    ) {
        hub.broadcast(event);
    }
}
