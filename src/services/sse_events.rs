use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        room::{RoomEvent, RoomSnapshot},
        sse::ServerEvent,
    },
    state::SharedState,
};

const EVENT_ROOM_UPDATED: &str = "room.updated";

/// Broadcast a fresh room snapshot to SSE observers.
pub fn broadcast_room_updated(state: &SharedState, room: RoomSnapshot) {
    send_room_event(state, EVENT_ROOM_UPDATED, &RoomEvent { room });
}

fn send_room_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.room_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize room SSE payload"),
    }
}
