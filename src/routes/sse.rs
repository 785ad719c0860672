use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/room",
    tag = "sse",
    responses((status = 200, description = "Room SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream room membership and lifecycle updates.
pub async fn room_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_room(&state);
    info!("New room SSE connection");
    let room_code = state.relay().lock().await.room().code().to_owned();
    sse_service::broadcast_handshake(state.room_sse(), &room_code);
    sse_service::to_sse_stream(receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/room", get(room_stream))
}
