use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::room::{PlayerSummary, RoomSnapshot},
    error::AppError,
    services::room_service,
    state::{PlayerIndex, SharedState},
};

/// Read-only endpoints exposing the hosted room.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/room", get(get_room))
        .route("/room/players/{player_index}", get(get_player))
}

#[utoipa::path(
    get,
    path = "/room",
    tag = "room",
    responses((status = 200, description = "Current room", body = RoomSnapshot))
)]
/// Return the room code, players and lifecycle status.
pub async fn get_room(State(state): State<SharedState>) -> Json<RoomSnapshot> {
    Json(room_service::get_room(&state).await)
}

#[utoipa::path(
    get,
    path = "/room/players/{player_index}",
    tag = "room",
    params(("player_index" = u32, Path, description = "Index assigned at join")),
    responses(
        (status = 200, description = "Joined player", body = PlayerSummary),
        (status = 404, description = "No such player")
    )
)]
/// Return one joined player.
pub async fn get_player(
    State(state): State<SharedState>,
    Path(player_index): Path<PlayerIndex>,
) -> Result<Json<PlayerSummary>, AppError> {
    let player = room_service::get_player(&state, player_index).await?;
    Ok(Json(player))
}
