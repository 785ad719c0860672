use crate::{
    dto::room::{PlayerSummary, RoomSnapshot},
    error::ServiceError,
    state::{PlayerIndex, SharedState},
};

/// Current room snapshot.
pub async fn get_room(state: &SharedState) -> RoomSnapshot {
    state.relay().lock().await.snapshot()
}

/// Look up one joined player.
pub async fn get_player(
    state: &SharedState,
    player_index: PlayerIndex,
) -> Result<PlayerSummary, ServiceError> {
    let relay = state.relay().lock().await;
    relay
        .room()
        .player(player_index)
        .map(PlayerSummary::from)
        .ok_or_else(|| ServiceError::NotFound(format!("player {player_index} is not in the room")))
}
