use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::phase::{VisibleRoomStatus, VisibleTablePhase},
    state::{
        PlayerIndex,
        room::{Player, Room},
    },
};

/// Public view of a joined player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub player_index: PlayerIndex,
    pub name: String,
    /// Players are removed on disconnect, so listed players are always connected.
    pub connected: bool,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            player_index: player.index,
            name: player.nickname.clone(),
            connected: true,
        }
    }
}

/// Snapshot of the room sent with lifecycle events and served over REST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: String,
    /// Joined players in join order.
    pub players: Vec<PlayerSummary>,
    /// Maximum number of players.
    pub capacity: usize,
    pub game_id: Option<String>,
    pub status: VisibleRoomStatus,
    /// Whether a host display is attached.
    pub host_connected: bool,
    /// Phase of the built-in card table.
    pub table_phase: VisibleTablePhase,
}

impl RoomSnapshot {
    /// Build a snapshot of `room` with the table in `table_phase`.
    pub fn capture(room: &Room, table_phase: impl Into<VisibleTablePhase>) -> Self {
        Self {
            code: room.code().to_owned(),
            players: room.players().map(PlayerSummary::from).collect(),
            capacity: room.capacity(),
            game_id: room.game_id().map(str::to_owned),
            status: room.status().into(),
            host_connected: room.host().is_some(),
            table_phase: table_phase.into(),
        }
    }
}

/// `room:player-joined` and `room:player-left`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerPresenceEvent {
    pub player: PlayerSummary,
    pub room: RoomSnapshot,
}

/// `room:game-selected` and `room:game-started`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameLifecycleEvent {
    pub game_id: Option<String>,
    pub room: RoomSnapshot,
}

/// `room:selection-returned`, and the `room.updated` SSE event.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomEvent {
    pub room: RoomSnapshot,
}
