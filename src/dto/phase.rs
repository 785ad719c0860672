use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{phase::GamePhase, room::RoomStatus};

/// Publicly visible room status exposed to clients (WebSocket/REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleRoomStatus {
    /// Players are joining or a game is being chosen.
    Waiting,
    /// A game has been selected and started.
    Playing,
    /// The host declared a winner.
    Finished,
}

impl From<RoomStatus> for VisibleRoomStatus {
    fn from(value: RoomStatus) -> Self {
        match value {
            RoomStatus::Waiting => VisibleRoomStatus::Waiting,
            RoomStatus::Playing => VisibleRoomStatus::Playing,
            RoomStatus::Finished => VisibleRoomStatus::Finished,
        }
    }
}

/// Publicly visible phase of the built-in card table.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleTablePhase {
    /// No round in progress.
    Ready,
    /// Shuffling the deck.
    Shuffling,
    /// Dealing.
    Distributing,
    /// Turns and bell races are accepted.
    Playing,
    /// A winner was declared.
    Finished,
}

impl From<GamePhase> for VisibleTablePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Ready => VisibleTablePhase::Ready,
            GamePhase::Shuffling => VisibleTablePhase::Shuffling,
            GamePhase::Distributing => VisibleTablePhase::Distributing,
            GamePhase::Playing => VisibleTablePhase::Playing,
            GamePhase::Finished => VisibleTablePhase::Finished,
        }
    }
}
