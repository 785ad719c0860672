use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        room::{PlayerSummary, RoomSnapshot},
        validation::validate_nickname,
    },
    state::PlayerIndex,
};

/// Prefix reserved for room lifecycle events.
pub const SYSTEM_PREFIX: &str = "room:";

#[derive(Debug, Deserialize, ToSchema)]
/// Text frame accepted from host and controller WebSocket clients.
pub struct ClientFrame {
    /// Event name.
    pub event: String,
    /// Arbitrary JSON payload.
    #[serde(default)]
    pub data: Value,
    /// Request id echoed back in the acknowledgement.
    #[serde(default)]
    pub ack: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Text frame pushed to WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// An event addressed to this connection.
    Event { event: String, data: Value },
    /// Reply to a request that carried an `ack` id.
    Ack { ack: u64, data: Value },
}

/// Reserved lifecycle events handled by the room itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    /// Host display attaches and resets the room.
    Create,
    /// Controller takes a seat.
    Join,
    /// Choose a game and start it.
    SelectGame,
    /// Start the selected game.
    StartGame,
    /// Ready-sync barrier signal.
    GameReady,
    /// Host declares a winner.
    GameOver,
    /// Back to the game selection screen.
    ReturnToSelection,
    /// Host kicks everyone and clears the room.
    ResetRoom,
}

impl SystemEvent {
    /// Resolve a reserved event name. `None` for unknown `room:*` names and ordinary events.
    pub fn parse(event: &str) -> Option<Self> {
        let name = event.strip_prefix(SYSTEM_PREFIX)?;
        let parsed = match name {
            "create" => Self::Create,
            "join" => Self::Join,
            "select-game" => Self::SelectGame,
            "start-game" => Self::StartGame,
            "game-ready" => Self::GameReady,
            "game-over" => Self::GameOver,
            "return-to-selection" => Self::ReturnToSelection,
            "reset-room" => Self::ResetRoom,
            _ => return None,
        };
        Some(parsed)
    }
}

/// True when `event` uses the reserved prefix.
pub fn is_reserved(event: &str) -> bool {
    event.starts_with(SYSTEM_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
/// Generic acknowledgement: `{success}` or `{success:false, error}`.
pub struct RelayAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayAck {
    /// Successful acknowledgement.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// Failed acknowledgement carrying `error`.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Reply to `room:create`.
pub struct CreateRoomAck {
    pub code: String,
    pub room: RoomSnapshot,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Reply to `room:join`.
pub struct JoinRoomAck {
    pub success: bool,
    pub player_index: PlayerIndex,
    pub session_id: Uuid,
    pub room_code: String,
    pub player: PlayerSummary,
    pub room: RoomSnapshot,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
/// Payload of `room:join`.
pub struct JoinRoomRequest {
    #[serde(default)]
    pub nickname: Option<String>,
}

impl JoinRoomRequest {
    /// Trimmed nickname. Missing or blank names yield `None` so the room picks a default.
    pub fn nickname(&self) -> Option<String> {
        self.nickname
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
    }
}

impl Validate for JoinRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(nickname) = self.nickname() {
            if let Err(e) = validate_nickname(&nickname) {
                errors.add("nickname", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Payload of `room:select-game`.
pub struct SelectGameRequest {
    #[serde(default)]
    pub game_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Payload of `room:game-over`.
pub struct GameOverRequest {
    pub winner: PlayerIndex,
}
