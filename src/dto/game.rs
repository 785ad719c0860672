//! Payloads of the built-in card game events.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::{
    PlayerIndex,
    dealer::{Card, Symbol},
    state_machine::PatternTotals,
};

/// Public view of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CardSnapshot {
    /// Identifier unique within the deck.
    pub id: u8,
    /// Printed symbol.
    pub symbol: Symbol,
    /// Number of symbols on the card (1 to 5).
    pub weight: u8,
}

impl From<&Card> for CardSnapshot {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            symbol: card.symbol,
            weight: card.weight,
        }
    }
}

/// Payload without fields, serialized as `{}`.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct EmptyPayload {}

/// Face-up pile of one player.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PileSnapshot {
    pub player_index: PlayerIndex,
    /// Bottom first; the last card is the visible one.
    pub cards: Vec<CardSnapshot>,
}

/// `card-dealt`: one card added to the receiver's hand.
#[derive(Debug, Serialize, ToSchema)]
pub struct CardDealtEvent {
    pub card: CardSnapshot,
}

/// `game-start`: the table is open, with the piles seeded by the deal.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameStartEvent {
    pub piles: Vec<PileSnapshot>,
}

/// `card-played`: a card moved from a hand to its pile.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardPlayedEvent {
    pub player_index: PlayerIndex,
    pub card: CardSnapshot,
}

/// `turn-change`: broadcast whenever the turn is (re)announced.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TurnChangeEvent {
    pub current_turn: Option<PlayerIndex>,
}

/// `your-turn`: sent to each participant.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YourTurnEvent {
    pub is_your_turn: bool,
}

/// `turn-countdown`: seconds left in the current turn. `remaining: null` hides the countdown.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TurnCountdownEvent {
    pub player_index: PlayerIndex,
    pub remaining: Option<u32>,
}

/// Events that only name a player (`turn-timeout`, `player-eliminated`).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEvent {
    pub player_index: PlayerIndex,
}

/// `bell-race`: who won the race and who else buzzed.
#[derive(Debug, Serialize, ToSchema)]
pub struct BellRaceEvent {
    pub winner: PlayerIndex,
    pub competitors: Vec<PlayerIndex>,
}

/// `bell-result`: outcome of a bell or a timeout penalty.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BellResultEvent {
    pub success: bool,
    pub player_index: PlayerIndex,
    #[schema(value_type = Object)]
    pub pattern_totals: PatternTotals,
}

/// `card-count-update`: size of the receiver's hand.
#[derive(Debug, Serialize, ToSchema)]
pub struct CardCountEvent {
    pub count: usize,
}

/// `cards-collected`: cards won by the receiver, in the order they were placed under the hand.
#[derive(Debug, Serialize, ToSchema)]
pub struct CardsCollectedEvent {
    pub cards: Vec<CardSnapshot>,
}

/// `game-over`: the last active player.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GameOverEvent {
    pub winner: PlayerIndex,
}

/// Body of a `bell-hit` controller event.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BellHitRequest {
    /// Client clock, in milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
}
