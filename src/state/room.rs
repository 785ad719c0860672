//! Membership and lifecycle of the single room.

use std::collections::HashSet;

use indexmap::IndexMap;
use rand::Rng;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::state::{ConnectionId, PlayerIndex};

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ROOM_CODE_LEN: usize = 4;

/// Random 4-character code without ambiguous characters (no I, O, 0 or 1).
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| char::from(ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())]))
        .collect()
}

/// Room lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomStatus {
    /// Lobby or game selection.
    #[default]
    Waiting,
    /// A game has been started.
    Playing,
    /// The last game reported a winner.
    Finished,
}

/// Errors raised by membership changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// Every seat is taken.
    #[error("Room is full ({0} players)")]
    Full(usize),
}

/// A joined controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Stable index, never reused while the room lives.
    pub index: PlayerIndex,
    /// Display name.
    pub nickname: String,
    /// Connection the player joined from.
    pub connection: ConnectionId,
    /// Session identifier used by the ready barrier.
    pub session_id: Uuid,
}

#[derive(Debug, Default)]
struct ReadyBarrier {
    host_ready: bool,
    sessions: HashSet<Uuid>,
}

impl ReadyBarrier {
    fn clear(&mut self) {
        self.host_ready = false;
        self.sessions.clear();
    }
}

/// The room: one optional host and an ordered list of players.
#[derive(Debug)]
pub struct Room {
    code: String,
    host: Option<ConnectionId>,
    players: IndexMap<PlayerIndex, Player>,
    next_index: PlayerIndex,
    game_id: Option<String>,
    status: RoomStatus,
    ready: ReadyBarrier,
    capacity: usize,
}

impl Room {
    /// Create an empty room.
    pub fn new(code: String, capacity: usize) -> Self {
        Self {
            code,
            host: None,
            players: IndexMap::new(),
            next_index: 0,
            game_id: None,
            status: RoomStatus::Waiting,
            ready: ReadyBarrier::default(),
            capacity: capacity.max(1),
        }
    }

    /// Room code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Maximum number of players.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Host connection, if attached.
    pub fn host(&self) -> Option<ConnectionId> {
        self.host
    }

    /// Selected game.
    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    /// Lifecycle status.
    pub fn status(&self) -> RoomStatus {
        self.status
    }

    /// Joined players in join order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Indexes of joined players in join order.
    pub fn player_indexes(&self) -> Vec<PlayerIndex> {
        self.players.keys().copied().collect()
    }

    /// Look up a player by index.
    pub fn player(&self, index: PlayerIndex) -> Option<&Player> {
        self.players.get(&index)
    }

    /// Look up the player joined from `connection`.
    pub fn player_by_connection(&self, connection: ConnectionId) -> Option<&Player> {
        self.players
            .values()
            .find(|player| player.connection == connection)
    }

    /// Make `connection` the host and reset the room in place. Returns the removed players.
    pub fn attach_host(&mut self, connection: ConnectionId) -> Vec<Player> {
        let removed = self.reset();
        self.host = Some(connection);
        info!(room = %self.code, %connection, "host attached");
        removed
    }

    /// Detach the host if `connection` is the host.
    pub fn detach_host(&mut self, connection: ConnectionId) -> bool {
        if self.host != Some(connection) {
            return false;
        }
        self.host = None;
        self.ready.host_ready = false;
        info!(room = %self.code, "host detached");
        true
    }

    /// Seat a new player. A missing nickname becomes `Player N` (1-based).
    pub fn add_player(
        &mut self,
        connection: ConnectionId,
        nickname: Option<String>,
    ) -> Result<Player, RoomError> {
        if self.players.len() >= self.capacity {
            return Err(RoomError::Full(self.capacity));
        }

        let index = self.next_index;
        self.next_index += 1;

        let player = Player {
            index,
            nickname: nickname.unwrap_or_else(|| format!("Player {}", index + 1)),
            connection,
            session_id: Uuid::new_v4(),
        };
        self.players.insert(index, player.clone());
        info!(room = %self.code, player_index = index, nickname = %player.nickname, "player joined");
        Ok(player)
    }

    /// Remove the player joined from `connection`, keeping the order of the others.
    pub fn remove_player_by_connection(&mut self, connection: ConnectionId) -> Option<Player> {
        let index = self.player_by_connection(connection)?.index;
        let player = self.players.shift_remove(&index)?;
        self.ready.sessions.remove(&player.session_id);
        info!(room = %self.code, player_index = index, "player left");
        Some(player)
    }

    /// Select `game_id` and start it.
    pub fn select_game(&mut self, game_id: Option<String>) {
        self.game_id = game_id;
        self.status = RoomStatus::Playing;
        self.ready.clear();
    }

    /// Start the selected game.
    pub fn start_game(&mut self) {
        self.status = RoomStatus::Playing;
    }

    /// Mark the current game as finished.
    pub fn finish_game(&mut self) {
        self.status = RoomStatus::Finished;
    }

    /// Go back to game selection.
    pub fn return_to_selection(&mut self) {
        self.status = RoomStatus::Waiting;
        self.game_id = None;
        self.ready.clear();
    }

    /// Drop every player and the selected game. The host and the code are kept.
    pub fn reset(&mut self) -> Vec<Player> {
        let removed = std::mem::take(&mut self.players).into_values().collect();
        self.next_index = 0;
        self.game_id = None;
        self.status = RoomStatus::Waiting;
        self.ready.clear();
        removed
    }

    /// Record the host's ready signal. Ignored unless a game is playing.
    pub fn mark_host_ready(&mut self) -> bool {
        if self.status != RoomStatus::Playing {
            return false;
        }
        self.ready.host_ready = true;
        true
    }

    /// Record a player's ready signal. Ignored unless a game is playing.
    pub fn mark_player_ready(&mut self, session_id: Uuid) -> bool {
        if self.status != RoomStatus::Playing {
            return false;
        }
        self.ready.sessions.insert(session_id);
        true
    }

    /// If the host and every current player are ready, clear the barrier and return true.
    pub fn take_all_ready(&mut self) -> bool {
        let complete = self.ready.host_ready
            && !self.players.is_empty()
            && self
                .players
                .values()
                .all(|player| self.ready.sessions.contains(&player.session_id));
        if complete {
            self.ready.clear();
        }
        complete
    }
}
