//! Routing between the host display and the controllers, plus the room lifecycle events.
//!
//! The relay is synchronous: every call runs to completion under the room lock and leaves its
//! side effects in an [`Outbox`]. [`SessionRelay::drain`] resolves them into per-connection
//! deliveries once the call returns.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    config::AppConfig,
    dto::{
        game::{BellHitRequest, EmptyPayload, GameOverEvent},
        room::{GameLifecycleEvent, PlayerPresenceEvent, PlayerSummary, RoomEvent, RoomSnapshot},
        validation::validate_event_name,
        ws::{
            CreateRoomAck, GameOverRequest, JoinRoomAck, JoinRoomRequest, RelayAck,
            SelectGameRequest, SystemEvent, is_reserved,
        },
    },
    state::{
        ConnectionId, PlayerIndex,
        outbox::{Outbox, Recipient, TimerCommand, TimerKind, TimerToken},
        room::{Player, Room, RoomError, generate_room_code},
        table::{BELL_HIT, CARD_PLAY, GameTable, TableTiming},
    },
};

const TARGET_FIELD: &str = "targetPlayerIndex";
const PLAYER_FIELD: &str = "playerIndex";

const PLAYER_JOINED: &str = "room:player-joined";
const PLAYER_LEFT: &str = "room:player-left";
const GAME_SELECTED: &str = "room:game-selected";
const GAME_STARTED: &str = "room:game-started";
const ALL_READY: &str = "room:all-ready";
const GAME_OVER: &str = "room:game-over";
const SELECTION_RETURNED: &str = "room:selection-returned";
const KICKED: &str = "room:kicked";

/// What a connection is in the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The host display.
    Host,
    /// A seated controller.
    Player(PlayerIndex),
}

/// Reasons an inbound event was refused. Surfaced to the sender as a failure acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// A player event could not be forwarded.
    #[error("No host")]
    NoHost,
    /// Membership change refused.
    #[error(transparent)]
    Room(#[from] RoomError),
    /// Application events may not use the reserved prefix.
    #[error("Unknown system event '{0}'")]
    ReservedName(String),
    /// Event name outside the accepted character set or length.
    #[error("Invalid event name '{0}'")]
    InvalidEventName(String),
    /// Event restricted to the host.
    #[error("Only the host may send this event")]
    HostOnly,
    /// The connection has neither created nor joined the room.
    #[error("Create or join the room first")]
    Unidentified,
    /// The connection already has a role.
    #[error("Connection already joined the room")]
    AlreadyJoined,
    /// Payload did not match the event.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Room and table settings.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Maximum number of players.
    pub capacity: usize,
    /// Game id bound to the built-in card table.
    pub game_id: String,
    /// Fixed room code; random when absent.
    pub room_code: Option<String>,
    /// Card table timing.
    pub timing: TableTiming,
}

impl From<&AppConfig> for RelaySettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            capacity: config.max_players(),
            game_id: config.game_id().to_owned(),
            room_code: config.room_code().map(str::to_owned),
            timing: config.table_timing(),
        }
    }
}

/// One event to write to one socket.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Destination socket.
    pub connection: ConnectionId,
    /// Event name.
    pub event: String,
    /// Event payload.
    pub data: Value,
}

/// Side effects of one relay call, resolved to connections.
#[derive(Debug, Default)]
pub struct Dispatch {
    /// Frames to write, in emission order.
    pub deliveries: Vec<Delivery>,
    /// Timer tasks to spawn or abort.
    pub timers: Vec<TimerCommand>,
    /// Fresh snapshot when the room changed.
    pub room_update: Option<RoomSnapshot>,
}

/// The room controller: lifecycle, generic relay and the built-in card table.
#[derive(Debug)]
pub struct SessionRelay {
    room: Room,
    table: GameTable,
    game_id: String,
    out: Outbox,
    room_changed: bool,
}

impl SessionRelay {
    /// Create an empty room.
    pub fn new(settings: RelaySettings) -> Self {
        let code = settings.room_code.unwrap_or_else(generate_room_code);
        info!(room = %code, capacity = settings.capacity, "room opened");
        Self {
            room: Room::new(code, settings.capacity),
            table: GameTable::new(settings.timing),
            game_id: settings.game_id,
            out: Outbox::new(),
            room_changed: false,
        }
    }

    /// Read access to the room.
    pub fn room(&self) -> &Room {
        &self.room
    }

    /// Read access to the card table.
    pub fn table(&self) -> &GameTable {
        &self.table
    }

    /// Current room snapshot.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot::capture(&self.room, self.table.game().phase())
    }

    /// Role of `connection`, if any.
    pub fn role(&self, connection: ConnectionId) -> Option<Role> {
        if self.room.host() == Some(connection) {
            return Some(Role::Host);
        }
        self.room
            .player_by_connection(connection)
            .map(|player| Role::Player(player.index))
    }

    /// Handle one inbound event. Returns the acknowledgement payload, if the event has one.
    ///
    /// Handler failures never escape: they are logged and turned into a failure ack.
    pub fn handle(
        &mut self,
        connection: ConnectionId,
        event: &str,
        data: Value,
        now_ms: i64,
    ) -> Option<Value> {
        let result = if validate_event_name(event).is_err() {
            Err(RelayError::InvalidEventName(event.chars().take(64).collect()))
        } else if is_reserved(event) {
            match SystemEvent::parse(event) {
                Some(system) => self.handle_system(connection, system, data),
                None => Err(RelayError::ReservedName(event.to_owned())),
            }
        } else {
            self.relay(connection, event, data, now_ms)
        };

        match result {
            Ok(reply) => reply,
            Err(err) => {
                warn!(%connection, event, error = %err, "event rejected");
                reply(&RelayAck::failure(err.to_string()))
            }
        }
    }

    /// Forget `connection`. A leaving player is removed from the room immediately.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        if self.room.detach_host(connection) {
            self.room_changed = true;
            return;
        }

        if let Some(player) = self.room.remove_player_by_connection(connection) {
            // The seat stays in the running card game; its turns time out.
            self.emit_presence(PLAYER_LEFT, &player);
            self.room_changed = true;
            self.check_ready_barrier();
        }
    }

    /// Deliver a fired timer to the card table.
    pub fn fire_timer(&mut self, kind: TimerKind, token: TimerToken) {
        self.table.on_timer(kind, token, &mut self.out);
        self.sync_game_over();
    }

    /// Drain pending side effects, resolving recipients against the current membership.
    pub fn drain(&mut self) -> Dispatch {
        let deliveries = self
            .out
            .take_messages()
            .into_iter()
            .flat_map(|message| {
                self.resolve(message.to)
                    .into_iter()
                    .map(move |connection| Delivery {
                        connection,
                        event: message.event.clone(),
                        data: message.data.clone(),
                    })
            })
            .collect();

        Dispatch {
            deliveries,
            timers: self.out.take_timers(),
            room_update: std::mem::take(&mut self.room_changed).then(|| self.snapshot()),
        }
    }

    fn resolve(&self, to: Recipient) -> Vec<ConnectionId> {
        match to {
            Recipient::Host => self.room.host().into_iter().collect(),
            Recipient::Player(index) => self
                .room
                .player(index)
                .map(|player| player.connection)
                .into_iter()
                .collect(),
            Recipient::Players => self.room.players().map(|p| p.connection).collect(),
            Recipient::Everyone => self
                .room
                .host()
                .into_iter()
                .chain(self.room.players().map(|p| p.connection))
                .collect(),
            Recipient::Connection(connection) => vec![connection],
        }
    }

    fn handle_system(
        &mut self,
        connection: ConnectionId,
        event: SystemEvent,
        data: Value,
    ) -> Result<Option<Value>, RelayError> {
        match event {
            SystemEvent::Create => Ok(self.create(connection)),
            SystemEvent::Join => self.join(connection, data),
            SystemEvent::SelectGame => {
                self.require_role(connection)?;
                let request: SelectGameRequest = parse_payload(data)?;
                self.select_game(request.game_id.filter(|id| !id.is_empty()));
                Ok(reply(&RelayAck::ok()))
            }
            SystemEvent::StartGame => {
                self.require_role(connection)?;
                self.room.start_game();
                self.emit_lifecycle(GAME_STARTED);
                self.room_changed = true;
                Ok(reply(&RelayAck::ok()))
            }
            SystemEvent::GameReady => {
                let accepted = match self.require_role(connection)? {
                    Role::Host => self.room.mark_host_ready(),
                    Role::Player(index) => match self.room.player(index) {
                        Some(player) => {
                            let session = player.session_id;
                            self.room.mark_player_ready(session)
                        }
                        None => false,
                    },
                };
                if !accepted {
                    debug!(%connection, "ready signal outside a game ignored");
                }
                self.check_ready_barrier();
                Ok(reply(&RelayAck::ok()))
            }
            SystemEvent::GameOver => {
                self.require_host(connection)?;
                let request: GameOverRequest = serde_json::from_value(data)
                    .map_err(|err| RelayError::InvalidPayload(err.to_string()))?;
                self.table.clear(&mut self.out);
                self.declare_game_over(request.winner);
                Ok(reply(&RelayAck::ok()))
            }
            SystemEvent::ReturnToSelection => {
                self.require_role(connection)?;
                self.stop_table();
                self.room.return_to_selection();
                self.out.emit(
                    Recipient::Everyone,
                    SELECTION_RETURNED,
                    &RoomEvent {
                        room: self.snapshot(),
                    },
                );
                self.room_changed = true;
                Ok(reply(&RelayAck::ok()))
            }
            SystemEvent::ResetRoom => {
                self.require_host(connection)?;
                self.table.clear(&mut self.out);
                let removed = self.room.reset();
                self.kick(&removed);
                self.room_changed = true;
                info!(room = %self.room.code(), kicked = removed.len(), "room reset by host");
                Ok(reply(&RelayAck::ok()))
            }
        }
    }

    fn create(&mut self, connection: ConnectionId) -> Option<Value> {
        self.table.clear(&mut self.out);
        let removed = self.room.attach_host(connection);
        self.kick(&removed);
        self.room_changed = true;

        reply(&CreateRoomAck {
            code: self.room.code().to_owned(),
            room: self.snapshot(),
        })
    }

    fn join(
        &mut self,
        connection: ConnectionId,
        data: Value,
    ) -> Result<Option<Value>, RelayError> {
        if self.role(connection).is_some() {
            return Err(RelayError::AlreadyJoined);
        }

        let request: JoinRoomRequest = parse_payload(data)?;
        request
            .validate()
            .map_err(|err| RelayError::InvalidPayload(err.to_string()))?;

        let player = self.room.add_player(connection, request.nickname())?;
        self.emit_presence(PLAYER_JOINED, &player);
        self.room_changed = true;

        Ok(reply(&JoinRoomAck {
            success: true,
            player_index: player.index,
            session_id: player.session_id,
            room_code: self.room.code().to_owned(),
            player: PlayerSummary::from(&player),
            room: self.snapshot(),
        }))
    }

    fn select_game(&mut self, game_id: Option<String>) {
        self.stop_table();
        info!(game_id = ?game_id, "game selected");
        self.room.select_game(game_id);
        self.emit_lifecycle(GAME_SELECTED);
        self.emit_lifecycle(GAME_STARTED);
        self.room_changed = true;
    }

    fn check_ready_barrier(&mut self) {
        if !self.room.take_all_ready() {
            return;
        }

        info!(room = %self.room.code(), "all participants ready");
        self.out
            .emit(Recipient::Everyone, ALL_READY, &EmptyPayload {});

        if self.room.game_id() == Some(self.game_id.as_str()) {
            let players = self.room.player_indexes();
            if let Err(err) = self.table.start(&players, &mut self.out) {
                warn!(error = %err, "card table failed to start");
            }
            self.room_changed = true;
        }
    }

    fn relay(
        &mut self,
        connection: ConnectionId,
        event: &str,
        data: Value,
        now_ms: i64,
    ) -> Result<Option<Value>, RelayError> {
        match self.role(connection) {
            None => Err(RelayError::Unidentified),
            Some(Role::Player(index)) => {
                if self.room.host().is_none() {
                    return Err(RelayError::NoHost);
                }

                let mut payload = normalize_payload(data);
                payload.insert(PLAYER_FIELD.to_owned(), Value::from(index));
                self.out
                    .push(Recipient::Host, event, Value::Object(payload.clone()));

                self.dispatch_to_table(index, event, payload, now_ms);
                Ok(reply(&RelayAck::ok()))
            }
            Some(Role::Host) => {
                match data {
                    Value::Object(mut map) if map.contains_key(TARGET_FIELD) => {
                        let target = map.remove(TARGET_FIELD);
                        let player = target
                            .as_ref()
                            .and_then(Value::as_u64)
                            .and_then(|index| PlayerIndex::try_from(index).ok())
                            .and_then(|index| self.room.player(index));
                        match player {
                            Some(player) => {
                                let to = Recipient::Connection(player.connection);
                                self.out.push(to, event, Value::Object(map));
                            }
                            None => debug!(event, target = ?target, "unknown target dropped"),
                        }
                    }
                    other => self.out.push(Recipient::Players, event, other),
                }
                Ok(None)
            }
        }
    }

    fn dispatch_to_table(
        &mut self,
        player: PlayerIndex,
        event: &str,
        payload: Map<String, Value>,
        now_ms: i64,
    ) {
        if self.room.game_id() != Some(self.game_id.as_str()) || !self.table.is_running() {
            return;
        }

        match event {
            CARD_PLAY => {
                // Refusals are already re-synchronized by the table.
                let _ = self.table.play_card(player, &mut self.out);
            }
            BELL_HIT => {
                let request: BellHitRequest =
                    serde_json::from_value(Value::Object(payload)).unwrap_or_default();
                self.table
                    .buzz(player, request.timestamp, now_ms, &mut self.out);
            }
            _ => return,
        }
        self.sync_game_over();
    }

    fn sync_game_over(&mut self) {
        if let Some(winner) = self.table.take_game_over() {
            self.declare_game_over(winner);
        }
    }

    fn declare_game_over(&mut self, winner: PlayerIndex) {
        info!(winner, "game over");
        self.room.finish_game();
        self.out
            .emit(Recipient::Everyone, GAME_OVER, &GameOverEvent { winner });
        self.room_changed = true;
    }

    fn stop_table(&mut self) {
        if self.table.is_running() {
            self.table.reset(&mut self.out);
        } else {
            self.table.clear(&mut self.out);
        }
    }

    fn kick(&mut self, players: &[Player]) {
        for player in players {
            self.out.emit(
                Recipient::Connection(player.connection),
                KICKED,
                &EmptyPayload {},
            );
        }
    }

    fn emit_presence(&mut self, event: &str, player: &Player) {
        let payload = PlayerPresenceEvent {
            player: player.into(),
            room: self.snapshot(),
        };
        self.out.emit(Recipient::Everyone, event, &payload);
    }

    fn emit_lifecycle(&mut self, event: &str) {
        let payload = GameLifecycleEvent {
            game_id: self.room.game_id().map(str::to_owned),
            room: self.snapshot(),
        };
        self.out.emit(Recipient::Everyone, event, &payload);
    }

    fn require_role(&self, connection: ConnectionId) -> Result<Role, RelayError> {
        self.role(connection).ok_or(RelayError::Unidentified)
    }

    fn require_host(&self, connection: ConnectionId) -> Result<(), RelayError> {
        match self.role(connection) {
            Some(Role::Host) => Ok(()),
            _ => Err(RelayError::HostOnly),
        }
    }
}

/// Objects pass through, `null` becomes `{}`, anything else is wrapped as `{"data": value}`.
fn normalize_payload(data: Value) -> Map<String, Value> {
    match data {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_owned(), other);
            map
        }
    }
}

/// Deserialize an optional payload; `null` yields the default.
fn parse_payload<T>(data: Value) -> Result<T, RelayError>
where
    T: DeserializeOwned + Default,
{
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data).map_err(|err| RelayError::InvalidPayload(err.to_string()))
}

fn reply<T: Serialize>(payload: &T) -> Option<Value> {
    match serde_json::to_value(payload) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(error = %err, "failed to serialize acknowledgement");
            None
        }
    }
}
