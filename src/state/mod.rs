pub mod dealer;
pub mod outbox;
pub mod phase;
pub mod race;
pub mod relay;
pub mod room;
mod sse;
pub mod state_machine;
pub mod table;
pub mod turn_timer;

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::config::AppConfig;

pub use self::sse::SseHub;
use self::{
    outbox::TimerToken,
    relay::{RelaySettings, SessionRelay},
};

pub type SharedState = Arc<AppState>;

/// Stable player index, assigned at join and never reused while the room lives.
pub type PlayerIndex = u32;
/// Identifier of one WebSocket connection.
pub type ConnectionId = Uuid;

const ROOM_SSE_CAPACITY: usize = 16;

#[derive(Clone)]
/// Handle used to push messages to a connected host or controller.
pub struct ClientConnection {
    pub id: ConnectionId,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state: the room controller, live sockets and pending timers.
pub struct AppState {
    config: Arc<AppConfig>,
    relay: Mutex<SessionRelay>,
    connections: DashMap<ConnectionId, ClientConnection>,
    timers: DashMap<TimerToken, JoinHandle<()>>,
    room_sse: SseHub,
    started_at: SystemTime,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        let relay = SessionRelay::new(RelaySettings::from(&config));
        Arc::new(Self {
            config: Arc::new(config),
            relay: Mutex::new(relay),
            connections: DashMap::new(),
            timers: DashMap::new(),
            room_sse: SseHub::new(ROOM_SSE_CAPACITY),
            started_at: SystemTime::now(),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The room controller. Every inbound event and timer fire runs under this lock.
    pub fn relay(&self) -> &Mutex<SessionRelay> {
        &self.relay
    }

    /// Registry of active sockets keyed by their identifier.
    pub fn connections(&self) -> &DashMap<ConnectionId, ClientConnection> {
        &self.connections
    }

    /// Pending timer tasks keyed by their token.
    pub fn timers(&self) -> &DashMap<TimerToken, JoinHandle<()>> {
        &self.timers
    }

    /// Broadcast hub used for the room SSE stream.
    pub fn room_sse(&self) -> &SseHub {
        &self.room_sse
    }

    /// Time at which the state was created.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }
}

/// Milliseconds since the Unix epoch, as used for bell race ordering.
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
