use std::time::Duration;

use tracing::{debug, trace};

use crate::{
    services::websocket_service,
    state::{
        SharedState,
        outbox::{TimerCommand, TimerKind, TimerToken},
    },
};

/// Spawn or abort timer tasks as requested by the room.
pub fn apply(state: &SharedState, commands: Vec<TimerCommand>) {
    for command in commands {
        match command {
            TimerCommand::Schedule { token, kind, delay } => {
                trace!(%token, ?kind, ?delay, "scheduling timer");
                let handle = tokio::spawn(run_timer(state.clone(), token, kind, delay));
                if let Some(previous) = state.timers().insert(token, handle) {
                    previous.abort();
                }
            }
            TimerCommand::Cancel { token } => {
                if let Some((_, handle)) = state.timers().remove(&token) {
                    trace!(%token, "cancelling timer");
                    handle.abort();
                }
            }
        }
    }
}

async fn run_timer(state: SharedState, token: TimerToken, kind: TimerKind, delay: Duration) {
    tokio::time::sleep(delay).await;

    let mut relay = state.relay().lock().await;
    if state.timers().remove(&token).is_none() {
        debug!(%token, "timer cancelled while waiting for the room");
        return;
    }
    relay.fire_timer(kind, token);
    let dispatch = relay.drain();
    websocket_service::deliver(&state, dispatch);
}
