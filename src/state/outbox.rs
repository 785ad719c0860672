//! Side effects produced by the synchronous room core.
//!
//! Core methods never touch sockets or tokio tasks. They append addressed messages and timer
//! commands here, and the service layer drains the outbox before the room lock is released.

use std::{fmt, time::Duration};

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::state::{ConnectionId, PlayerIndex};

/// Identifies one scheduled timer. A fired token that is no longer the live one is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    #[cfg(test)]
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// The bell race collection window closes.
    RaceWindow,
    /// The pause after a bell outcome ends and play resumes.
    RaceSettle,
    /// One second of the current turn has elapsed.
    TurnTick,
}

/// Request for the service layer to start or stop a timer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerCommand {
    /// Fire `kind` with `token` after `delay`.
    Schedule {
        /// Token handed back when the timer fires.
        token: TimerToken,
        /// What the timer does.
        kind: TimerKind,
        /// Delay before firing.
        delay: Duration,
    },
    /// Abort the task for `token` if it has not fired yet.
    Cancel {
        /// Token of the timer to abort.
        token: TimerToken,
    },
}

/// Who a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// The host connection.
    Host,
    /// One player by index.
    Player(PlayerIndex),
    /// Every joined player.
    Players,
    /// Host and every joined player.
    Everyone,
    /// A specific connection, identified or not.
    Connection(ConnectionId),
}

/// One addressed event.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    /// Destination.
    pub to: Recipient,
    /// Event name.
    pub event: String,
    /// Event payload.
    pub data: Value,
}

/// Buffer of pending messages and timer commands.
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<Outbound>,
    timers: Vec<TimerCommand>,
    next_token: u64,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` for `to`. Payloads that fail to serialize are dropped with a warning.
    pub fn emit<T: Serialize>(&mut self, to: Recipient, event: &str, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(data) => self.push(to, event, data),
            Err(err) => warn!(event, error = %err, "failed to serialize outbound payload"),
        }
    }

    /// Queue an already serialized payload.
    pub fn push(&mut self, to: Recipient, event: &str, data: Value) {
        self.messages.push(Outbound {
            to,
            event: event.to_owned(),
            data,
        });
    }

    /// Ask for a timer and return the token it will fire with.
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.timers.push(TimerCommand::Schedule { token, kind, delay });
        token
    }

    /// Ask for a pending timer to be aborted.
    pub fn cancel(&mut self, token: TimerToken) {
        self.timers.push(TimerCommand::Cancel { token });
    }

    /// Timer commands queued so far, in emission order.
    #[cfg(test)]
    pub fn timers(&self) -> &[TimerCommand] {
        &self.timers
    }

    /// Drain queued messages.
    pub fn take_messages(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.messages)
    }

    /// Drain queued timer commands.
    pub fn take_timers(&mut self) -> Vec<TimerCommand> {
        std::mem::take(&mut self.timers)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tokens_are_unique_per_outbox() {
        let mut out = Outbox::new();
        let first = out.schedule(TimerKind::TurnTick, Duration::from_secs(1));
        let second = out.schedule(TimerKind::TurnTick, Duration::from_secs(1));
        assert_ne!(first, second);

        out.take_timers();
        let third = out.schedule(TimerKind::RaceWindow, Duration::from_millis(500));
        assert!(third > second);
    }

    #[test]
    fn take_drains_in_emission_order() {
        let mut out = Outbox::new();
        out.emit(Recipient::Host, "first", &json!({ "a": 1 }));
        out.emit(Recipient::Players, "second", &json!({}));
        let token = out.schedule(TimerKind::RaceSettle, Duration::from_millis(800));
        out.cancel(token);

        let messages = out.take_messages();
        assert_eq!(
            messages.iter().map(|m| m.event.as_str()).collect::<Vec<_>>(),
            ["first", "second"]
        );
        assert_eq!(messages[0].data, json!({ "a": 1 }));
        assert!(out.take_messages().is_empty());

        let timers = out.take_timers();
        assert_eq!(timers.len(), 2);
        assert_eq!(timers[1], TimerCommand::Cancel { token });
    }
}
