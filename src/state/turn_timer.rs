//! Per-turn clock.
//!
//! Each running turn owns one tick timer. Ticks carrying any other token are stale and ignored.

use std::time::Duration;

use tracing::debug;

use crate::state::{
    PlayerIndex,
    outbox::{Outbox, TimerKind, TimerToken},
};

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
struct Running {
    player: PlayerIndex,
    remaining: u32,
    token: TimerToken,
}

/// Result of a tick timer firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnTick {
    /// The token was cancelled or superseded.
    Stale,
    /// One second elapsed; `visible` once the countdown should be shown.
    Running {
        /// Player whose turn is being timed.
        player: PlayerIndex,
        /// Whole seconds left.
        remaining: u32,
        /// Whether clients should display the countdown.
        visible: bool,
    },
    /// The limit was reached.
    Expired {
        /// Player whose turn ran out.
        player: PlayerIndex,
    },
}

/// Per-turn countdown driven by one-second ticks.
#[derive(Debug)]
pub struct TurnTimer {
    limit_secs: u32,
    countdown_from: u32,
    running: Option<Running>,
}

impl TurnTimer {
    /// Timer with a `limit_secs` budget, visible for the last `countdown_from` seconds.
    pub fn new(limit_secs: u32, countdown_from: u32) -> Self {
        Self {
            limit_secs: limit_secs.max(1),
            countdown_from,
            running: None,
        }
    }

    /// Player currently being timed.
    #[cfg(test)]
    pub fn player(&self) -> Option<PlayerIndex> {
        self.running.map(|running| running.player)
    }

    /// Restart the countdown for `player`, cancelling any previous one.
    pub fn start(&mut self, player: PlayerIndex, out: &mut Outbox) {
        self.cancel(out);
        let token = out.schedule(TimerKind::TurnTick, TICK);
        self.running = Some(Running {
            player,
            remaining: self.limit_secs,
            token,
        });
        debug!(player, limit = self.limit_secs, "turn timer started");
    }

    /// Stop the countdown. Returns the timed player and whether the countdown was on screen.
    pub fn cancel(&mut self, out: &mut Outbox) -> Option<(PlayerIndex, bool)> {
        let running = self.running.take()?;
        out.cancel(running.token);
        Some((running.player, self.is_visible(running.remaining)))
    }

    /// Handle a fired tick.
    pub fn tick(&mut self, token: TimerToken, out: &mut Outbox) -> TurnTick {
        let Some(running) = self.running.as_mut() else {
            return TurnTick::Stale;
        };
        if running.token != token {
            return TurnTick::Stale;
        }

        running.remaining = running.remaining.saturating_sub(1);
        let player = running.player;
        let remaining = running.remaining;

        if remaining == 0 {
            self.running = None;
            debug!(player, "turn timer expired");
            return TurnTick::Expired { player };
        }

        running.token = out.schedule(TimerKind::TurnTick, TICK);
        TurnTick::Running {
            player,
            remaining,
            visible: self.is_visible(remaining),
        }
    }

    fn is_visible(&self, remaining: u32) -> bool {
        remaining <= self.countdown_from
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::outbox::TimerCommand;

    fn last_token(out: &Outbox) -> TimerToken {
        match out.timers().last() {
            Some(TimerCommand::Schedule { token, .. }) => *token,
            other => panic!("expected a scheduled tick, got {other:?}"),
        }
    }

    #[test]
    fn counts_down_and_shows_only_the_final_seconds() {
        let mut timer = TurnTimer::new(5, 2);
        let mut out = Outbox::new();
        timer.start(7, &mut out);

        let mut seen = Vec::new();
        loop {
            let token = last_token(&out);
            match timer.tick(token, &mut out) {
                TurnTick::Running {
                    player,
                    remaining,
                    visible,
                } => {
                    assert_eq!(player, 7);
                    seen.push((remaining, visible));
                }
                TurnTick::Expired { player } => {
                    assert_eq!(player, 7);
                    break;
                }
                TurnTick::Stale => panic!("live token reported stale"),
            }
        }

        assert_eq!(seen, vec![(4, false), (3, false), (2, true), (1, true)]);
        assert_eq!(timer.player(), None);
    }

    #[test]
    fn superseded_token_is_stale() {
        let mut timer = TurnTimer::new(30, 10);
        let mut out = Outbox::new();

        timer.start(0, &mut out);
        let old = last_token(&out);
        timer.start(1, &mut out);

        assert_eq!(timer.tick(old, &mut out), TurnTick::Stale);
        assert_eq!(timer.player(), Some(1));
        assert!(out.timers().contains(&TimerCommand::Cancel { token: old }));
    }

    #[test]
    fn cancelled_timer_never_expires() {
        let mut timer = TurnTimer::new(1, 1);
        let mut out = Outbox::new();
        timer.start(0, &mut out);
        let token = last_token(&out);

        assert_eq!(timer.cancel(&mut out), Some((0, true)));
        assert_eq!(timer.tick(token, &mut out), TurnTick::Stale);
        assert_eq!(timer.cancel(&mut out), None);
    }

    #[test]
    fn cancel_reports_hidden_countdown_early_in_the_turn() {
        let mut timer = TurnTimer::new(30, 10);
        let mut out = Outbox::new();
        timer.start(2, &mut out);
        assert_eq!(timer.cancel(&mut out), Some((2, false)));
    }
}
