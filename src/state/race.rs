//! Bell race batching.
//!
//! The first buzz of a round opens a fixed window; every buzz received before it closes joins the
//! same batch. When the window timer fires the batch is ordered by the reported timestamp and the
//! earliest entry wins.

use std::time::Duration;

use tracing::{debug, warn};

use crate::state::{
    PlayerIndex,
    outbox::{Outbox, TimerKind, TimerToken},
    phase::GamePhase,
};

/// One buzz signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BellHit {
    /// Who buzzed.
    pub player: PlayerIndex,
    /// Milliseconds since the Unix epoch, as reported for ordering.
    pub timestamp: i64,
}

/// What happened to a buzz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuzzDisposition {
    /// Outside the playing phase or while a previous race is resolving.
    Ignored,
    /// First buzz of the round; the window timer was scheduled.
    Opened,
    /// Appended to the open batch.
    Joined,
}

/// A closed race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceResult {
    /// Earliest hit.
    pub winner: BellHit,
    /// Other players in the batch, distinct, in hit order.
    pub competitors: Vec<PlayerIndex>,
    /// Every hit, sorted.
    pub hits: Vec<BellHit>,
}

/// Collects buzzes for one round at a time.
#[derive(Debug, Default)]
pub struct RaceWindowResolver {
    hits: Vec<BellHit>,
    window: Option<TimerToken>,
    resolving: bool,
}

impl RaceWindowResolver {
    /// Create an idle resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a window is collecting buzzes.
    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.window.is_some()
    }

    /// True between the window closing and [`RaceWindowResolver::release`].
    #[cfg(test)]
    pub fn is_resolving(&self) -> bool {
        self.resolving
    }

    /// Record a buzz. Opens the window on the first buzz of a round.
    pub fn buzz(
        &mut self,
        phase: GamePhase,
        hit: BellHit,
        window: Duration,
        out: &mut Outbox,
    ) -> BuzzDisposition {
        if phase != GamePhase::Playing || self.resolving {
            debug!(player = hit.player, ?phase, resolving = self.resolving, "buzz ignored");
            return BuzzDisposition::Ignored;
        }

        if self.hits.iter().any(|known| known.player == hit.player) {
            // Kept: ordering already isolates a player's earliest hit.
            warn!(player = hit.player, timestamp = hit.timestamp, "duplicate buzz in race window");
        }
        self.hits.push(hit);

        if self.window.is_none() {
            self.window = Some(out.schedule(TimerKind::RaceWindow, window));
            debug!(player = hit.player, "race window opened");
            BuzzDisposition::Opened
        } else {
            BuzzDisposition::Joined
        }
    }

    /// Close the window identified by `token`. Returns `None` for a stale or unknown token.
    ///
    /// The resolver stays locked until [`RaceWindowResolver::release`].
    pub fn close(&mut self, token: TimerToken) -> Option<RaceResult> {
        if self.window != Some(token) {
            return None;
        }
        self.window = None;

        let mut hits = std::mem::take(&mut self.hits);
        // Stable: equal timestamps keep arrival order.
        hits.sort_by_key(|hit| hit.timestamp);
        let winner = *hits.first()?;

        self.resolving = true;

        let mut competitors = Vec::new();
        for hit in &hits {
            if hit.player != winner.player && !competitors.contains(&hit.player) {
                competitors.push(hit.player);
            }
        }

        Some(RaceResult {
            winner,
            competitors,
            hits,
        })
    }

    /// Unlock the resolver so the next round can open a window.
    pub fn release(&mut self) {
        self.resolving = false;
    }

    /// Drop any open window and batch, and unlock.
    pub fn cancel(&mut self, out: &mut Outbox) {
        if let Some(token) = self.window.take() {
            out.cancel(token);
        }
        self.hits.clear();
        self.resolving = false;
    }
}
