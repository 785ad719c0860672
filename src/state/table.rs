//! The built-in card game engine: rules, bell races and the turn clock behind one event surface.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    dto::game::{
        BellRaceEvent, BellResultEvent, CardCountEvent, CardDealtEvent, CardPlayedEvent,
        CardSnapshot, CardsCollectedEvent, EmptyPayload, GameOverEvent, GameStartEvent,
        PileSnapshot, PlayerEvent, TurnChangeEvent, TurnCountdownEvent, YourTurnEvent,
    },
    state::{
        PlayerIndex,
        dealer::{self, Card},
        outbox::{Outbox, Recipient, TimerKind, TimerToken},
        phase::GamePhase,
        race::{BellHit, BuzzDisposition, RaceResult, RaceWindowResolver},
        state_machine::{BellOutcome, GameError, GameStateMachine},
        turn_timer::{TurnTick, TurnTimer},
    },
};

/// Controller event: play the top card of the hand.
pub const CARD_PLAY: &str = "card-play";
/// Controller event: hit the bell.
pub const BELL_HIT: &str = "bell-hit";

const CARD_DEALT: &str = "card-dealt";
const BELL_DESCENT: &str = "bell-descent";
const GAME_START: &str = "game-start";
const CARD_PLAYED: &str = "card-played";
const TURN_CHANGE: &str = "turn-change";
const YOUR_TURN: &str = "your-turn";
const TURN_COUNTDOWN: &str = "turn-countdown";
const TURN_TIMEOUT: &str = "turn-timeout";
const BELL_RACE_JOINED: &str = "bell-race-joined";
const BELL_RACE: &str = "bell-race";
const BELL_RESULT: &str = "bell-result";
const CARD_COUNT_UPDATE: &str = "card-count-update";
const CARDS_COLLECTED: &str = "cards-collected";
const PLAYER_ELIMINATED: &str = "player-eliminated";
const GAME_OVER: &str = "game-over";
const GAME_RESET: &str = "game-reset";

/// Durations and clock policy of a table.
#[derive(Debug, Clone, Copy)]
pub struct TableTiming {
    /// How long buzzes are batched after the first one.
    pub race_window: Duration,
    /// Pause after a bell outcome before play resumes.
    pub race_settle: Duration,
    /// Seconds a player has to play a card.
    pub turn_time_limit_secs: u32,
    /// Remaining seconds from which the countdown is broadcast.
    pub countdown_from_secs: u32,
    /// Order races by the controller clock instead of server receipt time.
    pub trust_client_clock: bool,
}

impl Default for TableTiming {
    fn default() -> Self {
        Self {
            race_window: Duration::from_millis(500),
            race_settle: Duration::from_millis(800),
            turn_time_limit_secs: 30,
            countdown_from_secs: 10,
            trust_client_clock: true,
        }
    }
}

/// Authoritative card game table for one room.
#[derive(Debug)]
pub struct GameTable {
    game: GameStateMachine,
    race: RaceWindowResolver,
    turn_timer: TurnTimer,
    timing: TableTiming,
    settle: Option<TimerToken>,
    finished: Option<PlayerIndex>,
}

impl GameTable {
    /// Create an idle table.
    pub fn new(timing: TableTiming) -> Self {
        Self {
            game: GameStateMachine::new(),
            race: RaceWindowResolver::new(),
            turn_timer: TurnTimer::new(timing.turn_time_limit_secs, timing.countdown_from_secs),
            timing,
            settle: None,
            finished: None,
        }
    }

    /// Read access to the rules engine.
    pub fn game(&self) -> &GameStateMachine {
        &self.game
    }

    /// True while turns and buzzes are accepted.
    pub fn is_running(&self) -> bool {
        self.game.phase() == GamePhase::Playing
    }

    /// Deal a freshly shuffled deck to `players` and announce the first turn.
    pub fn start(&mut self, players: &[PlayerIndex], out: &mut Outbox) -> Result<(), GameError> {
        self.start_with(players, dealer::shuffle, out)
    }

    /// Same as [`GameTable::start`] with a caller-provided shuffle.
    pub fn start_with<F>(
        &mut self,
        players: &[PlayerIndex],
        shuffle: F,
        out: &mut Outbox,
    ) -> Result<(), GameError>
    where
        F: FnOnce(&mut [Card]),
    {
        self.clear(out);
        self.game.start(players, shuffle)?;

        for &player in self.game.participants() {
            for card in self.game.hand(player) {
                out.emit(
                    Recipient::Player(player),
                    CARD_DEALT,
                    &CardDealtEvent {
                        card: card.into(),
                    },
                );
            }
        }

        out.emit(Recipient::Everyone, BELL_DESCENT, &EmptyPayload {});
        let piles = self
            .game
            .participants()
            .iter()
            .map(|&player| PileSnapshot {
                player_index: player,
                cards: self.game.pile(player).iter().map(CardSnapshot::from).collect(),
            })
            .collect();
        out.emit(Recipient::Everyone, GAME_START, &GameStartEvent { piles });
        self.send_card_counts(out);

        self.announce_turn(out);
        Ok(())
    }

    /// Play the top card of `player`'s hand.
    ///
    /// A refused play re-broadcasts the current turn so the sender can resynchronize; the turn
    /// clock keeps running.
    pub fn play_card(&mut self, player: PlayerIndex, out: &mut Outbox) -> Result<Card, GameError> {
        let played = if self.game.is_bell_in_flight() {
            Err(GameError::BellInFlight)
        } else {
            self.game.play_card(player)
        };

        match played {
            Ok(card) => {
                self.stop_turn_timer(out);
                out.emit(
                    Recipient::Everyone,
                    CARD_PLAYED,
                    &CardPlayedEvent {
                        player_index: player,
                        card: (&card).into(),
                    },
                );
                out.emit(
                    Recipient::Player(player),
                    CARD_COUNT_UPDATE,
                    &CardCountEvent {
                        count: self.game.hand(player).len(),
                    },
                );
                self.announce_turn(out);
                Ok(card)
            }
            Err(err) => {
                debug!(player, error = %err, "card play refused");
                if self.is_running() && !self.game.is_bell_in_flight() {
                    self.send_turn(out);
                }
                Err(err)
            }
        }
    }

    /// Register a bell hit. `client_timestamp` is used for ordering when the clock is trusted.
    pub fn buzz(
        &mut self,
        player: PlayerIndex,
        client_timestamp: Option<i64>,
        now_ms: i64,
        out: &mut Outbox,
    ) -> BuzzDisposition {
        if !self.game.active_players().contains(&player) {
            debug!(player, "bell hit from a player outside the game");
            return BuzzDisposition::Ignored;
        }

        let timestamp = match client_timestamp {
            Some(ts) if self.timing.trust_client_clock => ts,
            _ => now_ms,
        };
        let hit = BellHit { player, timestamp };

        let disposition = self
            .race
            .buzz(self.game.phase(), hit, self.timing.race_window, out);
        if disposition != BuzzDisposition::Ignored {
            out.emit(Recipient::Player(player), BELL_RACE_JOINED, &EmptyPayload {});
        }
        disposition
    }

    /// Handle a fired timer. Tokens that are no longer live are ignored.
    pub fn on_timer(&mut self, kind: TimerKind, token: TimerToken, out: &mut Outbox) {
        match kind {
            TimerKind::RaceWindow => {
                if let Some(result) = self.race.close(token) {
                    self.resolve_race(result, out);
                }
            }
            TimerKind::RaceSettle => {
                if self.settle == Some(token) {
                    self.settle = None;
                    self.settle_race(out);
                }
            }
            TimerKind::TurnTick => match self.turn_timer.tick(token, out) {
                TurnTick::Stale => {}
                TurnTick::Running {
                    player,
                    remaining,
                    visible,
                } => {
                    if visible {
                        out.emit(
                            Recipient::Everyone,
                            TURN_COUNTDOWN,
                            &TurnCountdownEvent {
                                player_index: player,
                                remaining: Some(remaining),
                            },
                        );
                    }
                }
                TurnTick::Expired { player } => self.expire_turn(player, out),
            },
        }
    }

    /// Stop everything and tell every client the game was reset.
    pub fn reset(&mut self, out: &mut Outbox) {
        self.clear(out);
        out.emit(Recipient::Everyone, GAME_RESET, &EmptyPayload {});
    }

    /// Stop everything without notifying anyone.
    pub fn clear(&mut self, out: &mut Outbox) {
        self.stop_turn_timer(out);
        self.race.cancel(out);
        if let Some(token) = self.settle.take() {
            out.cancel(token);
        }
        self.game.reset();
        self.finished = None;
    }

    /// Winner declared since the last call, if any.
    pub fn take_game_over(&mut self) -> Option<PlayerIndex> {
        self.finished.take()
    }

    fn resolve_race(&mut self, result: RaceResult, out: &mut Outbox) {
        // A timeout may have eliminated hitters while the window was open.
        let active = self.game.active_players();
        let Some(winner) = result
            .hits
            .iter()
            .map(|hit| hit.player)
            .find(|player| active.contains(player))
        else {
            debug!(hits = result.hits.len(), "bell race had no active hitter left");
            self.race.release();
            return;
        };
        let competitors: Vec<PlayerIndex> = result
            .competitors
            .iter()
            .copied()
            .filter(|&player| player != winner && active.contains(&player))
            .collect();
        if winner != result.winner.player {
            info!(
                eliminated = result.winner.player,
                winner, "earliest hitter left the game, next hit takes the race"
            );
        }

        // Presentation only: decides whether competitors are shown.
        let will_succeed = self.game.has_winning_total();

        let outcome = match self.game.ring_bell(winner) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(player = winner, error = %err, "bell race discarded");
                self.race.release();
                return;
            }
        };

        info!(
            winner,
            competitors = ?competitors,
            success = outcome.success,
            "bell race resolved"
        );

        self.stop_turn_timer(out);
        if will_succeed && !competitors.is_empty() {
            out.emit(
                Recipient::Everyone,
                BELL_RACE,
                &BellRaceEvent {
                    winner,
                    competitors,
                },
            );
        }

        self.publish_outcome(outcome, out);

        if self.game.is_game_over() {
            self.race.release();
            self.game.release_bell();
        } else {
            self.settle = Some(out.schedule(TimerKind::RaceSettle, self.timing.race_settle));
        }
    }

    fn settle_race(&mut self, out: &mut Outbox) {
        self.race.release();
        self.game.release_bell();
        self.announce_turn(out);
    }

    fn expire_turn(&mut self, player: PlayerIndex, out: &mut Outbox) {
        info!(player, "turn timed out");
        out.emit(
            Recipient::Everyone,
            TURN_TIMEOUT,
            &PlayerEvent {
                player_index: player,
            },
        );

        let outcome = match self.game.apply_penalty(player) {
            Ok(outcome) => outcome,
            Err(err) => {
                // A bell outcome already owns this round.
                debug!(player, error = %err, "timeout penalty skipped");
                return;
            }
        };

        self.publish_outcome(outcome, out);
        self.game.release_bell();
        if self.game.is_game_over() {
            return;
        }

        self.game.advance_after_timeout(player);
        self.announce_turn(out);
    }

    fn publish_outcome(&mut self, outcome: BellOutcome, out: &mut Outbox) {
        out.emit(
            Recipient::Everyone,
            BELL_RESULT,
            &BellResultEvent {
                success: outcome.success,
                player_index: outcome.player,
                pattern_totals: outcome.pattern_totals,
            },
        );
        self.send_card_counts(out);

        if let Some(cards) = outcome.collected_cards {
            out.emit(
                Recipient::Player(outcome.player),
                CARDS_COLLECTED,
                &CardsCollectedEvent {
                    cards: cards.iter().map(CardSnapshot::from).collect(),
                },
            );
        }

        for (receiver, card) in outcome.penalty_cards.unwrap_or_default() {
            out.emit(
                Recipient::Player(receiver),
                CARD_DEALT,
                &CardDealtEvent {
                    card: (&card).into(),
                },
            );
        }

        if let Some(eliminated) = outcome.eliminated {
            out.emit(
                Recipient::Everyone,
                PLAYER_ELIMINATED,
                &PlayerEvent {
                    player_index: eliminated,
                },
            );
        }

        if let Some(winner) = outcome.winner {
            self.finish(winner, out);
        }
    }

    fn finish(&mut self, winner: PlayerIndex, out: &mut Outbox) {
        self.stop_turn_timer(out);
        self.race.cancel(out);
        if let Some(token) = self.settle.take() {
            out.cancel(token);
        }
        out.emit(Recipient::Everyone, GAME_OVER, &GameOverEvent { winner });
        self.finished = Some(winner);
    }

    fn announce_turn(&mut self, out: &mut Outbox) {
        if !self.is_running() {
            return;
        }
        self.send_turn(out);
        match self.game.current_turn() {
            Some(player) => self.turn_timer.start(player, out),
            None => warn!("playing table without a current turn"),
        }
    }

    fn send_turn(&self, out: &mut Outbox) {
        let current = self.game.current_turn();
        out.emit(
            Recipient::Everyone,
            TURN_CHANGE,
            &TurnChangeEvent {
                current_turn: current,
            },
        );
        for &player in self.game.participants() {
            out.emit(
                Recipient::Player(player),
                YOUR_TURN,
                &YourTurnEvent {
                    is_your_turn: current == Some(player),
                },
            );
        }
    }

    fn send_card_counts(&self, out: &mut Outbox) {
        for &player in self.game.participants() {
            out.emit(
                Recipient::Player(player),
                CARD_COUNT_UPDATE,
                &CardCountEvent {
                    count: self.game.hand(player).len(),
                },
            );
        }
    }

    fn stop_turn_timer(&mut self, out: &mut Outbox) {
        if let Some((player, true)) = self.turn_timer.cancel(out) {
            out.emit(
                Recipient::Everyone,
                TURN_COUNTDOWN,
                &TurnCountdownEvent {
                    player_index: player,
                    remaining: None,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::{
        dealer::Symbol,
        outbox::{Outbound, TimerCommand},
        state_machine::tests::card,
    };

    fn table(players: &[PlayerIndex], out: &mut Outbox) -> GameTable {
        let mut table = GameTable::new(TableTiming::default());
        table.start_with(players, |_| {}, out).unwrap();
        table
    }

    fn scheduled(out: &Outbox, wanted: TimerKind) -> Vec<TimerToken> {
        out.timers()
            .iter()
            .filter_map(|command| match command {
                TimerCommand::Schedule { token, kind, .. } if *kind == wanted => Some(*token),
                _ => None,
            })
            .collect()
    }

    fn last_scheduled(out: &Outbox, wanted: TimerKind) -> TimerToken {
        *scheduled(out, wanted)
            .last()
            .unwrap_or_else(|| panic!("no {wanted:?} scheduled"))
    }

    fn named<'a>(messages: &'a [Outbound], event: &str) -> Vec<&'a Outbound> {
        messages.iter().filter(|m| m.event == event).collect()
    }

    #[test]
    fn start_deals_to_each_player_and_opens_the_first_turn() {
        let mut out = Outbox::new();
        let table = table(&[0, 1], &mut out);
        let messages = out.take_messages();

        let dealt = named(&messages, CARD_DEALT);
        assert_eq!(dealt.len(), 56);
        assert_eq!(
            dealt
                .iter()
                .filter(|m| m.to == Recipient::Player(1))
                .count(),
            28
        );
        assert_eq!(named(&messages, BELL_DESCENT).len(), 1);
        assert_eq!(named(&messages, GAME_START).len(), 1);
        assert_eq!(
            named(&messages, TURN_CHANGE)[0].data,
            json!({ "currentTurn": 0 })
        );
        assert_eq!(scheduled(&out, TimerKind::TurnTick).len(), 1);
        assert!(table.is_running());
    }

    #[test]
    fn earliest_client_timestamp_wins_and_collects() {
        let mut out = Outbox::new();
        let mut table = table(&[0, 1], &mut out);
        let b_hand = vec![card(20, Symbol::Daisy, 1), card(21, Symbol::Daisy, 2)];
        table.game.arrange(
            vec![
                (0, vec![card(10, Symbol::Daisy, 1), card(11, Symbol::Daisy, 1)]),
                (1, b_hand.clone()),
            ],
            vec![
                (0, vec![card(1, Symbol::Rose, 4), card(2, Symbol::Rose, 3)]),
                (1, vec![card(3, Symbol::Rose, 2)]),
            ],
        );
        out.take_messages();

        // B's packet arrives first but A pressed earlier.
        assert_eq!(
            table.buzz(1, Some(150), 5_000, &mut out),
            BuzzDisposition::Opened
        );
        assert_eq!(
            table.buzz(0, Some(100), 5_010, &mut out),
            BuzzDisposition::Joined
        );
        let joined = out.take_messages();
        assert_eq!(named(&joined, BELL_RACE_JOINED).len(), 2);

        table.on_timer(
            TimerKind::RaceWindow,
            last_scheduled(&out, TimerKind::RaceWindow),
            &mut out,
        );
        let messages = out.take_messages();

        assert_eq!(
            named(&messages, BELL_RACE)[0].data,
            json!({ "winner": 0, "competitors": [1] })
        );
        let result = named(&messages, BELL_RESULT)[0];
        assert_eq!(result.data["success"], json!(true));
        assert_eq!(result.data["playerIndex"], json!(0));
        assert_eq!(result.data["patternTotals"]["rose"], json!(5));
        assert_eq!(named(&messages, CARDS_COLLECTED)[0].to, Recipient::Player(0));

        assert_eq!(table.game().hand(0).len(), 5);
        assert_eq!(table.game().hand(1), b_hand.as_slice());
        assert!(table.game().pile(0).is_empty() && table.game().pile(1).is_empty());
        assert_eq!(table.game().current_turn(), Some(0));
    }

    #[test]
    fn race_passes_to_next_hitter_when_the_earliest_is_eliminated() {
        let mut out = Outbox::new();
        let mut table = table(&[0, 1, 2], &mut out);
        table.game.arrange(
            vec![
                (0, vec![]),
                (1, vec![card(10, Symbol::Daisy, 1), card(11, Symbol::Daisy, 2)]),
                (2, vec![card(20, Symbol::Sunflower, 1)]),
            ],
            vec![],
        );
        table.buzz(0, Some(100), 1_000, &mut out);
        table.buzz(1, Some(200), 1_010, &mut out);
        let window = last_scheduled(&out, TimerKind::RaceWindow);

        // Player 0 runs out of time with an empty hand.
        for _ in 0..TableTiming::default().turn_time_limit_secs {
            table.on_timer(
                TimerKind::TurnTick,
                last_scheduled(&out, TimerKind::TurnTick),
                &mut out,
            );
        }
        assert_eq!(table.game().active_players(), &[1, 2]);
        out.take_messages();

        table.on_timer(TimerKind::RaceWindow, window, &mut out);
        let messages = out.take_messages();

        let results = named(&messages, BELL_RESULT);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].data["playerIndex"], json!(1));
        assert_eq!(results[0].data["success"], json!(false));
        assert_eq!(table.game().hand(2).len(), 2);
    }

    #[test]
    fn settle_blocks_buzzes_then_reannounces_the_turn() {
        let mut out = Outbox::new();
        let mut table = table(&[0, 1], &mut out);
        table.buzz(0, Some(1), 1, &mut out);
        table.on_timer(
            TimerKind::RaceWindow,
            last_scheduled(&out, TimerKind::RaceWindow),
            &mut out,
        );
        out.take_messages();

        assert_eq!(table.buzz(1, Some(2), 2, &mut out), BuzzDisposition::Ignored);
        assert_eq!(table.play_card(0, &mut out), Err(GameError::BellInFlight));
        assert!(out.take_messages().is_empty());

        let ticks_before = scheduled(&out, TimerKind::TurnTick).len();
        table.on_timer(
            TimerKind::RaceSettle,
            last_scheduled(&out, TimerKind::RaceSettle),
            &mut out,
        );
        let messages = out.take_messages();
        assert_eq!(named(&messages, TURN_CHANGE).len(), 1);
        assert_eq!(scheduled(&out, TimerKind::TurnTick).len(), ticks_before + 1);
        assert_eq!(table.buzz(1, Some(3), 3, &mut out), BuzzDisposition::Opened);
    }

    #[test]
    fn server_clock_orders_races_when_client_clock_is_untrusted() {
        let mut out = Outbox::new();
        let mut table = GameTable::new(TableTiming {
            trust_client_clock: false,
            ..TableTiming::default()
        });
        table.start_with(&[0, 1], |_| {}, &mut out).unwrap();

        table.buzz(1, Some(900), 100, &mut out);
        table.buzz(0, Some(1), 200, &mut out);
        table.on_timer(
            TimerKind::RaceWindow,
            last_scheduled(&out, TimerKind::RaceWindow),
            &mut out,
        );

        let messages = out.take_messages();
        assert_eq!(named(&messages, BELL_RESULT)[0].data["playerIndex"], json!(1));
    }

    #[test]
    fn turn_timeout_applies_the_penalty_and_moves_on() {
        let mut out = Outbox::new();
        let mut table = table(&[0, 1, 2], &mut out);
        let hand_before = table.game().hand(0).len();
        out.take_messages();

        for _ in 0..TableTiming::default().turn_time_limit_secs {
            table.on_timer(
                TimerKind::TurnTick,
                last_scheduled(&out, TimerKind::TurnTick),
                &mut out,
            );
        }
        let messages = out.take_messages();

        // Seconds 10 down to 1.
        assert_eq!(named(&messages, TURN_COUNTDOWN).len(), 10);
        assert_eq!(
            named(&messages, TURN_TIMEOUT)[0].data,
            json!({ "playerIndex": 0 })
        );
        assert_eq!(named(&messages, BELL_RESULT)[0].data["success"], json!(false));
        assert_eq!(named(&messages, CARD_DEALT).len(), 2);
        assert_eq!(table.game().hand(0).len(), hand_before - 2);
        assert_eq!(table.game().current_turn(), Some(1));
        assert!(!table.game().is_bell_in_flight());
        assert_eq!(
            named(&messages, TURN_CHANGE).last().map(|m| &m.data),
            Some(&json!({ "currentTurn": 1 }))
        );
    }

    #[test]
    fn playing_a_card_cancels_the_turn_clock() {
        let mut out = Outbox::new();
        let mut table = table(&[0, 1], &mut out);
        let tick = last_scheduled(&out, TimerKind::TurnTick);

        table.play_card(0, &mut out).unwrap();
        assert!(out.timers().contains(&TimerCommand::Cancel { token: tick }));
        out.take_messages();

        table.on_timer(TimerKind::TurnTick, tick, &mut out);
        assert!(out.take_messages().is_empty());
        assert_eq!(table.game().current_turn(), Some(1));
    }

    #[test]
    fn cancelled_visible_countdown_is_hidden() {
        let mut out = Outbox::new();
        let mut table = table(&[0, 1], &mut out);
        for _ in 0..25 {
            table.on_timer(
                TimerKind::TurnTick,
                last_scheduled(&out, TimerKind::TurnTick),
                &mut out,
            );
        }
        out.take_messages();

        table.play_card(0, &mut out).unwrap();
        let messages = out.take_messages();
        assert_eq!(
            named(&messages, TURN_COUNTDOWN)[0].data,
            json!({ "playerIndex": 0, "remaining": null })
        );
    }

    #[test]
    fn out_of_turn_play_resyncs_without_restarting_the_clock() {
        let mut out = Outbox::new();
        let mut table = table(&[0, 1], &mut out);
        out.take_messages();
        let timers_before = out.timers().len();

        assert_eq!(table.play_card(1, &mut out), Err(GameError::NotYourTurn(1)));
        let messages = out.take_messages();
        assert_eq!(named(&messages, TURN_CHANGE).len(), 1);
        assert_eq!(named(&messages, YOUR_TURN).len(), 2);
        assert_eq!(out.timers().len(), timers_before);
    }

    #[test]
    fn losing_the_last_card_ends_the_game() {
        let mut out = Outbox::new();
        let mut table = table(&[0, 1], &mut out);
        table.game.arrange(
            vec![
                (0, vec![card(1, Symbol::Rose, 1)]),
                (1, vec![card(2, Symbol::Rose, 1)]),
            ],
            vec![],
        );
        let tick = last_scheduled(&out, TimerKind::TurnTick);

        table.buzz(0, Some(10), 10, &mut out);
        table.on_timer(
            TimerKind::RaceWindow,
            last_scheduled(&out, TimerKind::RaceWindow),
            &mut out,
        );
        let messages = out.take_messages();

        assert_eq!(
            named(&messages, PLAYER_ELIMINATED)[0].data,
            json!({ "playerIndex": 0 })
        );
        assert_eq!(named(&messages, GAME_OVER)[0].data, json!({ "winner": 1 }));
        assert!(scheduled(&out, TimerKind::RaceSettle).is_empty());
        assert!(out.timers().contains(&TimerCommand::Cancel { token: tick }));
        assert_eq!(table.take_game_over(), Some(1));
        assert_eq!(table.take_game_over(), None);
        assert!(!table.is_running());
    }

    #[test]
    fn buzz_from_outside_the_game_is_ignored() {
        let mut out = Outbox::new();
        let mut table = table(&[0, 1], &mut out);
        out.take_messages();

        assert_eq!(table.buzz(7, Some(1), 1, &mut out), BuzzDisposition::Ignored);
        assert!(out.take_messages().is_empty());
    }

    #[test]
    fn reset_cancels_pending_timers() {
        let mut out = Outbox::new();
        let mut table = table(&[0, 1], &mut out);
        table.buzz(0, None, 1, &mut out);
        let window = last_scheduled(&out, TimerKind::RaceWindow);
        let tick = last_scheduled(&out, TimerKind::TurnTick);

        table.reset(&mut out);
        assert!(out.timers().contains(&TimerCommand::Cancel { token: window }));
        assert!(out.timers().contains(&TimerCommand::Cancel { token: tick }));
        assert_eq!(named(&out.take_messages(), GAME_RESET).len(), 1);

        table.on_timer(TimerKind::RaceWindow, window, &mut out);
        assert!(out.take_messages().is_empty());
        assert!(!table.is_running());
    }
}
