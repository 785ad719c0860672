//! Authoritative card game rules: hands, played piles, turn rotation, the bell and elimination.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::state::{
    PlayerIndex,
    dealer::{self, Card, Symbol},
    phase::{GamePhase, InvalidTransition, PhaseEvent, PhaseMachine},
};

/// A symbol total must hit this value exactly for the bell to succeed.
pub const WINNING_TOTAL: u32 = 5;

/// Reasons a game operation was refused. None of them change any state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Turns and bells are only accepted while playing.
    #[error("game is not in the playing phase")]
    NotPlaying,
    /// A card was played out of turn.
    #[error("it is not player {0}'s turn")]
    NotYourTurn(PlayerIndex),
    /// The player has nothing left to play.
    #[error("player {0} has no card left to play")]
    EmptyHand(PlayerIndex),
    /// The player was eliminated or never took part.
    #[error("player {0} is not an active participant")]
    NotActive(PlayerIndex),
    /// Another bell outcome is still being applied.
    #[error("a bell is already being resolved")]
    BellInFlight,
    /// A game needs at least one player.
    #[error("a game needs at least one player")]
    NoPlayers,
    /// Phase machine refused the transition.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// Per-symbol sum of the visible top cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PatternTotals(IndexMap<Symbol, u32>);

impl PatternTotals {
    fn zeroed() -> Self {
        Self(Symbol::ALL.into_iter().map(|symbol| (symbol, 0)).collect())
    }

    fn add(&mut self, card: &Card) {
        *self.0.entry(card.symbol).or_insert(0) += u32::from(card.weight);
    }

    /// Total for one symbol.
    pub fn get(&self, symbol: Symbol) -> u32 {
        self.0.get(&symbol).copied().unwrap_or(0)
    }

    /// True when any symbol adds up to exactly [`WINNING_TOTAL`].
    pub fn has_winning_total(&self) -> bool {
        self.0.values().any(|&total| total == WINNING_TOTAL)
    }
}

/// What a bell (or a forced penalty) did to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BellOutcome {
    /// Player who rang.
    pub player: PlayerIndex,
    /// Whether the pattern was a winning one.
    pub success: bool,
    /// Totals observed when the bell was rung.
    pub pattern_totals: PatternTotals,
    /// Every played card, in the shuffled order placed under the ringer's hand.
    pub collected_cards: Option<Vec<Card>>,
    /// Cards handed to each opponent as a penalty.
    pub penalty_cards: Option<Vec<(PlayerIndex, Card)>>,
    /// Set when the ringer ran out of cards paying the penalty.
    pub eliminated: Option<PlayerIndex>,
    /// Set when only one player is left.
    pub winner: Option<PlayerIndex>,
}

/// Table state for one game.
///
/// Stacks are stored bottom-first: `last()` is the top card.
#[derive(Debug, Clone, Default)]
pub struct GameStateMachine {
    phase: PhaseMachine,
    current_turn: Option<PlayerIndex>,
    participants: Vec<PlayerIndex>,
    active_players: Vec<PlayerIndex>,
    hands: IndexMap<PlayerIndex, Vec<Card>>,
    piles: IndexMap<PlayerIndex, Vec<Card>>,
    is_game_over: bool,
    winner: Option<PlayerIndex>,
    bell_in_flight: bool,
}

impl GameStateMachine {
    /// Create an empty table in the ready phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase.phase()
    }

    /// Player whose turn it is.
    pub fn current_turn(&self) -> Option<PlayerIndex> {
        self.current_turn
    }

    /// Everyone dealt into this game, in rotation order.
    pub fn participants(&self) -> &[PlayerIndex] {
        &self.participants
    }

    /// Players not yet eliminated, in rotation order.
    pub fn active_players(&self) -> &[PlayerIndex] {
        &self.active_players
    }

    /// Hand of `player`, bottom first.
    pub fn hand(&self, player: PlayerIndex) -> &[Card] {
        self.hands.get(&player).map(Vec::as_slice).unwrap_or_default()
    }

    /// Played pile of `player`, bottom first.
    pub fn pile(&self, player: PlayerIndex) -> &[Card] {
        self.piles.get(&player).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether a winner has been declared.
    pub fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    /// The declared winner, if any.
    pub fn winner(&self) -> Option<PlayerIndex> {
        self.winner
    }

    /// Whether a bell outcome is still held by the single-flight guard.
    pub fn is_bell_in_flight(&self) -> bool {
        self.bell_in_flight
    }

    /// Cards currently on the table, hands and piles together.
    pub fn total_cards(&self) -> usize {
        self.hands.values().chain(self.piles.values()).map(Vec::len).sum()
    }

    /// Start a round: shuffle a fresh deck with `shuffle`, deal it and open the table.
    pub fn start<F>(&mut self, active: &[PlayerIndex], shuffle: F) -> Result<(), GameError>
    where
        F: FnOnce(&mut [Card]),
    {
        if active.is_empty() {
            return Err(GameError::NoPlayers);
        }

        self.phase.apply(PhaseEvent::Shuffle)?;
        let mut deck = dealer::create_deck();
        shuffle(&mut deck);

        self.phase.apply(PhaseEvent::Distribute)?;
        self.init_game(active, deck);

        self.phase.apply(PhaseEvent::BeginPlay)?;
        info!(players = ?active, "card game started");
        Ok(())
    }

    /// Reset hands and piles and deal `deck` to `active`. The phase is left untouched.
    pub fn init_game(&mut self, active: &[PlayerIndex], deck: Vec<Card>) {
        let deal = dealer::distribute(active, deck);

        self.participants = active.to_vec();
        self.active_players = active.to_vec();
        self.hands = deal.hands;
        self.piles = deal.piles;
        self.is_game_over = false;
        self.winner = None;
        self.bell_in_flight = false;
        self.current_turn = active.first().copied();
    }

    /// Drop the current game and return to the ready phase.
    pub fn reset(&mut self) {
        let mut phase = std::mem::take(&mut self.phase);
        // Reset is valid from every phase.
        let _ = phase.apply(PhaseEvent::Reset);
        *self = Self {
            phase,
            ..Self::default()
        };
    }

    /// True iff `player` may play a card right now.
    pub fn can_play_card(&self, player: PlayerIndex) -> bool {
        self.check_play(player).is_ok()
    }

    fn check_play(&self, player: PlayerIndex) -> Result<(), GameError> {
        if self.phase() != GamePhase::Playing {
            return Err(GameError::NotPlaying);
        }
        if self.current_turn != Some(player) {
            return Err(GameError::NotYourTurn(player));
        }
        if self.hand(player).is_empty() {
            return Err(GameError::EmptyHand(player));
        }
        Ok(())
    }

    /// Move the top card of `player`'s hand onto their pile and pass the turn on.
    pub fn play_card(&mut self, player: PlayerIndex) -> Result<Card, GameError> {
        self.check_play(player)?;

        let card = self
            .hands
            .get_mut(&player)
            .and_then(Vec::pop)
            .ok_or(GameError::EmptyHand(player))?;
        self.piles.entry(player).or_default().push(card);

        self.current_turn = self.next_after(player);
        debug!(player, card = card.id, next = ?self.current_turn, "card played");
        Ok(card)
    }

    /// Sum the weights of the top card of every pile, per symbol.
    pub fn evaluate_pattern(&self) -> PatternTotals {
        let mut totals = PatternTotals::zeroed();
        for top in self.piles.values().filter_map(|pile| pile.last()) {
            totals.add(top);
        }
        totals
    }

    /// True when some symbol totals exactly [`WINNING_TOTAL`].
    pub fn has_winning_total(&self) -> bool {
        self.evaluate_pattern().has_winning_total()
    }

    /// Ring the bell for `player`. Succeeds when the visible pattern is a winning one.
    ///
    /// The guard stays held until [`GameStateMachine::release_bell`]; any call made before
    /// that returns [`GameError::BellInFlight`] and changes nothing.
    pub fn ring_bell(&mut self, player: PlayerIndex) -> Result<BellOutcome, GameError> {
        self.resolve_bell(player, false)
    }

    /// Apply the losing branch of the bell to `player` whatever the pattern shows.
    ///
    /// Shares the single-flight guard with [`GameStateMachine::ring_bell`].
    pub fn apply_penalty(&mut self, player: PlayerIndex) -> Result<BellOutcome, GameError> {
        self.resolve_bell(player, true)
    }

    /// Release the single-flight guard once the outcome has been relayed.
    pub fn release_bell(&mut self) {
        self.bell_in_flight = false;
    }

    /// Pass the turn on after `timed_out` let their clock run out.
    ///
    /// If `timed_out` was eliminated by the penalty the turn already moved on.
    pub fn advance_after_timeout(&mut self, timed_out: PlayerIndex) {
        if self.is_game_over {
            return;
        }
        if self.active_players.contains(&timed_out) {
            self.current_turn = self.next_after(timed_out);
        }
    }

    fn resolve_bell(
        &mut self,
        player: PlayerIndex,
        force_failure: bool,
    ) -> Result<BellOutcome, GameError> {
        if self.bell_in_flight {
            return Err(GameError::BellInFlight);
        }
        if self.phase() != GamePhase::Playing {
            return Err(GameError::NotPlaying);
        }
        if !self.active_players.contains(&player) {
            return Err(GameError::NotActive(player));
        }

        self.bell_in_flight = true;

        let pattern_totals = self.evaluate_pattern();
        let success = !force_failure && pattern_totals.has_winning_total();
        let mut outcome = BellOutcome {
            player,
            success,
            pattern_totals,
            collected_cards: None,
            penalty_cards: None,
            eliminated: None,
            winner: None,
        };

        if success {
            outcome.collected_cards = Some(self.collect_piles(player));
            self.current_turn = Some(player);
        } else {
            outcome.penalty_cards = Some(self.pay_penalty(player));
            if self.hand(player).is_empty() {
                self.eliminate(player);
                outcome.eliminated = Some(player);
            }
        }

        outcome.winner = self.check_game_over()?;
        Ok(outcome)
    }

    /// Take every played card, shuffle them and slide them under `player`'s hand.
    fn collect_piles(&mut self, player: PlayerIndex) -> Vec<Card> {
        let mut collected: Vec<Card> = self.piles.values_mut().flat_map(std::mem::take).collect();
        dealer::shuffle(&mut collected);

        let hand = self.hands.entry(player).or_default();
        let mut rebuilt = collected.clone();
        rebuilt.append(hand);
        *hand = rebuilt;

        collected
    }

    /// One card from the top of `loser`'s hand to the bottom of each other active hand.
    fn pay_penalty(&mut self, loser: PlayerIndex) -> Vec<(PlayerIndex, Card)> {
        let receivers: Vec<PlayerIndex> = self
            .active_players
            .iter()
            .copied()
            .filter(|&other| other != loser)
            .collect();

        let mut paid = Vec::with_capacity(receivers.len());
        for receiver in receivers {
            let Some(card) = self.hands.get_mut(&loser).and_then(Vec::pop) else {
                break;
            };
            self.hands.entry(receiver).or_default().insert(0, card);
            paid.push((receiver, card));
        }
        paid
    }

    fn eliminate(&mut self, player: PlayerIndex) {
        let Some(position) = self.active_players.iter().position(|&p| p == player) else {
            return;
        };
        self.active_players.remove(position);

        if self.current_turn == Some(player) {
            self.current_turn = if self.active_players.is_empty() {
                None
            } else {
                let clamped = position.min(self.active_players.len() - 1);
                Some(self.active_players[clamped])
            };
        }
        info!(player, remaining = ?self.active_players, "player eliminated");
    }

    fn check_game_over(&mut self) -> Result<Option<PlayerIndex>, GameError> {
        if self.is_game_over || self.active_players.len() != 1 {
            return Ok(None);
        }

        let winner = self.active_players[0];
        self.is_game_over = true;
        self.winner = Some(winner);
        self.phase.apply(PhaseEvent::Finish)?;
        info!(winner, "game over");
        Ok(Some(winner))
    }

    fn next_after(&self, player: PlayerIndex) -> Option<PlayerIndex> {
        let position = self.active_players.iter().position(|&p| p == player)?;
        let next = (position + 1) % self.active_players.len();
        self.active_players.get(next).copied()
    }

    /// Replace hands and piles wholesale. Test-only table arrangement.
    #[cfg(test)]
    pub(crate) fn arrange(
        &mut self,
        hands: Vec<(PlayerIndex, Vec<Card>)>,
        piles: Vec<(PlayerIndex, Vec<Card>)>,
    ) {
        self.hands = hands.into_iter().collect();
        self.piles = piles.into_iter().collect();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::state::dealer::DECK_SIZE;

    pub(crate) fn card(id: u8, symbol: Symbol, weight: u8) -> Card {
        Card { id, symbol, weight }
    }

    /// Started table with the unshuffled deck.
    fn playing(players: &[PlayerIndex]) -> GameStateMachine {
        let mut sm = GameStateMachine::new();
        sm.start(players, |_| {}).unwrap();
        sm
    }

    #[test]
    fn start_deals_and_opens_the_table() {
        let sm = playing(&[0, 1]);
        assert_eq!(sm.phase(), GamePhase::Playing);
        assert_eq!(sm.current_turn(), Some(0));
        assert_eq!(sm.hand(0).len(), 28);
        assert_eq!(sm.hand(1).len(), 28);
        assert!(sm.pile(0).is_empty());
        assert_eq!(sm.total_cards(), DECK_SIZE);
    }

    #[test]
    fn init_game_seeds_piles_with_the_remainder() {
        for seats in 1..=4u32 {
            let players: Vec<PlayerIndex> = (0..seats).collect();
            let mut sm = GameStateMachine::new();
            sm.init_game(&players, dealer::create_deck());

            let per_player = DECK_SIZE / seats as usize;
            let in_hands: usize = players.iter().map(|&p| sm.hand(p).len()).sum();
            let in_piles: usize = players.iter().map(|&p| sm.pile(p).len()).sum();
            assert_eq!(in_hands, per_player * seats as usize);
            assert_eq!(in_hands + in_piles, DECK_SIZE);
            assert_eq!(sm.current_turn(), Some(0));
        }
    }

    #[test]
    fn start_without_players_is_rejected() {
        let mut sm = GameStateMachine::new();
        assert_eq!(sm.start(&[], |_| {}), Err(GameError::NoPlayers));
        assert_eq!(sm.phase(), GamePhase::Ready);
    }

    #[test]
    fn cannot_start_twice() {
        let mut sm = playing(&[0, 1]);
        let err = sm.start(&[0, 1], |_| {}).unwrap_err();
        assert!(matches!(err, GameError::Transition(_)));
    }

    #[test]
    fn can_play_card_requires_the_playing_phase() {
        let mut sm = GameStateMachine::new();
        sm.init_game(&[0, 1], dealer::create_deck());
        assert!(!sm.can_play_card(0));
        assert_eq!(sm.play_card(0), Err(GameError::NotPlaying));
    }

    #[test]
    fn play_card_moves_the_top_card_and_rotates() {
        let mut sm = playing(&[0, 1, 2]);
        let top = *sm.hand(0).last().unwrap();

        let played = sm.play_card(0).unwrap();
        assert_eq!(played, top);
        assert_eq!(sm.pile(0).last(), Some(&top));
        assert_eq!(sm.current_turn(), Some(1));

        sm.play_card(1).unwrap();
        sm.play_card(2).unwrap();
        assert_eq!(sm.current_turn(), Some(0));
        assert_eq!(sm.total_cards(), DECK_SIZE);
    }

    #[test]
    fn out_of_turn_play_changes_nothing() {
        let mut sm = playing(&[0, 1]);
        let before = sm.clone();

        assert_eq!(sm.play_card(1), Err(GameError::NotYourTurn(1)));
        assert_eq!(sm.hand(1), before.hand(1));
        assert_eq!(sm.pile(1), before.pile(1));
        assert_eq!(sm.current_turn(), Some(0));
    }

    #[test]
    fn empty_hand_cannot_play() {
        let mut sm = playing(&[0, 1]);
        sm.arrange(vec![(0, vec![]), (1, vec![])], vec![(0, vec![]), (1, vec![])]);
        assert_eq!(sm.play_card(0), Err(GameError::EmptyHand(0)));
    }

    #[test]
    fn pattern_counts_only_top_cards() {
        let mut sm = playing(&[0, 1]);
        sm.arrange(
            vec![(0, vec![]), (1, vec![])],
            vec![
                (
                    0,
                    vec![card(0, Symbol::Rose, 5), card(1, Symbol::Rose, 3)],
                ),
                (1, vec![]),
            ],
        );

        let totals = sm.evaluate_pattern();
        assert_eq!(totals.get(Symbol::Rose), 3);
        assert_eq!(totals.get(Symbol::Daisy), 0);
    }

    #[test]
    fn winning_total_must_be_exactly_five() {
        let mut sm = playing(&[0, 1]);
        sm.arrange(
            vec![],
            vec![
                (0, vec![card(0, Symbol::Sunflower, 3)]),
                (1, vec![card(1, Symbol::Sunflower, 2)]),
            ],
        );
        assert!(sm.has_winning_total());

        sm.arrange(
            vec![],
            vec![
                (0, vec![card(0, Symbol::Sunflower, 4)]),
                (1, vec![card(1, Symbol::Sunflower, 2)]),
            ],
        );
        assert_eq!(sm.evaluate_pattern().get(Symbol::Sunflower), 6);
        assert!(!sm.has_winning_total());
    }

    #[test]
    fn different_symbols_do_not_add_up() {
        let mut sm = playing(&[0, 1]);
        sm.arrange(
            vec![],
            vec![
                (0, vec![card(0, Symbol::Rose, 3)]),
                (1, vec![card(1, Symbol::Daisy, 2)]),
            ],
        );
        assert!(!sm.has_winning_total());
    }

    #[test]
    fn successful_bell_collects_every_pile_under_the_hand() {
        let mut sm = playing(&[0, 1, 2]);
        let own = vec![card(10, Symbol::Daisy, 1), card(11, Symbol::Daisy, 2)];
        sm.arrange(
            vec![(0, vec![]), (1, own.clone()), (2, vec![])],
            vec![
                (0, vec![card(1, Symbol::Rose, 4), card(2, Symbol::Rose, 3)]),
                (1, vec![card(3, Symbol::Rose, 2)]),
                (2, vec![card(4, Symbol::Carnation, 1)]),
            ],
        );

        let outcome = sm.ring_bell(1).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.pattern_totals.get(Symbol::Rose), 5);

        let collected = outcome.collected_cards.unwrap();
        let mut ids: Vec<u8> = collected.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        assert!(sm.pile(0).is_empty() && sm.pile(1).is_empty() && sm.pile(2).is_empty());
        assert_eq!(sm.hand(1).len(), 6);
        assert_eq!(&sm.hand(1)[4..], own.as_slice());
        assert_eq!(sm.current_turn(), Some(1));
        assert!(outcome.penalty_cards.is_none());
    }

    #[test]
    fn failed_bell_pays_each_active_opponent_from_the_top() {
        let mut sm = playing(&[0, 1, 2]);
        let a = card(1, Symbol::Rose, 1);
        let b = card(2, Symbol::Rose, 2);
        let c = card(3, Symbol::Rose, 3);
        sm.arrange(
            vec![
                (0, vec![a, b, c]),
                (1, vec![card(20, Symbol::Daisy, 1)]),
                (2, vec![card(21, Symbol::Daisy, 1)]),
            ],
            vec![(0, vec![card(30, Symbol::Rose, 4)])],
        );

        let outcome = sm.ring_bell(0).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.penalty_cards, Some(vec![(1, c), (2, b)]));
        assert_eq!(sm.hand(0), &[a]);
        assert_eq!(sm.hand(1)[0], c);
        assert_eq!(sm.hand(2)[0], b);
        assert_eq!(outcome.eliminated, None);
        assert_eq!(sm.current_turn(), Some(0));
    }

    #[test]
    fn paying_the_last_card_eliminates_and_moves_the_turn() {
        let mut sm = playing(&[0, 1, 2]);
        sm.arrange(
            vec![
                (0, vec![]),
                (1, vec![card(1, Symbol::Rose, 1)]),
                (2, vec![card(2, Symbol::Rose, 1)]),
            ],
            vec![],
        );
        sm.current_turn = Some(1);

        let outcome = sm.ring_bell(1).unwrap();
        assert_eq!(outcome.eliminated, Some(1));
        assert_eq!(sm.active_players(), &[0, 2]);
        assert_eq!(sm.current_turn(), Some(2));
        assert!(!sm.is_game_over());
    }

    #[test]
    fn eliminating_the_last_seat_clamps_the_turn() {
        let mut sm = playing(&[0, 1, 2]);
        sm.arrange(
            vec![
                (0, vec![card(1, Symbol::Rose, 1)]),
                (1, vec![card(2, Symbol::Rose, 1)]),
                (2, vec![card(3, Symbol::Rose, 1)]),
            ],
            vec![],
        );
        sm.current_turn = Some(2);

        let outcome = sm.apply_penalty(2).unwrap();
        assert_eq!(outcome.eliminated, Some(2));
        assert_eq!(sm.current_turn(), Some(1));
    }

    #[test]
    fn rotation_skips_eliminated_players() {
        let mut sm = playing(&[0, 1, 2]);
        sm.arrange(
            vec![
                (0, vec![card(1, Symbol::Rose, 1), card(2, Symbol::Rose, 1)]),
                (1, vec![card(3, Symbol::Rose, 1)]),
                (2, vec![card(4, Symbol::Rose, 1), card(5, Symbol::Rose, 1)]),
            ],
            vec![],
        );

        // Player 1 holds one card and pays it to player 0 before running dry.
        sm.ring_bell(1).unwrap();
        sm.release_bell();
        assert_eq!(sm.active_players(), &[0, 2]);

        sm.play_card(0).unwrap();
        assert_eq!(sm.current_turn(), Some(2));
        sm.play_card(2).unwrap();
        assert_eq!(sm.current_turn(), Some(0));
    }

    #[test]
    fn game_over_only_when_one_player_remains() {
        let mut sm = playing(&[0, 1, 2]);
        sm.arrange(
            vec![
                (0, vec![card(1, Symbol::Rose, 1)]),
                (1, vec![]),
                (2, vec![card(2, Symbol::Rose, 1), card(3, Symbol::Rose, 1)]),
            ],
            vec![],
        );

        // Player 0 pays its only card to player 1, who then pays it on to player 2.
        let first = sm.apply_penalty(0).unwrap();
        sm.release_bell();
        assert_eq!(first.eliminated, Some(0));
        assert_eq!(first.winner, None);
        assert!(!sm.is_game_over());

        let second = sm.apply_penalty(1).unwrap();
        assert_eq!(second.eliminated, Some(1));
        assert_eq!(second.winner, Some(2));
        assert!(sm.is_game_over());
        assert_eq!(sm.winner(), Some(2));
        assert_eq!(sm.phase(), GamePhase::Finished);
    }

    #[test]
    fn second_bell_in_the_same_round_is_a_no_op() {
        let mut sm = playing(&[0, 1]);
        sm.arrange(
            vec![
                (0, vec![card(1, Symbol::Rose, 1), card(2, Symbol::Rose, 1)]),
                (1, vec![card(3, Symbol::Rose, 1)]),
            ],
            vec![(0, vec![card(4, Symbol::Rose, 5)])],
        );

        let first = sm.ring_bell(0).unwrap();
        assert!(first.success);
        let after_first = sm.clone();

        // The turn timer racing the race window for the same round.
        assert_eq!(sm.apply_penalty(1), Err(GameError::BellInFlight));
        assert_eq!(sm.ring_bell(0), Err(GameError::BellInFlight));

        assert_eq!(sm.hand(0), after_first.hand(0));
        assert_eq!(sm.hand(1), after_first.hand(1));
        assert_eq!(sm.current_turn(), after_first.current_turn());
        assert_eq!(sm.total_cards(), after_first.total_cards());
    }

    #[test]
    fn releasing_the_guard_allows_the_next_round() {
        let mut sm = playing(&[0, 1]);
        sm.ring_bell(0).unwrap();
        assert!(sm.is_bell_in_flight());
        sm.release_bell();
        assert!(sm.ring_bell(1).is_ok());
    }

    #[test]
    fn penalty_path_ignores_a_winning_pattern() {
        let mut sm = playing(&[0, 1]);
        sm.arrange(
            vec![
                (0, vec![card(1, Symbol::Rose, 1), card(2, Symbol::Rose, 1)]),
                (1, vec![]),
            ],
            vec![(1, vec![card(3, Symbol::Rose, 5)])],
        );
        assert!(sm.has_winning_total());

        let outcome = sm.apply_penalty(0).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.penalty_cards.map(|paid| paid.len()), Some(1));
        assert_eq!(sm.pile(1).len(), 1);
    }

    #[test]
    fn eliminated_player_cannot_ring() {
        let mut sm = playing(&[0, 1, 2]);
        sm.arrange(
            vec![(0, vec![]), (1, vec![card(1, Symbol::Rose, 1)]), (2, vec![])],
            vec![],
        );
        sm.apply_penalty(0).unwrap();
        sm.release_bell();

        assert_eq!(sm.ring_bell(0), Err(GameError::NotActive(0)));
    }

    #[test]
    fn timeout_advances_past_the_timed_out_player() {
        let mut sm = playing(&[0, 1, 2]);
        sm.apply_penalty(0).unwrap();
        sm.release_bell();
        sm.advance_after_timeout(0);
        assert_eq!(sm.current_turn(), Some(1));
    }

    #[test]
    fn cards_are_conserved_through_plays_and_bells() {
        let mut sm = playing(&[0, 1, 2, 3]);
        for _ in 0..12 {
            let current = sm.current_turn().unwrap();
            sm.play_card(current).unwrap();
            assert_eq!(sm.total_cards(), DECK_SIZE);
        }

        let ringer = sm.current_turn().unwrap();
        sm.ring_bell(ringer).unwrap();
        sm.release_bell();
        assert_eq!(sm.total_cards(), DECK_SIZE);

        sm.apply_penalty(ringer).unwrap();
        assert_eq!(sm.total_cards(), DECK_SIZE);
    }

    #[test]
    fn reset_returns_to_ready_and_clears_the_table() {
        let mut sm = playing(&[0, 1]);
        sm.ring_bell(0).unwrap();
        sm.reset();
        assert_eq!(sm.phase(), GamePhase::Ready);
        assert_eq!(sm.total_cards(), 0);
        assert!(!sm.is_bell_in_flight());
        assert_eq!(sm.current_turn(), None);
        assert!(sm.start(&[0, 1], |_| {}).is_ok());
    }
}
