//! Deck construction, shuffling and the round-robin deal.

use indexmap::IndexMap;
use rand::seq::SliceRandom;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::PlayerIndex;

/// Number of cards in a complete deck.
pub const DECK_SIZE: usize = 56;

/// `(weight, copies)` for every symbol. Sums to 14 cards per symbol.
const WEIGHT_DISTRIBUTION: [(u8, usize); 5] = [(1, 5), (2, 3), (3, 3), (4, 2), (5, 1)];

/// Symbol printed on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    /// Rose.
    Rose,
    /// Carnation.
    Carnation,
    /// Sunflower.
    Sunflower,
    /// Daisy.
    Daisy,
}

impl Symbol {
    /// Every symbol, in deck construction order.
    pub const ALL: [Symbol; 4] = [
        Symbol::Rose,
        Symbol::Carnation,
        Symbol::Sunflower,
        Symbol::Daisy,
    ];
}

/// A single card. `weight` is the number of symbols printed on it (1 to 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    /// Identifier unique within one deck.
    pub id: u8,
    /// Printed symbol.
    pub symbol: Symbol,
    /// Symbol count.
    pub weight: u8,
}

/// Result of dealing a deck to the active players.
///
/// Both maps hold one entry per active player, in rotation order. Stacks are stored
/// bottom-first: the last element is the top card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deal {
    /// Face-down hands.
    pub hands: IndexMap<PlayerIndex, Vec<Card>>,
    /// Face-up played piles, seeded with the cards that do not divide evenly.
    pub piles: IndexMap<PlayerIndex, Vec<Card>>,
}

/// Build the fixed 56-card deck. No randomness is involved.
pub fn create_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    let mut id = 0u8;

    for symbol in Symbol::ALL {
        for (weight, copies) in WEIGHT_DISTRIBUTION {
            for _ in 0..copies {
                deck.push(Card { id, symbol, weight });
                id += 1;
            }
        }
    }

    deck
}

/// Uniformly permute `deck` in place (Fisher-Yates).
pub fn shuffle(deck: &mut [Card]) {
    deck.shuffle(&mut rand::rng());
}

/// Deal `deck` round-robin: card `i` goes to `active[i % n]`.
///
/// The first `floor(len / n) * n` cards land in hands, the remainder in played piles so the
/// table already shows a pattern before the first turn.
pub fn distribute(active: &[PlayerIndex], deck: Vec<Card>) -> Deal {
    let mut deal = Deal {
        hands: active.iter().map(|&player| (player, Vec::new())).collect(),
        piles: active.iter().map(|&player| (player, Vec::new())).collect(),
    };

    if active.is_empty() {
        return deal;
    }

    let seats = active.len();
    let dealt = (deck.len() / seats) * seats;

    // `dealt` is a multiple of `seats`, so the remainder keeps the same rotation.
    for (position, card) in deck.into_iter().enumerate() {
        let owner = active[position % seats];
        let target = if position < dealt {
            &mut deal.hands
        } else {
            &mut deal.piles
        };
        if let Some(stack) = target.get_mut(&owner) {
            stack.push(card);
        }
    }

    deal
}
