use rand::{Rng, SeedableRng, rngs::StdRng};
use std::fmt;

use super::constants::{DECK_SIZE, MAX_HAND, MAX_NO_PLAY_STREAK};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 4] = [Self::Red, Self::Blue, Self::Green, Self::Yellow];
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Red => "RED",
            Self::Blue => "BLUE",
            Self::Green => "GREEN",
            Self::Yellow => "YELLOW",
        };
        write!(f, "{repr}")
    }
}

/// What a card does when played. Only number cards carry a face value.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Kind {
    Number(u8),
    Skip,
    DrawTwo,
}

impl Kind {
    /// Whether two kinds are the same kind of card, ignoring face values.
    pub fn same_kind(&self, other: &Kind) -> bool {
        matches!(
            (self, other),
            (Self::Number(_), Self::Number(_))
                | (Self::Skip, Self::Skip)
                | (Self::DrawTwo, Self::DrawTwo)
        )
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "NUMBER {n}"),
            Self::Skip => write!(f, "SKIP"),
            Self::DrawTwo => write!(f, "DRAW_TWO"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card {
    pub color: Color,
    pub kind: Kind,
}

impl Card {
    pub const fn new(color: Color, kind: Kind) -> Self {
        Self { color, kind }
    }

    pub const fn number(color: Color, n: u8) -> Self {
        Self::new(color, Kind::Number(n))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind)
    }
}

/// Fills the deck slots the colored faces leave empty.
pub const BLANK_SLOT: Card = Card::number(Color::Red, 0);

/// The canonical 108-card multiset in build order.
///
/// Per color: one 0, two each of 1-9, two SKIP, two DRAW_TWO. That's 92
/// faces; the last 16 slots hold [`BLANK_SLOT`].
pub fn canonical_cards() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for color in Color::ALL {
        cards.push(Card::number(color, 0));
        for n in 1..=9 {
            cards.push(Card::number(color, n));
            cards.push(Card::number(color, n));
        }
        for kind in [Kind::Skip, Kind::Skip, Kind::DrawTwo, Kind::DrawTwo] {
            cards.push(Card::new(color, kind));
        }
    }
    cards.resize(DECK_SIZE, BLANK_SLOT);
    cards
}

/// A regenerating draw pile.
///
/// Played cards never come back. When every card has been drawn, the pile is
/// rebuilt from the canonical multiset and reshuffled in full before the
/// next draw, so `draw` can't run dry.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
    cursor: usize,
    rebuilds: u32,
    rng: StdRng,
}

impl Deck {
    /// A shuffled deck seeded from the operating system.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// A shuffled deck with a reproducible order.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let mut deck = Self {
            cards: Vec::with_capacity(DECK_SIZE),
            cursor: 0,
            rebuilds: 0,
            rng,
        };
        deck.build();
        deck.shuffle();
        deck
    }

    /// Refill with the canonical multiset in build order and rewind the cursor.
    pub fn build(&mut self) {
        self.cards = canonical_cards();
        self.cursor = 0;
    }

    /// Fisher-Yates over the whole pile, drawn cards included.
    pub fn shuffle(&mut self) {
        for i in (1..self.cards.len()).rev() {
            let j = self.rng.random_range(0..=i);
            self.cards.swap(i, j);
        }
    }

    pub fn draw(&mut self) -> Card {
        if self.cursor >= DECK_SIZE {
            log::debug!("Deck exhausted, rebuilding and reshuffling");
            self.build();
            self.shuffle();
            self.rebuilds += 1;
        }
        let card = self.cards[self.cursor];
        self.cursor += 1;
        card
    }

    /// Position of the next undrawn card.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of cards left before the next rebuild.
    pub fn remaining(&self) -> usize {
        DECK_SIZE - self.cursor
    }

    /// How many times the pile has regenerated after running out.
    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a player was removed from the rotation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DisqualifyReason {
    NoPlayStreak,
    HandOverflow,
    Disconnected,
}

impl fmt::Display for DisqualifyReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoPlayStreak => write!(f, "{MAX_NO_PLAY_STREAK} NO_CARD"),
            Self::HandOverflow => write!(f, "{MAX_HAND} CARDS"),
            Self::Disconnected => write!(f, "DISCONNECTED"),
        }
    }
}

/// Everything the table tracks about one seat.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerSlot {
    pub index: usize,
    pub hand: Vec<Card>,
    no_play_streak: u32,
    disqualified: Option<DisqualifyReason>,
}

impl PlayerSlot {
    pub fn new(index: usize, hand: Vec<Card>) -> Self {
        Self {
            index,
            hand,
            no_play_streak: 0,
            disqualified: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.disqualified.is_none()
    }

    pub fn disqualified(&self) -> Option<DisqualifyReason> {
        self.disqualified
    }

    pub fn no_play_streak(&self) -> u32 {
        self.no_play_streak
    }

    pub(crate) fn record_no_play(&mut self) -> u32 {
        self.no_play_streak += 1;
        self.no_play_streak
    }

    pub(crate) fn reset_streak(&mut self) {
        self.no_play_streak = 0;
    }

    /// Disqualification is permanent; the first reason sticks.
    pub(crate) fn disqualify(&mut self, reason: DisqualifyReason) {
        if self.disqualified.is_none() {
            self.disqualified = Some(reason);
        }
    }

    pub fn is_overflowing(&self) -> bool {
        self.hand.len() >= MAX_HAND
    }
}
