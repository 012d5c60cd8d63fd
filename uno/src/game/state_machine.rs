//! Turn state machine for a single table.
//!
//! [`GameState`] is the one record every connection worker mutates. It knows
//! nothing about locks or sockets: callers hold the table lock, call
//! [`GameState::apply`], and act on the returned [`TurnOutcome`] after
//! releasing it.

use std::{fmt, str::FromStr};
use thiserror::Error;

use super::{
    constants::{HAND_SIZE, MAX_NO_PLAY_STREAK, MAX_PLAYERS, MIN_PLAYERS},
    entities::{Card, Deck, DisqualifyReason, Kind, PlayerSlot},
    functional::{active_count, is_legal, next_active},
};

/// Errors that send a player back to choose again
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum UserError {
    #[error("invalid card number")]
    InvalidCardNumber,
    #[error("card does not match color/type/number")]
    InvalidMove,
    #[error("not your turn")]
    NotYourTurn,
    #[error("player is not in the game")]
    PlayerInactive,
    #[error("game is over")]
    GameOver,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error("invalid game state: no eligible player left in rotation")]
    NoEligiblePlayer,
}

/// What a player submitted for their turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Move {
    NoCard,
    /// 1-based position in the player's hand.
    Play(usize),
}

impl FromStr for Move {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "NO_CARD" {
            return Ok(Self::NoCard);
        }
        match s.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Self::Play(n)),
            _ => Err(UserError::InvalidCardNumber),
        }
    }
}

/// Events that occur during gameplay
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GameEvent {
    InitialTopCard(Card),
    Connected(usize),
    Turn(usize),
    NoCard(usize),
    Played(usize, Card),
    Skipped(usize),
    DrewTwo(usize),
    Disqualified(usize, DisqualifyReason),
    Won(usize),
    GameOver,
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitialTopCard(card) => write!(f, "INITIAL TOP CARD {card}"),
            Self::Connected(idx) => write!(f, "PLAYER {idx} CONNECTED"),
            Self::Turn(idx) => write!(f, "PLAYER {idx} TURN"),
            Self::NoCard(idx) => write!(f, "PLAYER {idx} NO_CARD"),
            Self::Played(idx, card) => write!(f, "PLAYER {idx} PLAYED {card}"),
            Self::Skipped(idx) => write!(f, "PLAYER {idx} SKIPPED"),
            Self::DrewTwo(idx) => write!(f, "PLAYER {idx} DRAWS 2"),
            Self::Disqualified(idx, reason) => {
                write!(f, "PLAYER {idx} DISQUALIFIED ({reason})")
            }
            Self::Won(idx) => write!(f, "PLAYER {idx} WINS THE GAME"),
            Self::GameOver => write!(f, "GAME OVER"),
        }
    }
}

/// Side effects of one transition, for the caller to publish once the table
/// lock is released.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct TurnOutcome {
    pub events: Vec<GameEvent>,
    /// Set when this transition decided the game.
    pub winner: Option<usize>,
}

#[derive(Debug)]
pub struct GameState {
    players: Vec<PlayerSlot>,
    current_turn: Option<usize>,
    game_over: bool,
    winner: Option<usize>,
    top_card: Card,
    deck: Deck,
    scores: Vec<u32>,
}

impl GameState {
    /// Deal a fresh game: `HAND_SIZE` cards each, then turn up cards until a
    /// number card shows.
    pub fn new(num_players: usize, mut deck: Deck) -> Self {
        let num_players = if (MIN_PLAYERS..=MAX_PLAYERS).contains(&num_players) {
            num_players
        } else {
            MIN_PLAYERS
        };
        let hands = (0..num_players)
            .map(|_| (0..HAND_SIZE).map(|_| deck.draw()).collect())
            .collect();
        let top_card = loop {
            let card = deck.draw();
            if card.kind.is_number() {
                break card;
            }
        };
        Self::from_parts(hands, top_card, deck)
    }

    /// Seat players with exact hands. Nobody holds the turn yet.
    pub fn from_parts(hands: Vec<Vec<Card>>, top_card: Card, deck: Deck) -> Self {
        let players: Vec<PlayerSlot> = hands
            .into_iter()
            .enumerate()
            .map(|(idx, hand)| PlayerSlot::new(idx, hand))
            .collect();
        let scores = vec![0; players.len()];
        Self {
            players,
            current_turn: None,
            game_over: false,
            winner: None,
            top_card,
            deck,
            scores,
        }
    }

    /// Carry cumulative win counts in from the ledger.
    pub fn with_scores(mut self, scores: &[u32]) -> Self {
        for (slot, count) in self.scores.iter_mut().zip(scores) {
            *slot = *count;
        }
        self
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    pub fn players(&self) -> &[PlayerSlot] {
        &self.players
    }

    pub fn player(&self, idx: usize) -> Option<&PlayerSlot> {
        self.players.get(idx)
    }

    pub fn current_turn(&self) -> Option<usize> {
        self.current_turn
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    pub fn top_card(&self) -> Card {
        self.top_card
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    pub fn is_active(&self, idx: usize) -> bool {
        self.players.get(idx).is_some_and(PlayerSlot::is_active)
    }

    pub fn next_active(&self, from: usize) -> Option<usize> {
        next_active(&self.players, from)
    }

    /// Hand the first turn to the first active seat from slot 0. Does
    /// nothing once a turn has been assigned or the game has ended.
    pub fn seed_turn(&mut self) -> Option<usize> {
        if self.game_over || self.current_turn.is_some() {
            return None;
        }
        let first = self.players.iter().position(PlayerSlot::is_active)?;
        self.current_turn = Some(first);
        Some(first)
    }

    /// Apply one submitted move for `player`.
    ///
    /// Rejections leave the state untouched and the turn with `player`.
    pub fn apply(&mut self, player: usize, mv: Move) -> Result<TurnOutcome, GameError> {
        self.check_turn(player)?;
        match mv {
            Move::NoCard => self.no_card(player),
            Move::Play(choice) => self.play(player, choice),
        }
    }

    /// Remove a player whose connection dropped.
    pub fn disconnect(&mut self, player: usize) -> Result<TurnOutcome, GameError> {
        let mut outcome = TurnOutcome::default();
        if self.game_over || !self.is_active(player) {
            return Ok(outcome);
        }
        self.disqualify(player, DisqualifyReason::Disconnected, &mut outcome);
        self.repair_turn()?;
        self.evaluate_winner(&mut outcome);
        Ok(outcome)
    }

    fn check_turn(&self, player: usize) -> Result<(), UserError> {
        if self.game_over {
            return Err(UserError::GameOver);
        }
        if !self.is_active(player) {
            return Err(UserError::PlayerInactive);
        }
        if self.current_turn != Some(player) {
            return Err(UserError::NotYourTurn);
        }
        Ok(())
    }

    fn no_card(&mut self, player: usize) -> Result<TurnOutcome, GameError> {
        let mut outcome = TurnOutcome {
            events: vec![GameEvent::NoCard(player)],
            ..Default::default()
        };
        let card = self.deck.draw();
        let slot = &mut self.players[player];
        let streak = slot.record_no_play();
        slot.hand.push(card);

        if streak >= MAX_NO_PLAY_STREAK {
            self.disqualify(player, DisqualifyReason::NoPlayStreak, &mut outcome);
        } else if slot.is_overflowing() {
            self.disqualify(player, DisqualifyReason::HandOverflow, &mut outcome);
        }

        self.advance_from(player)?;
        self.evaluate_winner(&mut outcome);
        Ok(outcome)
    }

    fn play(&mut self, player: usize, choice: usize) -> Result<TurnOutcome, GameError> {
        let hand = &self.players[player].hand;
        let Some(&card) = choice.checked_sub(1).and_then(|idx| hand.get(idx)) else {
            return Err(UserError::InvalidCardNumber.into());
        };
        if !is_legal(&card, &self.top_card) {
            return Err(UserError::InvalidMove.into());
        }

        let mut outcome = TurnOutcome {
            events: vec![GameEvent::Played(player, card)],
            ..Default::default()
        };
        let slot = &mut self.players[player];
        slot.hand.remove(choice - 1);
        slot.reset_streak();
        self.top_card = card;

        if slot.hand.is_empty() {
            self.declare_winner(player, &mut outcome);
            return Ok(outcome);
        }

        match card.kind {
            Kind::Skip => {
                let skipped = self.next_from(player)?;
                outcome.events.push(GameEvent::Skipped(skipped));
                self.advance_from(skipped)?;
            }
            Kind::DrawTwo => {
                let victim = self.next_from(player)?;
                let drawn = [self.deck.draw(), self.deck.draw()];
                self.players[victim].hand.extend(drawn);
                outcome.events.push(GameEvent::DrewTwo(victim));
                self.advance_from(victim)?;
                if self.players[victim].is_overflowing() {
                    self.disqualify(victim, DisqualifyReason::HandOverflow, &mut outcome);
                }
            }
            Kind::Number(_) => self.advance_from(player)?,
        }

        if self.players[player].is_overflowing() {
            self.disqualify(player, DisqualifyReason::HandOverflow, &mut outcome);
        }
        self.repair_turn()?;
        self.evaluate_winner(&mut outcome);
        Ok(outcome)
    }

    fn next_from(&self, from: usize) -> Result<usize, GameError> {
        self.next_active(from).ok_or(GameError::NoEligiblePlayer)
    }

    fn advance_from(&mut self, from: usize) -> Result<(), GameError> {
        match self.next_active(from) {
            Some(next) => {
                self.current_turn = Some(next);
                Ok(())
            }
            None => {
                self.current_turn = None;
                self.game_over = true;
                Err(GameError::NoEligiblePlayer)
            }
        }
    }

    /// Move the turn off a seat that just dropped out of the rotation.
    fn repair_turn(&mut self) -> Result<(), GameError> {
        match self.current_turn {
            Some(turn) if !self.players[turn].is_active() => self.advance_from(turn),
            _ => Ok(()),
        }
    }

    fn disqualify(&mut self, player: usize, reason: DisqualifyReason, outcome: &mut TurnOutcome) {
        self.players[player].disqualify(reason);
        outcome.events.push(GameEvent::Disqualified(player, reason));
    }

    /// Last player standing wins.
    fn evaluate_winner(&mut self, outcome: &mut TurnOutcome) {
        if self.game_over {
            return;
        }
        match active_count(&self.players) {
            0 => {
                self.game_over = true;
                self.current_turn = None;
                outcome.events.push(GameEvent::GameOver);
            }
            1 => {
                if let Some(last) = self.players.iter().position(PlayerSlot::is_active) {
                    self.declare_winner(last, outcome);
                }
            }
            _ => {}
        }
    }

    fn declare_winner(&mut self, player: usize, outcome: &mut TurnOutcome) {
        self.game_over = true;
        self.winner = Some(player);
        self.scores[player] += 1;
        outcome.winner = Some(player);
        outcome.events.push(GameEvent::Won(player));
    }

    #[cfg(test)]
    pub(crate) fn set_turn(&mut self, turn: Option<usize>) {
        self.current_turn = turn;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        constants::MAX_HAND,
        entities::{Color, Kind},
    };

    const RED_3: Card = Card::number(Color::Red, 3);

    fn filler(n: usize) -> Vec<Card> {
        vec![Card::number(Color::Green, 7); n]
    }

    fn game(hands: Vec<Vec<Card>>, top: Card) -> GameState {
        let mut state = GameState::from_parts(hands, top, Deck::seeded(1));
        state.seed_turn();
        state
    }

    #[test]
    fn move_parsing() {
        assert_eq!("NO_CARD".parse::<Move>(), Ok(Move::NoCard));
        assert_eq!(" 3 \r".parse::<Move>(), Ok(Move::Play(3)));
        assert_eq!("0".parse::<Move>(), Err(UserError::InvalidCardNumber));
        assert_eq!("-1".parse::<Move>(), Err(UserError::InvalidCardNumber));
        assert_eq!("abc".parse::<Move>(), Err(UserError::InvalidCardNumber));
        assert_eq!("no_card".parse::<Move>(), Err(UserError::InvalidCardNumber));
    }

    #[test]
    fn new_game_deals_and_turns_up_a_number() {
        for seed in 0..50 {
            let state = GameState::new(4, Deck::seeded(seed));
            assert_eq!(state.num_players(), 4);
            assert!(state.players().iter().all(|p| p.hand.len() == HAND_SIZE));
            assert!(state.top_card().kind.is_number());
            assert_eq!(state.current_turn(), None);
            assert!(!state.is_game_over());
        }
    }

    #[test]
    fn out_of_range_player_count_seats_three() {
        assert_eq!(GameState::new(9, Deck::seeded(1)).num_players(), MIN_PLAYERS);
        assert_eq!(GameState::new(1, Deck::seeded(1)).num_players(), MIN_PLAYERS);
    }

    #[test]
    fn seed_turn_is_idempotent() {
        let mut state = GameState::from_parts(vec![filler(5); 3], RED_3, Deck::seeded(1));
        assert_eq!(state.seed_turn(), Some(0));
        state.set_turn(Some(2));
        assert_eq!(state.seed_turn(), None);
        assert_eq!(state.current_turn(), Some(2));
    }

    #[test]
    fn seed_turn_skips_inactive_leading_seats() {
        let mut state = GameState::from_parts(vec![filler(5); 3], RED_3, Deck::seeded(1));
        state.players[0].disqualify(DisqualifyReason::Disconnected);
        assert_eq!(state.seed_turn(), Some(1));
    }

    #[test]
    fn number_card_passes_to_next_player() {
        let mut state = game(vec![filler(5), filler(5), filler(5)], RED_3);
        state.players[0].hand[0] = Card::number(Color::Red, 8);
        let outcome = state.apply(0, Move::Play(1)).unwrap();
        assert_eq!(state.current_turn(), Some(1));
        assert_eq!(state.top_card(), Card::number(Color::Red, 8));
        assert_eq!(state.players[0].hand.len(), 4);
        assert_eq!(outcome.winner, None);
    }

    #[test]
    fn skip_jumps_over_next_player() {
        let mut hand = filler(4);
        hand.insert(0, Card::new(Color::Red, Kind::Skip));
        let mut state = game(vec![hand, filler(5), filler(5)], RED_3);

        let outcome = state.apply(0, Move::Play(1)).unwrap();
        assert_eq!(state.current_turn(), Some(2));
        assert!(outcome.events.contains(&GameEvent::Skipped(1)));
    }

    #[test]
    fn skip_with_two_players_left_returns_the_turn() {
        let mut hand = filler(4);
        hand.insert(0, Card::new(Color::Red, Kind::Skip));
        let mut state = game(vec![hand, filler(5), filler(5)], RED_3);
        state.players[2].disqualify(DisqualifyReason::Disconnected);

        state.apply(0, Move::Play(1)).unwrap();
        assert_eq!(state.current_turn(), Some(0));
    }

    #[test]
    fn draw_two_feeds_next_player_and_skips_them() {
        let mut hand = filler(4);
        hand.insert(0, Card::new(Color::Red, Kind::DrawTwo));
        let mut state = game(vec![hand, filler(5), filler(5)], RED_3);

        let outcome = state.apply(0, Move::Play(1)).unwrap();
        assert_eq!(state.players[1].hand.len(), 7);
        assert_eq!(state.players[2].hand.len(), 5);
        assert_eq!(state.current_turn(), Some(2));
        assert!(outcome.events.contains(&GameEvent::DrewTwo(1)));
    }

    #[test]
    fn draw_two_overflow_disqualifies_the_victim() {
        let mut hand = filler(4);
        hand.insert(0, Card::new(Color::Red, Kind::DrawTwo));
        let mut state = game(vec![hand, filler(MAX_HAND - 2), filler(5)], RED_3);

        let outcome = state.apply(0, Move::Play(1)).unwrap();
        assert!(!state.is_active(1));
        assert_eq!(
            state.players[1].disqualified(),
            Some(DisqualifyReason::HandOverflow)
        );
        assert!(
            outcome
                .events
                .contains(&GameEvent::Disqualified(1, DisqualifyReason::HandOverflow))
        );
        assert_eq!(state.current_turn(), Some(2));
        assert!(!state.is_game_over());
    }

    #[test]
    fn draw_two_overflow_with_two_players_ends_the_game() {
        let mut hand = filler(4);
        hand.insert(0, Card::new(Color::Red, Kind::DrawTwo));
        let mut state = game(vec![hand, filler(MAX_HAND - 2), filler(5)], RED_3);
        state.players[2].disqualify(DisqualifyReason::Disconnected);

        let outcome = state.apply(0, Move::Play(1)).unwrap();
        assert!(state.is_game_over());
        assert_eq!(outcome.winner, Some(0));
        assert_eq!(state.scores(), &[1, 0, 0]);
    }

    #[test]
    fn three_no_cards_disqualify() {
        let mut state = game(vec![filler(5), filler(5), filler(5)], RED_3);
        state.set_turn(Some(1));

        for player in [1, 2, 0, 1, 2, 0, 1] {
            assert_eq!(state.current_turn(), Some(player));
            state.apply(player, Move::NoCard).unwrap();
        }

        let p1 = &state.players[1];
        assert!(!p1.is_active());
        assert_eq!(p1.disqualified(), Some(DisqualifyReason::NoPlayStreak));
        assert_eq!(p1.hand.len(), 8);
        assert_eq!(state.current_turn(), Some(2));
        assert_eq!(
            state.apply(1, Move::NoCard),
            Err(GameError::User(UserError::PlayerInactive))
        );
    }

    #[test]
    fn no_card_draws_and_passes() {
        let mut state = game(vec![filler(5), filler(5), filler(5)], RED_3);
        let outcome = state.apply(0, Move::NoCard).unwrap();
        assert_eq!(state.players[0].hand.len(), 6);
        assert_eq!(state.players[0].no_play_streak(), 1);
        assert_eq!(state.current_turn(), Some(1));
        assert_eq!(outcome.events, vec![GameEvent::NoCard(0)]);
    }

    #[test]
    fn no_card_overflow_disqualifies() {
        let mut state = game(vec![filler(MAX_HAND - 1), filler(5), filler(5)], RED_3);
        state.apply(0, Move::NoCard).unwrap();
        assert_eq!(
            state.players[0].disqualified(),
            Some(DisqualifyReason::HandOverflow)
        );
        assert_eq!(state.current_turn(), Some(1));
    }

    #[test]
    fn successful_play_resets_streak() {
        let mut state = game(vec![filler(5), filler(5), filler(5)], RED_3);
        state.players[0].hand.push(Card::number(Color::Red, 1));
        state.apply(0, Move::NoCard).unwrap();
        state.set_turn(Some(0));
        assert_eq!(state.players[0].no_play_streak(), 1);
        // The drawn card sits last; the red 1 is at position 6.
        state.apply(0, Move::Play(6)).unwrap();
        assert_eq!(state.players[0].no_play_streak(), 0);
    }

    #[test]
    fn emptying_the_hand_wins() {
        let mut state = game(
            vec![vec![Card::number(Color::Red, 5)], filler(5), filler(5)],
            RED_3,
        )
        .with_scores(&[2, 4, 1]);

        let outcome = state.apply(0, Move::Play(1)).unwrap();
        assert!(state.is_game_over());
        assert_eq!(state.winner(), Some(0));
        assert_eq!(outcome.winner, Some(0));
        assert_eq!(state.scores(), &[3, 4, 1]);
        assert_eq!(
            state.apply(1, Move::NoCard),
            Err(GameError::User(UserError::GameOver))
        );
    }

    #[test]
    fn rejected_moves_keep_the_turn() {
        let mut state = game(vec![filler(5), filler(5), filler(5)], RED_3);
        state.players[0].hand[0] = Card::new(Color::Blue, Kind::Skip);
        let before = state.players[0].hand.clone();

        assert_eq!(
            state.apply(0, Move::Play(9)),
            Err(GameError::User(UserError::InvalidCardNumber))
        );
        assert_eq!(
            state.apply(0, Move::Play(1)),
            Err(GameError::User(UserError::InvalidMove))
        );
        assert_eq!(state.current_turn(), Some(0));
        assert_eq!(state.players[0].hand, before);
        assert_eq!(state.top_card(), RED_3);
    }

    #[test]
    fn out_of_turn_moves_are_rejected() {
        let mut state = game(vec![filler(5), filler(5), filler(5)], RED_3);
        assert_eq!(
            state.apply(2, Move::NoCard),
            Err(GameError::User(UserError::NotYourTurn))
        );
    }

    #[test]
    fn disconnect_on_turn_moves_the_turn() {
        let mut state = game(vec![filler(5), filler(5), filler(5)], RED_3);
        let outcome = state.disconnect(0).unwrap();
        assert!(!state.is_active(0));
        assert_eq!(state.current_turn(), Some(1));
        assert_eq!(
            outcome.events,
            vec![GameEvent::Disqualified(0, DisqualifyReason::Disconnected)]
        );
    }

    #[test]
    fn disconnects_leave_a_last_player_standing() {
        let mut state = game(vec![filler(5), filler(5), filler(5)], RED_3);
        state.disconnect(1).unwrap();
        assert_eq!(state.current_turn(), Some(0));
        let outcome = state.disconnect(0).unwrap();
        assert_eq!(outcome.winner, Some(2));
        assert!(state.is_game_over());
        assert_eq!(state.scores(), &[0, 0, 1]);

        // Nothing changes once the game is decided.
        assert_eq!(state.disconnect(2).unwrap(), TurnOutcome::default());
        assert!(state.is_active(2));
    }

    #[test]
    fn event_lines() {
        assert_eq!(GameEvent::NoCard(1).to_string(), "PLAYER 1 NO_CARD");
        assert_eq!(
            GameEvent::Played(0, RED_3).to_string(),
            "PLAYER 0 PLAYED RED NUMBER 3"
        );
        assert_eq!(
            GameEvent::Disqualified(2, DisqualifyReason::NoPlayStreak).to_string(),
            "PLAYER 2 DISQUALIFIED (3 NO_CARD)"
        );
        assert_eq!(GameEvent::Won(2).to_string(), "PLAYER 2 WINS THE GAME");
    }
}
