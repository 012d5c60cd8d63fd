//! The table every connection worker shares.
//!
//! All reads and writes of [`GameState`] go through one mutex. After every
//! write the table publishes a [`TurnSignal`] on a watch channel, so waiting
//! workers wake exactly when the turn, the game, or their own seat changes
//! instead of polling the lock.

use tokio::sync::{Mutex, watch};

use crate::game::GameState;

/// The parts of the game a waiting worker cares about.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TurnSignal {
    pub current_turn: Option<usize>,
    pub game_over: bool,
    pub active: Vec<bool>,
}

impl TurnSignal {
    fn snapshot(state: &GameState) -> Self {
        Self {
            current_turn: state.current_turn(),
            game_over: state.is_game_over(),
            active: state.players().iter().map(|p| p.is_active()).collect(),
        }
    }

    fn is_active(&self, player: usize) -> bool {
        self.active.get(player).copied().unwrap_or(false)
    }
}

/// Why a waiting worker woke up.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Wake {
    /// The turn is this player's.
    Turn,
    /// This player has been removed from the rotation.
    Eliminated,
    /// The game has ended.
    GameOver,
}

#[derive(Debug)]
pub struct SharedGame {
    state: Mutex<GameState>,
    signal: watch::Sender<TurnSignal>,
}

impl SharedGame {
    pub fn new(state: GameState) -> Self {
        let (signal, _) = watch::channel(TurnSignal::snapshot(&state));
        Self {
            state: Mutex::new(state),
            signal,
        }
    }

    /// Run `f` against the state under the table lock.
    pub async fn read<T>(&self, f: impl FnOnce(&GameState) -> T) -> T {
        let state = self.state.lock().await;
        f(&state)
    }

    /// Mutate the state under the table lock and publish the new turn signal
    /// before releasing it.
    pub async fn update<T>(&self, f: impl FnOnce(&mut GameState) -> T) -> T {
        let mut state = self.state.lock().await;
        let result = f(&mut state);
        let next = TurnSignal::snapshot(&state);
        self.signal.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        result
    }

    pub fn subscribe(&self) -> watch::Receiver<TurnSignal> {
        self.signal.subscribe()
    }

    /// Latest published signal.
    pub fn signal(&self) -> TurnSignal {
        self.signal.borrow().clone()
    }

    /// Block until `player` holds the turn, drops out, or the game ends.
    pub async fn wait_for_turn(&self, signal: &mut watch::Receiver<TurnSignal>, player: usize) -> Wake {
        let woke = signal
            .wait_for(|s| s.game_over || !s.is_active(player) || s.current_turn == Some(player))
            .await
            .map(|s| TurnSignal::clone(&s));

        match woke {
            Ok(s) if !s.is_active(player) => Wake::Eliminated,
            Ok(s) if s.game_over => Wake::GameOver,
            Ok(_) => Wake::Turn,
            // The sender lives as long as the table.
            Err(_) => Wake::GameOver,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::game::{
        Move,
        entities::{Card, Color, Deck},
    };

    fn table() -> Arc<SharedGame> {
        let hands = vec![vec![Card::number(Color::Green, 7); 5]; 3];
        let state = GameState::from_parts(hands, Card::number(Color::Red, 3), Deck::seeded(1));
        Arc::new(SharedGame::new(state))
    }

    #[tokio::test]
    async fn waiter_wakes_when_turn_arrives() {
        let table = table();
        let mut rx = table.subscribe();

        let waiter = {
            let table = table.clone();
            tokio::spawn(async move { table.wait_for_turn(&mut rx, 1).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        table.update(|s| s.seed_turn()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        table
            .update(|s| s.apply(0, Move::NoCard))
            .await
            .unwrap();
        assert_eq!(waiter.await.unwrap(), Wake::Turn);
    }

    #[tokio::test]
    async fn current_holder_does_not_wait() {
        let table = table();
        table.update(|s| s.seed_turn()).await;
        let mut rx = table.subscribe();
        assert_eq!(table.wait_for_turn(&mut rx, 0).await, Wake::Turn);
        // Still the holder after a rejected move.
        let _ = table.update(|s| s.apply(0, Move::Play(42))).await;
        assert_eq!(table.wait_for_turn(&mut rx, 0).await, Wake::Turn);
    }

    #[tokio::test]
    async fn eliminated_and_game_over_wake_waiters() {
        let table = table();
        table.update(|s| s.seed_turn()).await;
        let mut rx1 = table.subscribe();
        let mut rx2 = table.subscribe();

        let w1 = {
            let table = table.clone();
            tokio::spawn(async move { table.wait_for_turn(&mut rx1, 1).await })
        };
        table.update(|s| s.disconnect(1)).await.unwrap();
        assert_eq!(w1.await.unwrap(), Wake::Eliminated);

        let w2 = {
            let table = table.clone();
            tokio::spawn(async move { table.wait_for_turn(&mut rx2, 2).await })
        };
        table.update(|s| s.disconnect(0)).await.unwrap();
        // Player 2 is the last one standing: the game is over, not their turn.
        assert_eq!(w2.await.unwrap(), Wake::GameOver);
        assert!(table.signal().game_over);
        assert_eq!(table.read(|s| s.winner()).await, Some(2));
    }

    #[tokio::test]
    async fn unchanged_state_publishes_nothing() {
        let table = table();
        let mut rx = table.subscribe();
        table.update(|s| s.current_turn()).await;
        assert!(!rx.has_changed().unwrap());
        table.update(|s| s.seed_turn()).await;
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();
        table.update(|s| s.seed_turn()).await;
        assert!(!rx.has_changed().unwrap());
    }
}
