//! # Uno
//!
//! A turn-based, UNO-like card game played by 3 to 5 players over TCP.
//!
//! Players connect in order and get indices 0..N. On their turn each player
//! receives a text menu with the top card and their hand, then answers with a
//! 1-based card number or `NO_CARD`. Play proceeds until someone empties their
//! hand or is the last one left in the rotation.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, deck, move validation, and the turn state machine
//! - [`table`]: Shared state, per-connection turn workers, and the scheduler
//! - [`net`]: Line protocol, accept loop, and a blocking test client
//! - [`ledger`]: Persistent win counts
//! - [`events`]: Append-only event log
//!
//! ## Example
//!
//! ```
//! use uno::{GameState, Move, entities::Deck};
//!
//! let mut game = GameState::new(3, Deck::seeded(7));
//! assert_eq!(game.seed_turn(), Some(0));
//! let outcome = game.apply(0, Move::NoCard).unwrap();
//! assert_eq!(game.current_turn(), Some(1));
//! assert!(outcome.winner.is_none());
//! ```

/// Append-only game event log.
pub mod events;
pub use events::EventLog;

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    GameError, GameEvent, GameState, Move, TurnOutcome, UserError,
    constants::{self, MAX_PLAYERS, MIN_PLAYERS},
    entities, functional,
};

/// Persistent per-player win counts.
pub mod ledger;
pub use ledger::ScoreLedger;

/// Networking components for the line protocol.
pub mod net;
pub use net::{client::Client, messages, server, utils};

/// Running table concurrency.
pub mod table;
pub use table::{SharedGame, TableConfig};
