//! Card game engine - rules, entities, and the turn state machine.
//!
//! This module provides the game itself, independent of any networking:
//! - The 108-card deck with regeneration on exhaustion
//! - Move legality and turn rotation helpers
//! - The per-table state machine with card effects, disqualification,
//!   and win detection

pub mod constants;
pub mod entities;
pub mod functional;
pub mod state_machine;

pub use state_machine::{GameError, GameEvent, GameState, Move, TurnOutcome, UserError};
