//! The running table: shared state, per-seat workers, and the scheduler.
//!
//! ## Architecture
//!
//! One [`SharedGame`] holds the [`GameState`](crate::game::GameState) behind a
//! mutex and publishes a [`TurnSignal`] on every change. Each connection runs a
//! [`TurnWorker`] task that sleeps on that signal until it is its seat's turn.
//! A [`Scheduler`] task hands out the opening turn on a fixed interval.

pub mod config;
pub mod scheduler;
pub mod shared;
pub mod worker;

pub use config::TableConfig;
pub use scheduler::Scheduler;
pub use shared::{SharedGame, TurnSignal, Wake};
pub use worker::{Exit, TurnWorker};
