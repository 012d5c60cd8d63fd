//! Table configuration models.

use std::time::Duration;

use crate::game::constants::{MAX_PLAYERS, MIN_PLAYERS};

/// Default period of the turn scheduler.
pub const DEFAULT_SCHEDULER_INTERVAL: Duration = Duration::from_secs(1);

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Seats at the table (3-5)
    pub players: usize,

    /// How often the scheduler checks for an unassigned turn
    pub scheduler_interval: Duration,
}

impl TableConfig {
    /// Config for `players` seats; out-of-range counts fall back to the minimum.
    pub fn new(players: usize) -> Self {
        Self {
            players: clamp_player_count(players),
            ..Default::default()
        }
    }

    pub fn with_scheduler_interval(mut self, interval: Duration) -> Self {
        self.scheduler_interval = interval;
        self
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            players: MIN_PLAYERS,
            scheduler_interval: DEFAULT_SCHEDULER_INTERVAL,
        }
    }
}

/// Player counts outside 3-5 don't get rounded to the nearest bound; they
/// fall back to the minimum table.
pub fn clamp_player_count(requested: usize) -> usize {
    if (MIN_PLAYERS..=MAX_PLAYERS).contains(&requested) {
        requested
    } else {
        MIN_PLAYERS
    }
}

/// Interpret a typed player count, e.g. from the startup prompt.
pub fn parse_player_count(input: &str) -> usize {
    input
        .trim()
        .parse()
        .map(clamp_player_count)
        .unwrap_or(MIN_PLAYERS)
}
