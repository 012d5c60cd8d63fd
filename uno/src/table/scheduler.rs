//! Background task that hands out the opening turn.

use std::{sync::Arc, time::Duration};

use tokio::time::{MissedTickBehavior, interval};

use super::shared::SharedGame;

pub struct Scheduler {
    table: Arc<SharedGame>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(table: Arc<SharedGame>, interval: Duration) -> Self {
        Self { table, interval }
    }

    /// Seed the turn if nobody holds it. Never overrides an assigned turn.
    pub async fn tick(&self) -> Option<usize> {
        self.table.update(|state| state.seed_turn()).await
    }

    /// Tick on the configured interval until the game ends.
    pub async fn run(self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Some(player) = self.tick().await {
                log::info!("Scheduler seeded the first turn: player {player}");
            }
            if self.table.read(|state| state.is_game_over()).await {
                break;
            }
        }
        log::debug!("Scheduler stopped");
    }
}
