//! Per-connection turn coordinator.
//!
//! Each accepted connection gets one [`TurnWorker`] task that owns the socket
//! for the whole game. The worker steps through a small state machine:
//!
//! ```text
//! WaitTurn -> Present -> AwaitInput -> Apply -> WaitTurn ...
//!     \                      \            \
//!      `----------------------`------------`--> Terminated
//! ```
//!
//! The table lock is only held inside [`SharedGame::read`] and
//! [`SharedGame::update`]; every socket read and write happens outside it.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;

use super::shared::{SharedGame, TurnSignal, Wake};
use crate::{
    events::EventLog,
    game::{GameError, GameEvent, Move, TurnOutcome, UserError, entities::DisqualifyReason},
    ledger::ScoreLedger,
    net::{
        errors::ProtocolError,
        messages::{Notice, render_menu},
        utils,
    },
};

/// How a worker's game ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Exit {
    Won,
    Lost { winner: Option<usize> },
    Disqualified(DisqualifyReason),
    Disconnected,
    /// The table hit an invariant violation.
    Aborted,
}

#[derive(Debug)]
enum Step {
    WaitTurn,
    Present,
    AwaitInput,
    Apply(String),
    Terminated(Exit),
}

pub struct TurnWorker<R, W> {
    player: usize,
    reader: R,
    writer: W,
    table: Arc<SharedGame>,
    ledger: Arc<ScoreLedger>,
    events: EventLog,
}

impl<R, W> TurnWorker<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        player: usize,
        reader: R,
        writer: W,
        table: Arc<SharedGame>,
        ledger: Arc<ScoreLedger>,
        events: EventLog,
    ) -> Self {
        Self {
            player,
            reader,
            writer,
            table,
            ledger,
            events,
        }
    }

    /// Drive this seat until the game ends for it, then close the connection.
    pub async fn run(mut self) -> Exit {
        let mut signal = self.table.subscribe();
        let mut step = Step::WaitTurn;
        loop {
            step = match step {
                Step::WaitTurn => self.wait_turn(&mut signal).await,
                Step::Present => self.present().await,
                Step::AwaitInput => self.await_input().await,
                Step::Apply(line) => self.apply(&line).await,
                Step::Terminated(exit) => {
                    self.terminate(exit).await;
                    return exit;
                }
            };
        }
    }

    async fn wait_turn(&self, signal: &mut watch::Receiver<TurnSignal>) -> Step {
        let player = self.player;
        match self.table.wait_for_turn(signal, player).await {
            Wake::Turn => Step::Present,
            Wake::Eliminated => {
                let reason = self
                    .table
                    .read(|s| s.player(player).and_then(|p| p.disqualified()))
                    .await;
                Step::Terminated(reason.map_or(Exit::Aborted, Exit::Disqualified))
            }
            Wake::GameOver => {
                let winner = self.table.read(|s| s.winner()).await;
                if winner == Some(player) {
                    Step::Terminated(Exit::Won)
                } else {
                    Step::Terminated(Exit::Lost { winner })
                }
            }
        }
    }

    async fn present(&mut self) -> Step {
        let player = self.player;
        let menu = self
            .table
            .read(|s| {
                if s.is_game_over() || s.current_turn() != Some(player) {
                    None
                } else {
                    render_menu(s, player)
                }
            })
            .await;
        let Some(menu) = menu else {
            return Step::WaitTurn;
        };

        self.events.record(GameEvent::Turn(player));
        if let Err(e) = utils::write_message(&mut self.writer, &menu).await {
            log::warn!("Player {player}: failed to send menu: {e}");
            return self.disconnect().await;
        }
        Step::AwaitInput
    }

    async fn await_input(&mut self) -> Step {
        match utils::read_line(&mut self.reader).await {
            Ok(Some(line)) => Step::Apply(line),
            Ok(None) => {
                log::info!("Player {} closed the connection", self.player);
                self.disconnect().await
            }
            Err(ProtocolError::LineTooLong { max }) => {
                log::debug!("Player {} sent a line over {max} bytes", self.player);
                self.reject(UserError::InvalidCardNumber).await
            }
            Err(ProtocolError::Io(e)) => {
                log::warn!("Player {}: read failed: {e}", self.player);
                self.disconnect().await
            }
        }
    }

    async fn apply(&mut self, line: &str) -> Step {
        let player = self.player;
        let mv = match line.parse::<Move>() {
            Ok(mv) => mv,
            Err(e) => return self.reject(e).await,
        };

        match self.table.update(|s| s.apply(player, mv)).await {
            Ok(outcome) => {
                self.publish(outcome).await;
                Step::WaitTurn
            }
            Err(GameError::User(e)) => self.reject(e).await,
            Err(e @ GameError::NoEligiblePlayer) => {
                log::error!("Player {player}: {e}");
                Step::Terminated(Exit::Aborted)
            }
        }
    }

    /// Answer a rejected move. The turn stays put, so waiting again
    /// re-presents the menu straight away.
    async fn reject(&mut self, error: UserError) -> Step {
        log::debug!("Player {} move rejected: {error}", self.player);
        if let Some(notice) = Notice::for_rejection(&error) {
            if let Err(e) = self.send_notice(notice).await {
                log::warn!("Player {}: failed to send notice: {e}", self.player);
                return self.disconnect().await;
            }
        }
        Step::WaitTurn
    }

    async fn disconnect(&mut self) -> Step {
        let player = self.player;
        match self.table.update(|s| s.disconnect(player)).await {
            Ok(outcome) => self.publish(outcome).await,
            Err(e) => log::error!("Player {player}: {e}"),
        }
        Step::Terminated(Exit::Disconnected)
    }

    /// Log the transition's events and persist a decided game. Runs after
    /// the table lock is released.
    async fn publish(&self, outcome: TurnOutcome) {
        self.events.record_all(outcome.events);
        if let Some(winner) = outcome.winner {
            match self.ledger.record_win(winner).await {
                Ok(total) => log::info!("Player {winner} now has {total} win(s)"),
                Err(e) => log::error!("Failed to record win for player {winner}: {e}"),
            }
        }
    }

    async fn send_notice(&mut self, notice: Notice) -> std::io::Result<()> {
        utils::write_line(&mut self.writer, &notice.to_string()).await
    }

    async fn terminate(&mut self, exit: Exit) {
        let notice = match exit {
            Exit::Won => Some(Notice::Win),
            Exit::Lost { winner } => Some(Notice::GameOver { winner }),
            Exit::Disqualified(reason) => Some(Notice::Disqualified(reason)),
            Exit::Aborted => Some(Notice::GameOver { winner: None }),
            Exit::Disconnected => None,
        };
        if let Some(notice) = notice {
            if let Err(e) = self.send_notice(notice).await {
                log::debug!("Player {}: final notice not delivered: {e}", self.player);
            }
        }
        if let Err(e) = self.writer.shutdown().await {
            log::debug!("Player {}: shutdown failed: {e}", self.player);
        }
        log::info!("Player {} done: {exit:?}", self.player);
    }
}
