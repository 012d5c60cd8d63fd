//! Accept loop and worker supervision.

use std::sync::Arc;

use tokio::{
    io::{self, BufReader},
    net::TcpListener,
    task::JoinSet,
};

use crate::{
    events::EventLog,
    game::{GameEvent, GameState},
    ledger::ScoreLedger,
    table::{Exit, Scheduler, SharedGame, TableConfig, TurnWorker},
};

/// How the table ended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameSummary {
    pub winner: Option<usize>,
    pub scores: Vec<u32>,
    /// Final exit of each seat, by index.
    pub exits: Vec<Option<Exit>>,
}

/// Host one game on `listener`.
///
/// Accepts exactly `config.players` connections in order, assigning indices
/// 0..N. Gameplay starts once every seat is filled. Returns after every worker
/// has finished.
///
/// # Errors
///
/// Returns an error if accepting a connection fails.
pub async fn run(
    listener: TcpListener,
    game: GameState,
    ledger: Arc<ScoreLedger>,
    events: EventLog,
    config: TableConfig,
) -> io::Result<GameSummary> {
    let players = game.num_players();
    if players != config.players {
        log::warn!(
            "Table configured for {} players but the game deals {players}",
            config.players
        );
    }
    events.record(GameEvent::InitialTopCard(game.top_card()));

    let table = Arc::new(SharedGame::new(game));
    let mut workers = JoinSet::new();

    for player in 0..players {
        let (stream, addr) = listener.accept().await?;
        log::info!("Player {player} connected from {addr}");
        events.record(GameEvent::Connected(player));

        let (read_half, write_half) = stream.into_split();
        let worker = TurnWorker::new(
            player,
            BufReader::new(read_half),
            write_half,
            table.clone(),
            ledger.clone(),
            events.clone(),
        );
        workers.spawn(async move { (player, worker.run().await) });
    }
    log::info!("All {players} players connected, starting game");

    let scheduler = tokio::spawn(Scheduler::new(table.clone(), config.scheduler_interval).run());

    let mut exits = vec![None; players];
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((player, exit)) => exits[player] = Some(exit),
            Err(e) => log::error!("Worker task failed: {e}"),
        }
    }

    scheduler.abort();
    if let Err(e) = scheduler.await {
        if !e.is_cancelled() {
            log::error!("Scheduler failed: {e}");
        }
    }

    let (winner, scores) = table.read(|s| (s.winner(), s.scores().to_vec())).await;
    match winner {
        Some(winner) => log::info!("Game over, player {winner} won"),
        None => log::info!("Game over without a winner"),
    }
    Ok(GameSummary {
        winner,
        scores,
        exits,
    })
}
