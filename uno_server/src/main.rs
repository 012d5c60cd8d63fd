//! Card game table server.
//!
//! Binds one listener, waits for every seat to fill, runs the game to the
//! end, and exits.

mod config;

use std::{io, path::PathBuf, sync::Arc};

use anyhow::{Context, Error};
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use uno::{EventLog, GameState, ScoreLedger, entities::Deck, server};

use config::{Overrides, ServerConfig, prompt_players};

const HELP: &str = "\
Run a turn-based card game table

USAGE:
  uno_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 0.0.0.0:9000]
  --players    N           Number of players (3-5)     [default: env UNO_PLAYERS or prompt]
  --scores     PATH        Win-count file              [default: env SCORE_FILE or scores.txt]
  --log        PATH        Game event log              [default: env EVENT_LOG or game.log]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:9000)
  UNO_PLAYERS              Player count; out-of-range values mean 3
  SCORE_FILE               Win-count file
  EVENT_LOG                Game event log
  SCHEDULER_INTERVAL_MS    Turn scheduler period in milliseconds
  RUST_LOG                 Operator log level [default: info]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str("--bind")?,
        players: pargs.opt_value_from_str("--players")?,
        score_file: pargs.opt_value_from_str::<_, PathBuf>("--scores")?,
        event_log: pargs.opt_value_from_str::<_, PathBuf>("--log")?,
    };

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!("Listening on {}", listener.local_addr()?);

    let players = match config.players {
        Some(players) => players,
        None => prompt_players(&mut io::stdin().lock(), &mut io::stdout())?,
    };
    let table = config.table(players);
    info!("Starting a table for {} players", table.players);

    let ledger = ScoreLedger::load(&config.score_file, table.players)
        .await
        .context("Failed to load the score ledger")?;
    let scores = ledger.counts().await;
    let game = GameState::new(table.players, Deck::new()).with_scores(&scores);

    let (events, drain) = EventLog::spawn(&config.event_log);
    let summary = server::run(listener, game, Arc::new(ledger), events, table).await?;

    // Every producer is gone once the server returns; wait for the file.
    match drain.await {
        Ok(Ok(lines)) => info!("Wrote {lines} event(s) to {}", config.event_log.display()),
        Ok(Err(e)) => log::error!("Event log failed: {e}"),
        Err(e) => log::error!("Event log task failed: {e}"),
    }

    for (player, score) in summary.scores.iter().enumerate() {
        info!("Player {player}: {score}");
    }
    info!("GAME OVER");

    Ok(())
}
