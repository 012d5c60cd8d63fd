//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::{
    io::{self, BufRead, Write},
    net::SocketAddr,
    path::PathBuf,
    time::Duration,
};

use uno::{TableConfig, table::config::parse_player_count};

pub const DEFAULT_BIND: &str = "0.0.0.0:9000";
pub const DEFAULT_SCORE_FILE: &str = "scores.txt";
pub const DEFAULT_EVENT_LOG: &str = "game.log";
pub const DEFAULT_SCHEDULER_INTERVAL_MS: u64 = 1000;

/// Prompt shown on stdin when no player count was configured.
pub const PLAYER_PROMPT: &str = "Enter number of players (3-5): ";

/// Complete server configuration loaded from CLI flags and environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Requested player count; `None` means ask the operator
    pub players: Option<usize>,
    /// Win-count file
    pub score_file: PathBuf,
    /// Game event log file
    pub event_log: PathBuf,
    /// Period of the turn scheduler
    pub scheduler_interval: Duration,
}

/// Values given on the command line. They win over the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub players: Option<usize>,
    pub score_file: Option<PathBuf>,
    pub event_log: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if `SERVER_BIND` is set but isn't a socket address.
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => {
                let raw = std::env::var("SERVER_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
                raw.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("{raw:?} is not an IP:PORT address"),
                })?
            }
        };

        // An unparseable count still means "configured"; the table clamps it.
        let players = overrides.players.or_else(|| {
            std::env::var("UNO_PLAYERS")
                .ok()
                .map(|v| parse_player_count(&v))
        });

        let score_file = overrides
            .score_file
            .unwrap_or_else(|| parse_env_or("SCORE_FILE", PathBuf::from(DEFAULT_SCORE_FILE)));
        let event_log = overrides
            .event_log
            .unwrap_or_else(|| parse_env_or("EVENT_LOG", PathBuf::from(DEFAULT_EVENT_LOG)));
        let scheduler_interval = Duration::from_millis(parse_env_or(
            "SCHEDULER_INTERVAL_MS",
            DEFAULT_SCHEDULER_INTERVAL_MS,
        ));

        Ok(ServerConfig {
            bind,
            players,
            score_file,
            event_log,
            scheduler_interval,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns error for a zero scheduler interval or when the score file and
    /// the event log are the same file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SCHEDULER_INTERVAL_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.score_file == self.event_log {
            return Err(ConfigError::Invalid {
                var: "EVENT_LOG".to_string(),
                reason: format!(
                    "Must differ from the score file ({})",
                    self.score_file.display()
                ),
            });
        }

        Ok(())
    }

    /// Table settings for `players` seats.
    pub fn table(&self, players: usize) -> TableConfig {
        TableConfig::new(players).with_scheduler_interval(self.scheduler_interval)
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Ask the operator for a player count. Anything unusable falls back to 3.
///
/// # Errors
///
/// Returns error if the prompt can't be written or stdin can't be read.
pub fn prompt_players(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<usize> {
    output.write_all(PLAYER_PROMPT.as_bytes())?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(parse_player_count(&line))
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
