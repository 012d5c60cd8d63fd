//! Score ledger error types.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Score ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Reading or rewriting the score file failed
    #[error("score file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Win recorded for a seat the ledger doesn't track
    #[error("player index {index} out of range for {players} tracked player(s)")]
    IndexOutOfRange { index: usize, players: usize },
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
