//! Durable cumulative win counts.
//!
//! The ledger is a plain text file with one `Player <i>: <wins>` line per
//! seat. It is read once at startup and rewritten in full after every win.
//! Writes go through the ledger's own lock so a slow disk never holds up the
//! game table.

pub mod errors;

pub use errors::{LedgerError, LedgerResult};

use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::sync::Mutex;

/// Win counts per seat index, backed by a score file.
#[derive(Debug)]
pub struct ScoreLedger {
    path: PathBuf,
    counts: Mutex<Vec<u32>>,
}

impl ScoreLedger {
    /// Load the ledger for a table of `players` seats.
    ///
    /// A missing file is created with zero wins for every seat. Records for
    /// seats beyond `players` left by earlier, larger games are kept.
    pub async fn load(path: impl Into<PathBuf>, players: usize) -> LedgerResult<Self> {
        let path = path.into();
        let (mut counts, fresh) = match tokio::fs::read_to_string(&path).await {
            Ok(text) => (parse(&text), false),
            Err(source) if source.kind() == io::ErrorKind::NotFound => (vec![], true),
            Err(source) => return Err(LedgerError::Io { path, source }),
        };
        if counts.len() < players {
            counts.resize(players, 0);
        }

        if fresh {
            log::info!("No score file at {}, starting from zero", path.display());
            write_counts(&path, &counts).await?;
        }

        Ok(Self {
            path,
            counts: Mutex::new(counts),
        })
    }

    /// Add one win for `index` and rewrite the file. Returns the new count.
    pub async fn record_win(&self, index: usize) -> LedgerResult<u32> {
        let mut counts = self.counts.lock().await;
        let players = counts.len();
        let count = counts
            .get_mut(index)
            .ok_or(LedgerError::IndexOutOfRange { index, players })?;
        *count += 1;
        let updated = *count;

        if let Err(e) = write_counts(&self.path, &counts).await {
            counts[index] -= 1;
            return Err(e);
        }
        Ok(updated)
    }

    pub async fn counts(&self) -> Vec<u32> {
        self.counts.lock().await.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn write_counts(path: &Path, counts: &[u32]) -> LedgerResult<()> {
    tokio::fs::write(path, render(counts))
        .await
        .map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize counts, one `Player <i>: <wins>` line per seat.
pub fn render(counts: &[u32]) -> String {
    counts
        .iter()
        .enumerate()
        .map(|(idx, wins)| format!("Player {idx}: {wins}\n"))
        .collect()
}

/// Parse a score file. Seats without a record count zero; lines that don't
/// look like a record are skipped.
pub fn parse(text: &str) -> Vec<u32> {
    let mut counts = vec![];
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((idx, wins)) = parse_record(line) else {
            log::warn!("Skipping malformed score record: {line:?}");
            continue;
        };
        if counts.len() <= idx {
            counts.resize(idx + 1, 0);
        }
        counts[idx] = wins;
    }
    counts
}

fn parse_record(line: &str) -> Option<(usize, u32)> {
    let (idx, wins) = line.strip_prefix("Player ")?.split_once(':')?;
    Some((idx.trim().parse().ok()?, wins.trim().parse().ok()?))
}
