//! Append-only game event log.
//!
//! Workers push events through a cloneable [`EventLog`] handle; a single drain
//! task owns the file and writes one timestamped line per event. Producers
//! never touch the disk, and lines from concurrent producers can't interleave.

use std::path::{Path, PathBuf};

use tokio::{
    fs::OpenOptions,
    io::{self, AsyncWriteExt},
    sync::mpsc,
    task::JoinHandle,
};

use crate::game::GameEvent;

/// Producer side of the event log.
#[derive(Clone, Debug)]
pub struct EventLog {
    sender: mpsc::UnboundedSender<GameEvent>,
}

impl EventLog {
    /// A handle and the raw receiving end, for callers that drain themselves.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GameEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Spawn a drain task appending to `path`.
    ///
    /// The task finishes once every handle has been dropped, returning the
    /// number of lines written.
    pub fn spawn(path: impl Into<PathBuf>) -> (Self, JoinHandle<io::Result<u64>>) {
        let (log, receiver) = Self::channel();
        let path = path.into();
        let drain = tokio::spawn(async move { drain(receiver, &path).await });
        (log, drain)
    }

    /// Emit an operator log line and queue the event for the file.
    pub fn record(&self, event: GameEvent) {
        log::info!("{event}");
        if self.sender.send(event).is_err() {
            log::warn!("Event log drain has stopped; event not persisted");
        }
    }

    pub fn record_all(&self, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            self.record(event);
        }
    }
}

/// Write every received event to `path` until all producers are gone.
pub async fn drain(
    mut receiver: mpsc::UnboundedReceiver<GameEvent>,
    path: &Path,
) -> io::Result<u64> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;

    let mut written = 0;
    while let Some(event) = receiver.recv().await {
        let line = format!("{} {event}\n", chrono::Local::now().to_rfc3339());
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        written += 1;
    }
    log::debug!("Event log drained {written} line(s) to {}", path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Card, Color};

    #[tokio::test]
    async fn drain_appends_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.log");
        std::fs::write(&path, "existing line\n").unwrap();

        let (log, drain) = EventLog::spawn(&path);
        log.record(GameEvent::Turn(0));
        log.record(GameEvent::Played(0, Card::number(Color::Red, 5)));
        log.record(GameEvent::Won(0));
        drop(log);

        assert_eq!(drain.await.unwrap().unwrap(), 3);
        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "existing line");
        assert!(lines[1].ends_with(" PLAYER 0 TURN"));
        assert!(lines[2].ends_with(" PLAYER 0 PLAYED RED NUMBER 5"));
        assert!(lines[3].ends_with(" PLAYER 0 WINS THE GAME"));
    }

    #[tokio::test]
    async fn concurrent_producers_never_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.log");
        let (log, drain) = EventLog::spawn(&path);

        let mut producers = vec![];
        for player in 0..5 {
            let log = log.clone();
            producers.push(tokio::spawn(async move {
                for _ in 0..20 {
                    log.record(GameEvent::NoCard(player));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }
        drop(log);

        assert_eq!(drain.await.unwrap().unwrap(), 100);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 100);
        for line in contents.lines() {
            let (_, event) = line.split_once(' ').unwrap();
            assert!(event.starts_with("PLAYER ") && event.ends_with(" NO_CARD"));
        }
    }

    #[tokio::test]
    async fn record_after_drain_stops_is_harmless() {
        let (log, receiver) = EventLog::channel();
        drop(receiver);
        log.record(GameEvent::GameOver);
    }
}
