//! A low-level blocking table client.
//!
//! The real terminal client is a plain line loop; this one exists so tests
//! can drive a server over TCP and look at what each seat receives.

use anyhow::{Error, bail};
use std::{
    io::{BufRead, BufReader, Write},
    net::{SocketAddr, TcpStream},
    thread,
    time::Duration,
};

use super::messages::{END_MARKER, Menu, Notice, ServerMessage};

/// Default timeout for reading from the server.
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for writing to the server.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// A blocking TCP client occupying one seat.
pub struct Client {
    reader: BufReader<TcpStream>,
    /// The underlying TCP stream, for writes.
    pub stream: TcpStream,
}

impl Client {
    /// Connect to a table server.
    ///
    /// Tries three times with decreasing timeouts (1s, 500ms, 100ms).
    ///
    /// # Errors
    ///
    /// Returns an error if no attempt connects.
    pub fn connect(addr: &SocketAddr) -> Result<Self, Error> {
        let mut connect_timeouts = vec![
            Duration::from_millis(100),
            Duration::from_millis(500),
            Duration::from_secs(1),
        ];
        while let Some(connect_timeout) = connect_timeouts.pop() {
            match TcpStream::connect_timeout(addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(READ_TIMEOUT))?;
                    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                    let reader = BufReader::new(stream.try_clone()?);
                    return Ok(Self { reader, stream });
                }
                _ => thread::sleep(connect_timeout),
            }
        }
        bail!("couldn't connect to {addr}")
    }

    /// Send one raw line.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be written.
    pub fn send_line(&mut self, line: &str) -> Result<(), Error> {
        self.stream.write_all(format!("{line}\n").as_bytes())?;
        self.stream.flush()?;
        Ok(())
    }

    /// Play the card at 1-based `position`.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be written.
    pub fn play(&mut self, position: usize) -> Result<(), Error> {
        self.send_line(&position.to_string())
    }

    /// Declare NO_CARD.
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be written.
    pub fn no_card(&mut self) -> Result<(), Error> {
        self.send_line("NO_CARD")
    }

    /// Receive the next menu or notice, skipping blank lines.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, EOF, or an unrecognized message.
    pub fn recv(&mut self) -> Result<ServerMessage, Error> {
        let mut lines = vec![];
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                bail!("server closed the connection");
            }
            let line = line.trim_end_matches(['\n', '\r']);
            if lines.is_empty() {
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(notice) = Notice::parse(line) {
                    return Ok(ServerMessage::Notice(notice));
                }
            }
            if line == END_MARKER {
                return match Menu::parse(&lines) {
                    Some(menu) => Ok(ServerMessage::Menu(menu)),
                    None => bail!("invalid menu: {lines:?}"),
                };
            }
            lines.push(line.to_string());
        }
    }

    /// # Errors
    ///
    /// Returns an error if the next message isn't a menu.
    pub fn recv_menu(&mut self) -> Result<Menu, Error> {
        match self.recv()? {
            ServerMessage::Menu(menu) => Ok(menu),
            msg => bail!("invalid server response: {msg}"),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the next message isn't a notice.
    pub fn recv_notice(&mut self) -> Result<Notice, Error> {
        match self.recv()? {
            ServerMessage::Notice(notice) => Ok(notice),
            msg => bail!("invalid server response: {msg}"),
        }
    }

    /// Whether the server has closed this seat's connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the server sends more data or the read times out.
    pub fn expect_closed(&mut self) -> Result<(), Error> {
        let mut line = String::new();
        match self.reader.read_line(&mut line)? {
            0 => Ok(()),
            _ => bail!("expected the connection to close, got {line:?}"),
        }
    }
}
