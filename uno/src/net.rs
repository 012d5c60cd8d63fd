//! Networking layer for the line-oriented table protocol.
//!
//! Clients and the server exchange newline-terminated text. Menus end with a
//! `> END` line; notices are single lines.

/// Blocking line client, used mostly as a testing utility.
pub mod client;

/// Protocol error types.
pub mod errors;

/// Menu rendering, notices, and message parsing.
pub mod messages;

/// Accept loop and worker supervision.
pub mod server;

/// Bounded line reads and message writes.
pub mod utils;
