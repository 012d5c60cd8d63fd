//! Table-wide limits shared by the engine and the server.

/// Fewest players a table can be started with.
pub const MIN_PLAYERS: usize = 3;

/// Most players a table can seat.
pub const MAX_PLAYERS: usize = 5;

/// Cards dealt to each player when the game starts.
pub const HAND_SIZE: usize = 5;

/// Holding this many cards disqualifies a player.
pub const MAX_HAND: usize = 8;

/// Consecutive NO_CARD declarations that disqualify a player.
pub const MAX_NO_PLAY_STREAK: u32 = 3;

/// Cards in the canonical deck, blank slots included.
pub const DECK_SIZE: usize = 108;
