//! Pure rule helpers with no access to the shared table.

use super::entities::{Card, Kind, PlayerSlot};

/// Whether `candidate` may be played on top of `top`.
///
/// A card matches when it shares the color, the kind, or (for number cards)
/// the face value.
pub fn is_legal(candidate: &Card, top: &Card) -> bool {
    if candidate.color == top.color {
        return true;
    }
    if candidate.kind.same_kind(&top.kind) {
        return true;
    }
    matches!(
        (candidate.kind, top.kind),
        (Kind::Number(a), Kind::Number(b)) if a == b
    )
}

/// First active seat strictly after `from`, wrapping around the table.
///
/// `from` itself is considered last, so a lone active player gets their own
/// seat back. Returns `None` when nobody is active.
pub fn next_active(players: &[PlayerSlot], from: usize) -> Option<usize> {
    let n = players.len();
    (1..=n)
        .map(|step| (from + step) % n)
        .find(|&idx| players[idx].is_active())
}

/// Number of players still in rotation.
pub fn active_count(players: &[PlayerSlot]) -> usize {
    players.iter().filter(|p| p.is_active()).count()
}
