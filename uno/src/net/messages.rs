use std::fmt;

use crate::game::{GameState, UserError, entities::DisqualifyReason};

/// Last line of every menu.
pub const END_MARKER: &str = "> END";

pub const TOP_CARD_HEADER: &str = "===== TOP CARD =====";
pub const TOP_CARD_FOOTER: &str = "====================";
pub const HAND_HEADER: &str = "Your cards:";
pub const PROMPT: &str = "Type card NUMBER to play, or type: NO_CARD";

/// Render the turn menu for `player`.
///
/// Returns `None` if `player` has no seat at this table.
pub fn render_menu(state: &GameState, player: usize) -> Option<String> {
    let slot = state.player(player)?;
    let mut menu = format!(
        "{TOP_CARD_HEADER}\n{}\n{TOP_CARD_FOOTER}\n{HAND_HEADER}\n",
        state.top_card()
    );
    for (i, card) in slot.hand.iter().enumerate() {
        menu.push_str(&format!("{}) {card}\n", i + 1));
    }
    menu.push_str(PROMPT);
    menu.push('\n');
    menu.push_str(END_MARKER);
    menu.push('\n');
    Some(menu)
}

/// Single-line server messages that aren't part of a menu.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Notice {
    InvalidMove,
    InvalidCardNumber,
    Disqualified(DisqualifyReason),
    Win,
    GameOver { winner: Option<usize> },
}

impl Notice {
    /// The notice a rejected move is answered with, if any.
    pub fn for_rejection(error: &UserError) -> Option<Self> {
        match error {
            UserError::InvalidMove => Some(Self::InvalidMove),
            UserError::InvalidCardNumber => Some(Self::InvalidCardNumber),
            UserError::NotYourTurn | UserError::PlayerInactive | UserError::GameOver => None,
        }
    }

    /// Recognize a notice line.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let notice = match line {
            "[SERVER] Invalid move! Card does not match color/type/number." => Self::InvalidMove,
            "[SERVER] Invalid card number. Try again." => Self::InvalidCardNumber,
            "YOU WIN" => Self::Win,
            "GAME OVER" => Self::GameOver { winner: None },
            "YOU ARE DISQUALIFIED (3 NO_CARD)" => Self::Disqualified(DisqualifyReason::NoPlayStreak),
            "YOU ARE DISQUALIFIED (8 CARDS)" => Self::Disqualified(DisqualifyReason::HandOverflow),
            "YOU ARE DISQUALIFIED (DISCONNECTED)" => {
                Self::Disqualified(DisqualifyReason::Disconnected)
            }
            _ => {
                let winner = line
                    .strip_prefix("GAME OVER: PLAYER ")?
                    .strip_suffix(" WINS")?
                    .parse()
                    .ok()?;
                Self::GameOver {
                    winner: Some(winner),
                }
            }
        };
        Some(notice)
    }

    /// Whether the server closes the connection after sending this notice.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InvalidMove | Self::InvalidCardNumber)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidMove => write!(
                f,
                "[SERVER] Invalid move! Card does not match color/type/number."
            ),
            Self::InvalidCardNumber => write!(f, "[SERVER] Invalid card number. Try again."),
            Self::Disqualified(reason) => write!(f, "YOU ARE DISQUALIFIED ({reason})"),
            Self::Win => write!(f, "YOU WIN"),
            Self::GameOver { winner: Some(idx) } => write!(f, "GAME OVER: PLAYER {idx} WINS"),
            Self::GameOver { winner: None } => write!(f, "GAME OVER"),
        }
    }
}

/// A turn menu as seen by a client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Menu {
    pub top_card: String,
    pub cards: Vec<String>,
}

impl Menu {
    /// Parse the lines of one menu, `> END` excluded.
    pub fn parse(lines: &[String]) -> Option<Self> {
        let header = lines.iter().position(|l| l == TOP_CARD_HEADER)?;
        let top_card = lines.get(header + 1)?.clone();
        let cards = lines[header + 2..]
            .iter()
            .filter_map(|line| {
                let (num, card) = line.split_once(") ")?;
                num.parse::<usize>().ok()?;
                Some(card.to_string())
            })
            .collect();
        Some(Self { top_card, cards })
    }

    /// 1-based position of `card` in the hand.
    pub fn position(&self, card: &str) -> Option<usize> {
        self.cards.iter().position(|c| c == card).map(|i| i + 1)
    }
}

/// Anything the server sends.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ServerMessage {
    Menu(Menu),
    Notice(Notice),
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Menu(menu) => write!(f, "menu (top {}, {} card(s))", menu.top_card, menu.cards.len()),
            Self::Notice(notice) => write!(f, "{notice}"),
        }
    }
}
