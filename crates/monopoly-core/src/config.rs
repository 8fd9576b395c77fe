//! Game creation settings.

use crate::board::Money;
use crate::player::{PlayerKind, TokenColor};
use serde::{Deserialize, Serialize};

/// Fewest players a game can start with
pub const MIN_PLAYERS: usize = 2;

/// Most players a game can seat
pub const MAX_PLAYERS: usize = 8;

/// House rules chosen when the game is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub starting_cash: Money,
    /// Declined purchases go to auction; otherwise they stay with the bank
    pub enable_auctions: bool,
    pub enable_trading: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            starting_cash: 1500,
            enable_auctions: true,
            enable_trading: true,
        }
    }
}

/// One seat at game creation, in turn order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeat {
    pub name: String,
    pub kind: PlayerKind,
    pub color: Option<TokenColor>,
}

impl PlayerSeat {
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PlayerKind::Human,
            color: None,
        }
    }

    pub fn bot(name: impl Into<String>, personality: crate::bot::BotPersonality) -> Self {
        Self {
            name: name.into(),
            kind: PlayerKind::Bot(personality),
            color: None,
        }
    }
}
