//! Player state.

use crate::board::{Money, PlayerId, SpaceId, JAIL_INDEX};
use crate::bot::BotPersonality;
use serde::{Deserialize, Serialize};

/// Token color, used only for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenColor {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Teal,
    Pink,
}

impl TokenColor {
    /// Default color for a seat index
    pub fn for_player(id: PlayerId) -> Self {
        match id % 8 {
            0 => TokenColor::Red,
            1 => TokenColor::Blue,
            2 => TokenColor::Green,
            3 => TokenColor::Yellow,
            4 => TokenColor::Purple,
            5 => TokenColor::Orange,
            6 => TokenColor::Teal,
            _ => TokenColor::Pink,
        }
    }
}

/// Who makes this player's decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerKind {
    Human,
    Bot(BotPersonality),
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub kind: PlayerKind,
    pub color: TokenColor,
    /// May be negative until the player resolves a debt
    pub cash: Money,
    /// Board index 0-39
    pub position: u8,
    pub in_jail: bool,
    /// Failed doubles attempts while jailed (0-3)
    pub jail_turns: u8,
    /// Owned property ids in acquisition order
    pub properties: Vec<SpaceId>,
    pub jail_free_cards: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String, kind: PlayerKind, color: TokenColor, cash: Money) -> Self {
        Self {
            id,
            name,
            kind,
            color,
            cash,
            position: 0,
            in_jail: false,
            jail_turns: 0,
            properties: Vec::new(),
            jail_free_cards: 0,
        }
    }

    pub fn is_bot(&self) -> bool {
        matches!(self.kind, PlayerKind::Bot(_))
    }

    /// The personality driving this player, if a bot
    pub fn personality(&self) -> Option<BotPersonality> {
        match self.kind {
            PlayerKind::Bot(personality) => Some(personality),
            PlayerKind::Human => None,
        }
    }

    pub fn can_afford(&self, amount: Money) -> bool {
        self.cash >= amount
    }

    pub fn owns(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }

    /// Record a newly acquired property
    pub fn add_property(&mut self, property: &str) {
        if !self.owns(property) {
            self.properties.push(property.to_string());
        }
    }

    /// Forget a property that changed hands
    pub fn remove_property(&mut self, property: &str) {
        self.properties.retain(|p| p != property);
    }

    /// Move to jail: position forced to the jail corner
    pub fn send_to_jail(&mut self) {
        self.position = JAIL_INDEX;
        self.in_jail = true;
        self.jail_turns = 0;
    }

    pub fn release_from_jail(&mut self) {
        self.in_jail = false;
        self.jail_turns = 0;
    }
}
