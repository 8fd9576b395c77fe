//! Board representation: the 40-space catalog and per-space ownership state.
//!
//! This module contains:
//! - Identifier and money aliases shared across the engine
//! - Color groups and space kinds
//! - The `Space` record with its mutable owner/mortgage/house fields
//! - The standard board catalog and lookup helpers

use serde::{Deserialize, Serialize};

/// Player identifier, assigned in seating order at game creation
pub type PlayerId = u8;

/// Amounts of money. Signed because a balance may dip below zero between
/// landing on a space and resolving the debt.
pub type Money = i64;

/// Stable identifier of a space, e.g. `"boardwalk"`
pub type SpaceId = String;

/// Number of spaces around the board
pub const BOARD_SIZE: u8 = 40;

/// Index of the jail corner
pub const JAIL_INDEX: u8 = 10;

/// Index of the "go to jail" corner
pub const GO_TO_JAIL_INDEX: u8 = 30;

/// Houses on a space that mean "hotel"
pub const HOTEL: u8 = 5;

/// Property color groups, including the two non-buildable groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorGroup {
    Brown,
    LightBlue,
    Pink,
    Orange,
    Red,
    Yellow,
    Green,
    DarkBlue,
    /// Railroads
    Station,
    Utility,
}

impl ColorGroup {
    /// All groups in board order
    pub const ALL: [ColorGroup; 10] = [
        ColorGroup::Brown,
        ColorGroup::LightBlue,
        ColorGroup::Pink,
        ColorGroup::Orange,
        ColorGroup::Red,
        ColorGroup::Yellow,
        ColorGroup::Green,
        ColorGroup::DarkBlue,
        ColorGroup::Station,
        ColorGroup::Utility,
    ];

    /// Whether houses and hotels may be built on this group
    pub fn is_buildable(&self) -> bool {
        !matches!(self, ColorGroup::Station | ColorGroup::Utility)
    }
}

/// Non-property, non-corner tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionTile {
    Chance,
    CommunityChest,
    IncomeTax,
    LuxuryTax,
}

/// The four corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CornerTile {
    Go,
    /// Jail, or "just visiting" when not jailed
    Jail,
    FreeParking,
    GoToJail,
}

/// What kind of space this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpaceKind {
    Property,
    Action(ActionTile),
    Corner(CornerTile),
}

/// A single space on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    pub kind: SpaceKind,
    /// Board index 0-39
    pub index: u8,
    pub group: Option<ColorGroup>,
    /// Purchase price (0 for non-properties)
    pub price: Money,
    /// Rent tiers: [base, 1 house, 2 houses, 3 houses, 4 houses, hotel]
    pub rent: [Money; 6],
    pub house_cost: Money,
    /// `None` while the bank owns it
    pub owner: Option<PlayerId>,
    pub mortgaged: bool,
    /// 0-4 houses, 5 = hotel
    pub houses: u8,
}

impl Space {
    fn property(
        index: u8,
        id: &str,
        name: &str,
        group: ColorGroup,
        price: Money,
        rent: [Money; 6],
        house_cost: Money,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: SpaceKind::Property,
            index,
            group: Some(group),
            price,
            rent,
            house_cost,
            owner: None,
            mortgaged: false,
            houses: 0,
        }
    }

    fn station(index: u8, id: &str, name: &str) -> Self {
        Self::property(index, id, name, ColorGroup::Station, 200, [25, 0, 0, 0, 0, 0], 0)
    }

    fn utility(index: u8, id: &str, name: &str) -> Self {
        Self::property(index, id, name, ColorGroup::Utility, 150, [0; 6], 0)
    }

    fn tile(index: u8, id: &str, name: &str, kind: SpaceKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            index,
            group: None,
            price: 0,
            rent: [0; 6],
            house_cost: 0,
            owner: None,
            mortgaged: false,
            houses: 0,
        }
    }

    /// Whether this space can be bought and owned
    pub fn is_property(&self) -> bool {
        self.kind == SpaceKind::Property
    }

    /// Whether houses can be built here
    pub fn is_buildable(&self) -> bool {
        self.is_property() && self.group.map_or(false, |g| g.is_buildable())
    }

    /// Whether the space is an unowned property the bank can sell
    pub fn is_for_sale(&self) -> bool {
        self.is_property() && self.owner.is_none()
    }

    /// Whether this space carries a hotel
    pub fn has_hotel(&self) -> bool {
        self.houses >= HOTEL
    }
}

/// The game board: 40 spaces in board order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    spaces: Vec<Space>,
}

impl Board {
    /// The classic 40-space board
    pub fn standard() -> Self {
        use ActionTile::*;
        use ColorGroup::*;
        use CornerTile::*;

        let spaces = vec![
            Space::tile(0, "go", "GO", SpaceKind::Corner(Go)),
            Space::property(1, "mediterranean", "Mediterranean Avenue", Brown, 60, [2, 10, 30, 90, 160, 250], 50),
            Space::tile(2, "community_chest_1", "Community Chest", SpaceKind::Action(CommunityChest)),
            Space::property(3, "baltic", "Baltic Avenue", Brown, 60, [4, 20, 60, 180, 320, 450], 50),
            Space::tile(4, "income_tax", "Income Tax", SpaceKind::Action(IncomeTax)),
            Space::station(5, "reading_railroad", "Reading Railroad"),
            Space::property(6, "oriental", "Oriental Avenue", LightBlue, 100, [6, 30, 90, 270, 400, 550], 50),
            Space::tile(7, "chance_1", "Chance", SpaceKind::Action(Chance)),
            Space::property(8, "vermont", "Vermont Avenue", LightBlue, 100, [6, 30, 90, 270, 400, 550], 50),
            Space::property(9, "connecticut", "Connecticut Avenue", LightBlue, 120, [8, 40, 100, 300, 450, 600], 50),
            Space::tile(10, "jail", "Jail", SpaceKind::Corner(Jail)),
            Space::property(11, "st_charles", "St. Charles Place", Pink, 140, [10, 50, 150, 450, 625, 750], 100),
            Space::utility(12, "electric_company", "Electric Company"),
            Space::property(13, "states", "States Avenue", Pink, 140, [10, 50, 150, 450, 625, 750], 100),
            Space::property(14, "virginia", "Virginia Avenue", Pink, 160, [12, 60, 180, 500, 700, 900], 100),
            Space::station(15, "pennsylvania_railroad", "Pennsylvania Railroad"),
            Space::property(16, "st_james", "St. James Place", Orange, 180, [14, 70, 200, 550, 750, 950], 100),
            Space::tile(17, "community_chest_2", "Community Chest", SpaceKind::Action(CommunityChest)),
            Space::property(18, "tennessee", "Tennessee Avenue", Orange, 180, [14, 70, 200, 550, 750, 950], 100),
            Space::property(19, "new_york", "New York Avenue", Orange, 200, [16, 80, 220, 600, 800, 1000], 100),
            Space::tile(20, "free_parking", "Free Parking", SpaceKind::Corner(FreeParking)),
            Space::property(21, "kentucky", "Kentucky Avenue", Red, 220, [18, 90, 250, 700, 875, 1050], 150),
            Space::tile(22, "chance_2", "Chance", SpaceKind::Action(Chance)),
            Space::property(23, "indiana", "Indiana Avenue", Red, 220, [18, 90, 250, 700, 875, 1050], 150),
            Space::property(24, "illinois", "Illinois Avenue", Red, 240, [20, 100, 300, 750, 925, 1100], 150),
            Space::station(25, "b_and_o_railroad", "B&O Railroad"),
            Space::property(26, "atlantic", "Atlantic Avenue", Yellow, 260, [22, 110, 330, 800, 975, 1150], 150),
            Space::property(27, "ventnor", "Ventnor Avenue", Yellow, 260, [22, 110, 330, 800, 975, 1150], 150),
            Space::utility(28, "water_works", "Water Works"),
            Space::property(29, "marvin_gardens", "Marvin Gardens", Yellow, 280, [24, 120, 360, 850, 1025, 1200], 150),
            Space::tile(30, "go_to_jail", "Go To Jail", SpaceKind::Corner(GoToJail)),
            Space::property(31, "pacific", "Pacific Avenue", Green, 300, [26, 130, 390, 900, 1100, 1275], 200),
            Space::property(32, "north_carolina", "North Carolina Avenue", Green, 300, [26, 130, 390, 900, 1100, 1275], 200),
            Space::tile(33, "community_chest_3", "Community Chest", SpaceKind::Action(CommunityChest)),
            Space::property(34, "pennsylvania_avenue", "Pennsylvania Avenue", Green, 320, [28, 150, 450, 1000, 1200, 1400], 200),
            Space::station(35, "short_line", "Short Line"),
            Space::tile(36, "chance_3", "Chance", SpaceKind::Action(Chance)),
            Space::property(37, "park_place", "Park Place", DarkBlue, 350, [35, 175, 500, 1100, 1300, 1500], 200),
            Space::tile(38, "luxury_tax", "Luxury Tax", SpaceKind::Action(LuxuryTax)),
            Space::property(39, "boardwalk", "Boardwalk", DarkBlue, 400, [50, 200, 600, 1400, 1700, 2000], 200),
        ];

        Self { spaces }
    }

    /// All spaces in board order
    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    /// Look up a space by id
    pub fn get(&self, id: &str) -> Option<&Space> {
        self.spaces.iter().find(|s| s.id == id)
    }

    /// Look up a space by id for mutation
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Space> {
        self.spaces.iter_mut().find(|s| s.id == id)
    }

    /// The space at a board index (wrapped into 0-39)
    pub fn at(&self, index: u8) -> &Space {
        &self.spaces[(index % BOARD_SIZE) as usize]
    }

    /// Every property in a color group
    pub fn group(&self, group: ColorGroup) -> impl Iterator<Item = &Space> {
        self.spaces
            .iter()
            .filter(move |s| s.is_property() && s.group == Some(group))
    }

    /// Every property owned by a player
    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = &Space> {
        self.spaces.iter().filter(move |s| s.owner == Some(player))
    }

    /// Whether `player` owns every property in `group`
    pub fn owns_group(&self, player: PlayerId, group: ColorGroup) -> bool {
        self.group(group).all(|s| s.owner == Some(player))
    }

    /// Number of properties in `group` owned by `player`
    pub fn count_owned_in_group(&self, player: PlayerId, group: ColorGroup) -> usize {
        self.group(group).filter(|s| s.owner == Some(player)).count()
    }

    /// Set a property's owner. Returns false for unknown or non-property ids.
    pub fn set_owner(&mut self, id: &str, owner: Option<PlayerId>) -> bool {
        match self.get_mut(id) {
            Some(space) if space.is_property() => {
                space.owner = owner;
                true
            }
            _ => false,
        }
    }

    /// Return a property to the bank: unowned, unmortgaged, undeveloped
    pub fn return_to_bank(&mut self, id: &str) {
        if let Some(space) = self.get_mut(id) {
            space.owner = None;
            space.mortgaged = false;
            space.houses = 0;
        }
    }

    /// Total houses (excluding hotels) and hotels owned by a player
    pub fn buildings_of(&self, player: PlayerId) -> (u32, u32) {
        self.owned_by(player).fold((0, 0), |(houses, hotels), s| {
            if s.has_hotel() {
                (houses, hotels + 1)
            } else {
                (houses + s.houses as u32, hotels)
            }
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}
