//! Money rules: rent, tax, mortgages, building and liquidation.
//!
//! Every predicate returns `Ok(())` when the move is allowed, otherwise a
//! [`RuleViolation`] whose message explains why.

use crate::board::{ActionTile, Board, ColorGroup, Money, Space, SpaceKind, HOTEL};
use crate::player::Player;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Income tax fee
pub const INCOME_TAX: Money = 200;

/// Luxury tax fee
pub const LUXURY_TAX: Money = 100;

/// Why a financial move is refused
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RuleViolation {
    #[error("{0} is not a property")]
    NotAProperty(String),

    #[error("cannot build on {0}")]
    NotBuildable(String),

    #[error("you don't own {0}")]
    NotOwner(String),

    #[error("{0} is mortgaged")]
    Mortgaged(String),

    #[error("{0} is already mortgaged")]
    AlreadyMortgaged(String),

    #[error("{0} is not mortgaged")]
    NotMortgaged(String),

    #[error("you need the whole color group to build")]
    IncompleteMonopoly,

    #[error("cannot build while any property in the group is mortgaged")]
    GroupMortgaged,

    #[error("{0} already has a hotel")]
    MaxBuildings(String),

    #[error("insufficient funds (needs ${0})")]
    InsufficientFunds(Money),

    #[error("must build evenly across the color group")]
    UnevenBuild,

    #[error("must sell evenly across the color group")]
    UnevenSale,

    #[error("{0} has no buildings to sell")]
    NoBuildings(String),

    #[error("sell the buildings on {0} before mortgaging")]
    HousesOnProperty(String),

    #[error("sell all buildings in the color group before mortgaging")]
    HousesInGroup,
}

/// Development summary of one color group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupDevelopment {
    pub min_houses: u8,
    pub max_houses: u8,
    pub any_mortgaged: bool,
    pub any_built: bool,
}

/// Scan a color group once; shared by the build, sell, mortgage and trade
/// checks.
pub fn group_development(board: &Board, group: ColorGroup) -> GroupDevelopment {
    let mut dev = GroupDevelopment {
        min_houses: HOTEL,
        max_houses: 0,
        any_mortgaged: false,
        any_built: false,
    };

    let mut seen = false;
    for space in board.group(group) {
        seen = true;
        dev.min_houses = dev.min_houses.min(space.houses);
        dev.max_houses = dev.max_houses.max(space.houses);
        dev.any_mortgaged |= space.mortgaged;
        dev.any_built |= space.houses > 0;
    }
    if !seen {
        dev.min_houses = 0;
    }

    dev
}

/// Whether any property in `space`'s color group carries a building
pub fn group_has_buildings(board: &Board, space: &Space) -> bool {
    match space.group {
        Some(group) if space.is_property() => group_development(board, group).any_built,
        _ => false,
    }
}

/// Rent owed by a visitor landing on `space`.
///
/// Zero when the bank owns it or it is mortgaged. Utilities charge 4x or 10x
/// the dice; stations 25, 50, 100, 200 by count owned; streets use the house
/// tier, or double base rent on an undeveloped monopoly.
pub fn rent_due(space: &Space, board: &Board, dice_total: u8) -> Money {
    let owner = match space.owner {
        Some(owner) if !space.mortgaged => owner,
        _ => return 0,
    };
    let group = match space.group {
        Some(group) if space.is_property() => group,
        _ => return 0,
    };

    let unmortgaged_owned = || {
        board
            .group(group)
            .filter(|s| s.owner == Some(owner) && !s.mortgaged)
            .count() as u32
    };

    match group {
        ColorGroup::Utility => {
            let multiplier = if unmortgaged_owned() >= 2 { 10 } else { 4 };
            dice_total as Money * multiplier
        }
        ColorGroup::Station => {
            let owned = unmortgaged_owned().clamp(1, 4);
            25 * (1i64 << (owned - 1))
        }
        _ => {
            if space.houses > 0 {
                return space.rent[space.houses.min(HOTEL) as usize];
            }
            if board.owns_group(owner, group) {
                space.rent[0] * 2
            } else {
                space.rent[0]
            }
        }
    }
}

/// Fixed fee for landing on a tax tile, zero elsewhere
pub fn tax_due(space: &Space) -> Money {
    match space.kind {
        SpaceKind::Action(ActionTile::IncomeTax) => INCOME_TAX,
        SpaceKind::Action(ActionTile::LuxuryTax) => LUXURY_TAX,
        _ => 0,
    }
}

/// Cash received for mortgaging
pub fn mortgage_value(space: &Space) -> Money {
    space.price / 2
}

/// Cost to lift a mortgage: half the price plus 10%, rounded up
pub fn unmortgage_cost(space: &Space) -> Money {
    (space.price * 11 + 19) / 20
}

/// Cash received for selling one building
pub fn building_sale_value(space: &Space) -> Money {
    space.house_cost / 2
}

fn check_owner(player: &Player, property: &Space) -> Result<(), RuleViolation> {
    if !property.is_property() {
        return Err(RuleViolation::NotAProperty(property.name.clone()));
    }
    if property.owner != Some(player.id) {
        return Err(RuleViolation::NotOwner(property.name.clone()));
    }
    Ok(())
}

fn buildable_group(property: &Space) -> Result<ColorGroup, RuleViolation> {
    match property.group {
        Some(group) if property.is_property() && group.is_buildable() => Ok(group),
        _ => Err(RuleViolation::NotBuildable(property.name.clone())),
    }
}

/// Whether `player` may add one house (or the hotel) to `property`
pub fn can_build_house(player: &Player, property: &Space, board: &Board) -> Result<(), RuleViolation> {
    let group = buildable_group(property)?;
    check_owner(player, property)?;
    if property.mortgaged {
        return Err(RuleViolation::Mortgaged(property.name.clone()));
    }
    if !board.owns_group(player.id, group) {
        return Err(RuleViolation::IncompleteMonopoly);
    }

    let dev = group_development(board, group);
    if dev.any_mortgaged {
        return Err(RuleViolation::GroupMortgaged);
    }
    if property.houses >= HOTEL {
        return Err(RuleViolation::MaxBuildings(property.name.clone()));
    }
    if !player.can_afford(property.house_cost) {
        return Err(RuleViolation::InsufficientFunds(property.house_cost));
    }
    if property.houses > dev.min_houses {
        return Err(RuleViolation::UnevenBuild);
    }

    Ok(())
}

/// Whether `player` may sell one building from `property`
pub fn can_sell_house(player: &Player, property: &Space, board: &Board) -> Result<(), RuleViolation> {
    let group = buildable_group(property)?;
    check_owner(player, property)?;
    if property.houses == 0 {
        return Err(RuleViolation::NoBuildings(property.name.clone()));
    }
    if property.houses < group_development(board, group).max_houses {
        return Err(RuleViolation::UnevenSale);
    }
    Ok(())
}

/// Whether `player` may mortgage `property`
pub fn can_mortgage(player: &Player, property: &Space, board: &Board) -> Result<(), RuleViolation> {
    check_owner(player, property)?;
    if property.mortgaged {
        return Err(RuleViolation::AlreadyMortgaged(property.name.clone()));
    }
    if property.houses > 0 {
        return Err(RuleViolation::HousesOnProperty(property.name.clone()));
    }
    if group_has_buildings(board, property) {
        return Err(RuleViolation::HousesInGroup);
    }
    Ok(())
}

/// Whether `player` may lift the mortgage on `property`
pub fn can_unmortgage(player: &Player, property: &Space) -> Result<(), RuleViolation> {
    check_owner(player, property)?;
    if !property.mortgaged {
        return Err(RuleViolation::NotMortgaged(property.name.clone()));
    }
    let cost = unmortgage_cost(property);
    if !player.can_afford(cost) {
        return Err(RuleViolation::InsufficientFunds(cost));
    }
    Ok(())
}

/// Cash plus everything the player could raise by mortgaging and selling
/// buildings. Bankruptcy is only allowed while this is negative.
pub fn liquidation_value(player: &Player, board: &Board) -> Money {
    board.owned_by(player.id).fold(player.cash, |value, space| {
        let mortgage = if space.mortgaged { 0 } else { mortgage_value(space) };
        value + mortgage + space.houses as Money * building_sale_value(space)
    })
}
