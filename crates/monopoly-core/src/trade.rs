//! Bilateral trades between two players.

use crate::board::{Board, Money, PlayerId, SpaceId};
use crate::finance::group_has_buildings;
use crate::player::Player;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One side of a trade: cash plus a list of properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSide {
    pub cash: Money,
    pub properties: Vec<SpaceId>,
}

impl TradeSide {
    pub fn new(cash: Money, properties: &[&str]) -> Self {
        Self {
            cash,
            properties: properties.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cash == 0 && self.properties.is_empty()
    }
}

/// A trade offer between two players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    /// Player making the offer
    pub proposer: PlayerId,
    /// Player who must accept or reject
    pub counterparty: PlayerId,
    /// What the proposer gives
    pub offered: TradeSide,
    /// What the proposer asks for in return
    pub requested: TradeSide,
}

impl TradeOffer {
    pub fn new(proposer: PlayerId, counterparty: PlayerId, offered: TradeSide, requested: TradeSide) -> Self {
        Self {
            proposer,
            counterparty,
            offered,
            requested,
        }
    }
}

/// Why a trade cannot go ahead
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TradeViolation {
    #[error("invalid players involved in trade")]
    UnknownPlayer,

    #[error("cannot trade with yourself")]
    SelfTrade,

    #[error("cannot trade negative amounts")]
    NegativeCash,

    #[error("{name} does not have enough money (${amount})")]
    InsufficientCash { name: String, amount: Money },

    #[error("property {0} not found")]
    UnknownProperty(SpaceId),

    #[error("{owner} does not own {property}")]
    NotOwned { owner: String, property: String },

    #[error("{0} is listed more than once")]
    DuplicateProperty(String),

    #[error("cannot trade {0} because there are buildings in its color group")]
    BuildingsInGroup(String),
}

fn check_side(side: &TradeSide, owner: &Player, board: &Board) -> Result<(), TradeViolation> {
    for (i, id) in side.properties.iter().enumerate() {
        let space = board
            .get(id)
            .filter(|s| s.is_property())
            .ok_or_else(|| TradeViolation::UnknownProperty(id.clone()))?;

        if side.properties[..i].contains(id) {
            return Err(TradeViolation::DuplicateProperty(space.name.clone()));
        }
        if space.owner != Some(owner.id) {
            return Err(TradeViolation::NotOwned {
                owner: owner.name.clone(),
                property: space.name.clone(),
            });
        }
        if group_has_buildings(board, space) {
            return Err(TradeViolation::BuildingsInGroup(space.name.clone()));
        }
    }
    Ok(())
}

/// Check whether `offer` could be executed against the current holdings.
///
/// Run when the offer is made and again when it is accepted, since holdings
/// may change in between.
pub fn validate_trade(offer: &TradeOffer, players: &[Player], board: &Board) -> Result<(), TradeViolation> {
    let find = |id: PlayerId| players.iter().find(|p| p.id == id);
    let (proposer, counterparty) = match (find(offer.proposer), find(offer.counterparty)) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(TradeViolation::UnknownPlayer),
    };

    if proposer.id == counterparty.id {
        return Err(TradeViolation::SelfTrade);
    }
    if offer.offered.cash < 0 || offer.requested.cash < 0 {
        return Err(TradeViolation::NegativeCash);
    }
    if proposer.cash < offer.offered.cash {
        return Err(TradeViolation::InsufficientCash {
            name: proposer.name.clone(),
            amount: offer.offered.cash,
        });
    }
    if counterparty.cash < offer.requested.cash {
        return Err(TradeViolation::InsufficientCash {
            name: counterparty.name.clone(),
            amount: offer.requested.cash,
        });
    }

    check_side(&offer.offered, proposer, board)?;
    check_side(&offer.requested, counterparty, board)?;

    Ok(())
}
