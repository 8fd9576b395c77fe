//! Actions a player (or the bot acting for one) can submit.
//!
//! Actions carry only their own payload. Who is acting is implied by the
//! state: the current player, the bidder whose turn it is during an auction,
//! or the counterparty of a pending trade.

use crate::board::{Money, SpaceId};
use crate::trade::TradeOffer;
use serde::{Deserialize, Serialize};

/// All possible actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    // ==================== Movement ====================
    /// Roll and move (also the re-roll after doubles and the escape attempt
    /// from jail)
    RollDice,

    // ==================== Purchasing ====================
    /// Buy the unowned property just landed on
    BuyProperty,
    /// Pass on the property; it goes to auction
    DeclinePurchase,
    /// Bid in the running auction
    PlaceBid(Money),
    /// Leave the running auction
    FoldAuction,

    // ==================== Property Management ====================
    BuildHouse(SpaceId),
    SellBuilding(SpaceId),
    MortgageProperty(SpaceId),
    UnmortgageProperty(SpaceId),

    // ==================== Jail ====================
    PayJailFine,
    UseJailCard,

    // ==================== Cards ====================
    /// Carry out the card just drawn
    ApplyCard,

    // ==================== Trading ====================
    /// Start composing a trade
    SetupTrade,
    /// Propose the composed trade to its counterparty
    CreateTrade(TradeOffer),
    /// Counterparty accepts the pending trade
    AcceptTrade,
    /// Counterparty turns the pending trade down
    RejectTrade,
    /// Proposer withdraws the trade
    CancelTrade,

    // ==================== Turn Management ====================
    /// Give up: only allowed when even selling everything can't cover the debt
    DeclareBankruptcy,
    /// End your turn
    EndTurn,
}
