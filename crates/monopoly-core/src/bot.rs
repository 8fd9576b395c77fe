//! Computer-controlled players.
//!
//! The agent is a pure function of the game state: `decide` looks at whoever
//! must act next and, if that player is a bot, proposes one action. Scheduling
//! (when to call it, how long to "think") belongs to the caller.
//!
//! Personalities shift the thresholds:
//! - Aggressive: buys on thin margins, bids high, builds early
//! - Balanced: the reference thresholds
//! - Conservative: keeps a large cash cushion

use crate::actions::Action;
use crate::board::{Board, Money, Space};
use crate::finance;
use crate::game::{AuctionState, GameState, TradeStage, TurnPhase};
use crate::movement::JAIL_FINE;
use crate::player::Player;
use crate::trade::TradeOffer;
use serde::{Deserialize, Serialize};

/// Bot personality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotPersonality {
    Aggressive,
    #[default]
    Balanced,
    Conservative,
}

/// Decision thresholds for one personality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotProfile {
    /// Pay the jail fine only when cash exceeds this
    pub jail_fine_threshold: Money,
    /// Cash that must remain after buying a property
    pub buy_buffer: Money,
    /// Auction valuation as a fraction of list price
    pub auction_valuation: f64,
    /// Largest share of cash the bot will bid
    pub bid_cash_fraction: f64,
    pub bid_increment: Money,
    /// Cash that must remain after building
    pub build_reserve: Money,
    /// Trades scoring above this are accepted
    pub accept_threshold: f64,
    /// Trades scoring within this far below the accept threshold draw a counter
    pub counter_band: f64,
}

impl BotProfile {
    pub fn for_personality(personality: BotPersonality) -> Self {
        match personality {
            BotPersonality::Aggressive => Self {
                jail_fine_threshold: 600,
                buy_buffer: 100,
                auction_valuation: 1.0,
                bid_cash_fraction: 0.7,
                bid_increment: 10,
                build_reserve: 200,
                accept_threshold: 0.0,
                counter_band: 100.0,
            },
            BotPersonality::Balanced => Self {
                jail_fine_threshold: 1000,
                buy_buffer: 300,
                auction_valuation: 0.8,
                bid_cash_fraction: 0.5,
                bid_increment: 10,
                build_reserve: 500,
                accept_threshold: 0.0,
                counter_band: 100.0,
            },
            BotPersonality::Conservative => Self {
                jail_fine_threshold: 1400,
                buy_buffer: 500,
                auction_valuation: 0.6,
                bid_cash_fraction: 0.3,
                bid_increment: 10,
                build_reserve: 800,
                accept_threshold: 50.0,
                counter_band: 100.0,
            },
        }
    }
}

impl Default for BotProfile {
    fn default() -> Self {
        Self::for_personality(BotPersonality::default())
    }
}

/// What the bot makes of a trade offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TradeDecision {
    Accept,
    /// The bot would take the deal for a little more cash
    Counter(TradeOffer),
    Reject,
}

/// Score and decision for a trade offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvaluation {
    /// Positive is good for the bot
    pub score: f64,
    pub decision: TradeDecision,
}

/// Extra cash asked for in a counter offer
pub const COUNTER_PREMIUM: Money = 100;

/// Propose the next action for the acting player, if it is a bot
pub fn decide(state: &GameState) -> Option<Action> {
    if state.is_finished() {
        return None;
    }
    let player = state.get_player(state.acting_player()?)?;
    let profile = BotProfile::for_personality(player.personality()?);

    let action = match &state.phase {
        TurnPhase::Ended => return None,
        TurnPhase::Trade(TradeStage::Pending { offer, .. }) => {
            match evaluate_trade(offer, player, &state.board, &profile).decision {
                TradeDecision::Accept => Action::AcceptTrade,
                // Counter offers are not executable yet
                TradeDecision::Counter(_) | TradeDecision::Reject => Action::RejectTrade,
            }
        }
        TurnPhase::Trade(TradeStage::Composing { .. }) => Action::CancelTrade,
        TurnPhase::Auction(auction) => bid_or_fold(auction, player, &state.board, &profile),
        TurnPhase::Card(_) => Action::ApplyCard,
        TurnPhase::Roll => match raise_cash(player, &state.board) {
            Some(action) => action,
            None => leave_jail_or_roll(player, &profile),
        },
        TurnPhase::Action | TurnPhase::End => match raise_cash(player, &state.board) {
            Some(action) => action,
            None => act_after_landing(state, player, &profile),
        },
    };

    Some(action)
}

// ==================== Turn Decisions ====================

fn leave_jail_or_roll(player: &Player, profile: &BotProfile) -> Action {
    if !player.in_jail {
        return Action::RollDice;
    }
    if player.cash > profile.jail_fine_threshold && player.can_afford(JAIL_FINE) {
        Action::PayJailFine
    } else if player.jail_free_cards > 0 {
        Action::UseJailCard
    } else {
        Action::RollDice
    }
}

fn act_after_landing(state: &GameState, player: &Player, profile: &BotProfile) -> Action {
    let here = state.board.at(player.position);
    if state.phase == TurnPhase::Action && here.is_for_sale() {
        return if player.cash >= here.price + profile.buy_buffer {
            Action::BuyProperty
        } else {
            Action::DeclinePurchase
        };
    }
    if let Some(space) = best_build(player, &state.board, profile) {
        return Action::BuildHouse(space.id.clone());
    }
    if state.pending_double() {
        return Action::RollDice;
    }
    Action::EndTurn
}

/// Most valuable property the bot can develop while keeping its reserve
fn best_build<'a>(player: &Player, board: &'a Board, profile: &BotProfile) -> Option<&'a Space> {
    board
        .owned_by(player.id)
        .filter(|s| player.cash - s.house_cost >= profile.build_reserve)
        .filter(|s| finance::can_build_house(player, s, board).is_ok())
        .max_by_key(|s| s.index)
}

/// Sell or mortgage to get out of debt; bankruptcy once nothing is left
fn raise_cash(player: &Player, board: &Board) -> Option<Action> {
    if player.cash >= 0 {
        return None;
    }

    let sale = board
        .owned_by(player.id)
        .filter(|s| finance::can_sell_house(player, s, board).is_ok())
        .max_by_key(|s| (s.houses, s.house_cost));
    if let Some(space) = sale {
        return Some(Action::SellBuilding(space.id.clone()));
    }

    let mortgage = board
        .owned_by(player.id)
        .filter(|s| finance::can_mortgage(player, s, board).is_ok())
        .min_by_key(|s| (s.price, s.index));
    if let Some(space) = mortgage {
        return Some(Action::MortgageProperty(space.id.clone()));
    }

    Some(Action::DeclareBankruptcy)
}

// ==================== Auctions ====================

fn bid_or_fold(auction: &AuctionState, player: &Player, board: &Board, profile: &BotProfile) -> Action {
    let price = board.get(&auction.property).map_or(0, |s| s.price);
    let valuation = price as f64 * profile.auction_valuation;
    let budget = player.cash as f64 * profile.bid_cash_fraction;
    let bid = auction.highest_bid + profile.bid_increment;

    if bid as f64 <= valuation && bid as f64 <= budget && player.can_afford(bid) {
        Action::PlaceBid(bid)
    } else {
        Action::FoldAuction
    }
}

// ==================== Trade Evaluation ====================

/// Value of `property` to `holder`, ignoring whether `holder` owns it now
fn property_value(property: &Space, holder: &Player, board: &Board) -> f64 {
    let mut value = property.price as f64;

    if let Some(group) = property.group {
        let total = board.group(group).count();
        let mut held = board.count_owned_in_group(holder.id, group);
        if property.owner == Some(holder.id) {
            held -= 1;
        }
        if held + 1 == total {
            value *= 3.0;
        } else if held > 0 {
            value *= 1.5;
        }
    }
    if property.mortgaged {
        value *= 0.5;
    }

    value + (property.houses as Money * property.house_cost) as f64
}

fn side_value(cash: Money, properties: &[String], holder: &Player, board: &Board) -> f64 {
    properties
        .iter()
        .filter_map(|id| board.get(id))
        .map(|space| property_value(space, holder, board))
        .sum::<f64>()
        + cash as f64
}

/// Score an offer addressed to `bot`: what it would receive minus what it
/// would give up
pub fn evaluate_trade(offer: &TradeOffer, bot: &Player, board: &Board, profile: &BotProfile) -> TradeEvaluation {
    let receiving = side_value(offer.offered.cash, &offer.offered.properties, bot, board);
    let giving = side_value(offer.requested.cash, &offer.requested.properties, bot, board);
    let score = receiving - giving;

    let decision = if score > profile.accept_threshold {
        TradeDecision::Accept
    } else if score > profile.accept_threshold - profile.counter_band {
        let mut counter = offer.clone();
        counter.offered.cash += COUNTER_PREMIUM;
        TradeDecision::Counter(counter)
    } else {
        TradeDecision::Reject
    };

    TradeEvaluation { score, decision }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameSettings, PlayerSeat};
    use crate::trade::TradeSide;

    fn bots() -> GameState {
        let seats = vec![
            PlayerSeat::bot("Ada", BotPersonality::Balanced),
            PlayerSeat::bot("Bit", BotPersonality::Balanced),
            PlayerSeat::human("Hal"),
        ];
        GameState::new(seats, GameSettings::default(), 11).unwrap()
    }

    fn own(state: &mut GameState, seat: usize, id: &str) {
        let owner = state.players[seat].id;
        state.board.set_owner(id, Some(owner));
        state.players[seat].add_property(id);
    }

    #[test]
    fn test_balanced_profile() {
        let profile = BotProfile::default();
        assert_eq!(profile.jail_fine_threshold, 1000);
        assert_eq!(profile.buy_buffer, 300);
        assert_eq!(profile.auction_valuation, 0.8);
        assert_eq!(profile.bid_cash_fraction, 0.5);
        assert_eq!(profile.bid_increment, 10);
    }

    #[test]
    fn test_humans_get_no_decision() {
        let mut state = bots();
        state.current_player = 2;
        assert_eq!(decide(&state), None);
    }

    #[test]
    fn test_free_bot_rolls() {
        assert_eq!(decide(&bots()), Some(Action::RollDice));
    }

    #[test]
    fn test_jailed_bot() {
        let mut state = bots();
        state.players[0].send_to_jail();
        assert_eq!(decide(&state), Some(Action::PayJailFine));

        state.players[0].cash = 400;
        assert_eq!(decide(&state), Some(Action::RollDice));

        state.players[0].jail_free_cards = 1;
        assert_eq!(decide(&state), Some(Action::UseJailCard));
    }

    #[test]
    fn test_buy_keeps_safety_buffer() {
        let mut state = bots();
        state.players[0].position = 3;
        state.phase = TurnPhase::Action;
        assert_eq!(decide(&state), Some(Action::BuyProperty));

        state.players[0].cash = 300;
        assert_eq!(decide(&state), Some(Action::DeclinePurchase));
    }

    #[test]
    fn test_end_turn_or_reroll() {
        let mut state = bots();
        state.phase = TurnPhase::End;
        assert_eq!(decide(&state), Some(Action::EndTurn));

        state.doubles_count = 1;
        assert_eq!(decide(&state), Some(Action::RollDice));
    }

    #[test]
    fn test_builds_on_monopoly_with_spare_cash() {
        let mut state = bots();
        own(&mut state, 0, "park_place");
        own(&mut state, 0, "boardwalk");
        state.phase = TurnPhase::End;
        assert_eq!(decide(&state), Some(Action::BuildHouse("boardwalk".into())));

        state.players[0].cash = 600;
        assert_eq!(decide(&state), Some(Action::EndTurn));
    }

    #[test]
    fn test_auction_bidding() {
        let mut state = bots();
        state.phase = TurnPhase::Auction(AuctionState {
            property: "baltic".into(),
            highest_bid: 30,
            highest_bidder: Some(2),
            bidders: vec![0, 2],
            turn: 0,
        });
        assert_eq!(decide(&state), Some(Action::PlaceBid(40)));

        if let TurnPhase::Auction(auction) = &mut state.phase {
            auction.highest_bid = 40;
        }
        assert_eq!(decide(&state), Some(Action::FoldAuction));
    }

    #[test]
    fn test_bid_capped_by_half_cash() {
        let mut state = bots();
        state.players[0].cash = 70;
        state.phase = TurnPhase::Auction(AuctionState {
            property: "boardwalk".into(),
            highest_bid: 30,
            highest_bidder: Some(2),
            bidders: vec![0, 2],
            turn: 0,
        });
        assert_eq!(decide(&state), Some(Action::FoldAuction));
    }

    #[test]
    fn test_debt_sells_then_mortgages_then_quits() {
        let mut state = bots();
        own(&mut state, 0, "mediterranean");
        own(&mut state, 0, "baltic");
        own(&mut state, 0, "oriental");
        state.board.get_mut("baltic").unwrap().houses = 1;
        state.players[0].cash = -20;
        state.phase = TurnPhase::Action;
        assert_eq!(decide(&state), Some(Action::SellBuilding("baltic".into())));

        state.board.get_mut("baltic").unwrap().houses = 0;
        assert_eq!(decide(&state), Some(Action::MortgageProperty("mediterranean".into())));

        for id in ["mediterranean", "baltic", "oriental"] {
            state.board.get_mut(id).unwrap().mortgaged = true;
        }
        assert_eq!(decide(&state), Some(Action::DeclareBankruptcy));
    }

    #[test]
    fn test_card_is_applied() {
        let mut state = bots();
        state.chance.stack_on_top("ch_dividend");
        let card = state.chance.draw().unwrap();
        state.phase = TurnPhase::Card(card);
        assert_eq!(decide(&state), Some(Action::ApplyCard));
    }

    #[test]
    fn test_trade_completing_monopoly_is_accepted() {
        let mut state = bots();
        own(&mut state, 0, "boardwalk");
        own(&mut state, 1, "park_place");
        let offer = TradeOffer::new(0, 1, TradeSide::new(0, &["boardwalk"]), TradeSide::new(100, &[]));

        let eval = evaluate_trade(&offer, &state.players[1], &state.board, &BotProfile::default());
        assert_eq!(eval.score, 1100.0);
        assert_eq!(eval.decision, TradeDecision::Accept);

        state.phase = TurnPhase::Trade(TradeStage::Pending {
            offer,
            resume: crate::game::ResumePhase::Action,
        });
        assert_eq!(decide(&state), Some(Action::AcceptTrade));
    }

    #[test]
    fn test_lopsided_trade_is_rejected() {
        let mut state = bots();
        own(&mut state, 1, "park_place");
        let offer = TradeOffer::new(0, 1, TradeSide::default(), TradeSide::new(0, &["park_place"]));
        let eval = evaluate_trade(&offer, &state.players[1], &state.board, &BotProfile::default());
        assert_eq!(eval.score, -350.0);
        assert_eq!(eval.decision, TradeDecision::Reject);
    }

    #[test]
    fn test_near_miss_draws_counter() {
        let mut state = bots();
        own(&mut state, 1, "park_place");
        let offer = TradeOffer::new(0, 1, TradeSide::new(300, &[]), TradeSide::new(0, &["park_place"]));
        let eval = evaluate_trade(&offer, &state.players[1], &state.board, &BotProfile::default());
        assert_eq!(eval.score, -50.0);
        match eval.decision {
            TradeDecision::Counter(counter) => assert_eq!(counter.offered.cash, 400),
            other => panic!("expected counter, got {:?}", other),
        }

        state.phase = TurnPhase::Trade(TradeStage::Pending {
            offer,
            resume: crate::game::ResumePhase::Roll,
        });
        assert_eq!(decide(&state), Some(Action::RejectTrade));
    }
}
