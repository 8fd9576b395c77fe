//! Core game state machine.
//!
//! This module contains the `GameState` struct and the single transition
//! `(state, action) -> state`. Invalid actions never fail outward: the state
//! comes back unchanged apart from `last_action`, which explains the refusal.

use crate::actions::Action;
use crate::board::{ActionTile, Board, CornerTile, Money, PlayerId, Space, SpaceId, SpaceKind};
use crate::cards::{Card, CardEffect, Deck, DeckKind, NearestKind};
use crate::config::{GameSettings, PlayerSeat, MAX_PLAYERS, MIN_PLAYERS};
use crate::finance::{self, RuleViolation};
use crate::movement::{self, GO_SALARY, JAIL_FINE, MAX_JAIL_ROLLS, SPEEDING_DOUBLES};
use crate::player::{Player, TokenColor};
use crate::random::RandomSource;
use crate::trade::{self, TradeOffer, TradeViolation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Smallest raise offered by `valid_actions` and the bot
pub const MIN_BID_INCREMENT: Money = 10;

/// A running auction over one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionState {
    pub property: SpaceId,
    pub highest_bid: Money,
    pub highest_bidder: Option<PlayerId>,
    /// Bidders still in, in turn order
    pub bidders: Vec<PlayerId>,
    /// Index into `bidders` of whose turn it is
    pub turn: usize,
}

impl AuctionState {
    /// The bidder who must act next
    pub fn current_bidder(&self) -> Option<PlayerId> {
        self.bidders.get(self.turn).copied()
    }
}

/// Phase a trade returns to once it is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResumePhase {
    Roll,
    Action,
    End,
}

impl ResumePhase {
    fn phase(self) -> TurnPhase {
        match self {
            ResumePhase::Roll => TurnPhase::Roll,
            ResumePhase::Action => TurnPhase::Action,
            ResumePhase::End => TurnPhase::End,
        }
    }
}

/// Trade sub-state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStage {
    /// The current player is putting an offer together
    Composing { resume: ResumePhase },
    /// The offer awaits the counterparty's answer
    Pending { offer: TradeOffer, resume: ResumePhase },
}

/// Turn phase. Sub-state payloads live inside their phase, so an auction
/// can only be read while one is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Waiting for the current player to roll
    Roll,
    /// Landed; may buy, build, trade or end the turn
    Action,
    /// A drawn card waits to be applied
    Card(Card),
    Auction(AuctionState),
    Trade(TradeStage),
    /// Nothing left to decide this turn
    End,
    /// Game over
    Ended,
}

/// Overall game status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Concluded { winner: PlayerId },
}

/// How the last token movement happened, for animation only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveHint {
    Forward,
    Backward,
    Teleport,
    ToJail,
}

/// Errors explaining why an action was refused
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Game is over")]
    GameOver,

    #[error("Invalid action for current phase")]
    InvalidPhase,

    #[error("Unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("Unknown space {0}")]
    UnknownSpace(String),

    #[error("{0} is not for sale")]
    NotForSale(String),

    #[error("Cannot afford ${0}")]
    CannotAfford(Money),

    #[error("Bid must exceed ${0}")]
    BidTooLow(Money),

    #[error("The highest bidder cannot fold")]
    HighestBidderCannotFold,

    #[error("Not in jail")]
    NotInJail,

    #[error("No Get Out of Jail Free card")]
    NoJailCard,

    #[error("Must raise cash, mortgage or declare bankruptcy first")]
    NegativeCash,

    #[error("Rolled doubles: must roll again")]
    MustRollAgain,

    #[error("Buy or decline {0} before rolling again")]
    PurchasePending(String),

    #[error("Cannot declare bankruptcy while assets cover debts (${0})")]
    NotInsolvent(Money),

    #[error("Trading is disabled")]
    TradingDisabled,

    #[error("Only the current player can propose a trade")]
    NotProposer,

    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error(transparent)]
    Trade(#[from] TradeViolation),
}

/// Errors creating a game
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Need at least 2 players, got {0}")]
    TooFewPlayers(usize),

    #[error("At most 8 players, got {0}")]
    TooManyPlayers(usize),

    #[error("Player {0} has no name")]
    EmptyName(usize),

    #[error("Duplicate player name {0}")]
    DuplicateName(String),

    #[error("Starting cash must be positive")]
    InvalidStartingCash,
}

/// Extra rent some cards impose on the space they move you to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RentBoost {
    None,
    DoubleStation,
    TenfoldUtility,
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Players still in the game, in fixed turn order
    pub players: Vec<Player>,
    pub current_player: PlayerId,
    pub board: Board,
    /// Last dice roll
    pub dice: (u8, u8),
    /// Doubles rolled in a row this turn
    pub doubles_count: u8,
    pub status: GameStatus,
    pub phase: TurnPhase,
    pub chance: Deck,
    pub community_chest: Deck,
    /// Human-readable description of what the last action did
    pub last_action: String,
    pub last_move: Option<MoveHint>,
    /// Where the token was when it was sent to jail
    pub jail_entry_from: Option<u8>,
    /// Turns completed (starts at 1)
    pub turn_number: u32,
    pub settings: GameSettings,
    /// Seed for the next `apply` (for deterministic replays)
    rng_seed: u64,
}

impl GameState {
    /// Create a game. Seats are in turn order; the seed fixes deck order and
    /// every later roll made through [`GameState::apply`].
    pub fn new(seats: Vec<PlayerSeat>, settings: GameSettings, seed: u64) -> Result<Self, SetupError> {
        if seats.len() < MIN_PLAYERS {
            return Err(SetupError::TooFewPlayers(seats.len()));
        }
        if seats.len() > MAX_PLAYERS {
            return Err(SetupError::TooManyPlayers(seats.len()));
        }
        if settings.starting_cash <= 0 {
            return Err(SetupError::InvalidStartingCash);
        }
        for (i, seat) in seats.iter().enumerate() {
            let name = seat.name.trim();
            if name.is_empty() {
                return Err(SetupError::EmptyName(i));
            }
            if seats[..i].iter().any(|s| s.name.trim() == name) {
                return Err(SetupError::DuplicateName(name.to_string()));
            }
        }

        let players: Vec<Player> = seats
            .into_iter()
            .enumerate()
            .map(|(i, seat)| {
                let id = i as PlayerId;
                let color = seat.color.unwrap_or_else(|| TokenColor::for_player(id));
                Player::new(id, seat.name.trim().to_string(), seat.kind, color, settings.starting_cash)
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(seed);
        let chance = Deck::shuffled(DeckKind::Chance, &mut rng);
        let community_chest = Deck::shuffled(DeckKind::CommunityChest, &mut rng);

        Ok(Self {
            current_player: players[0].id,
            players,
            board: Board::standard(),
            dice: (0, 0),
            doubles_count: 0,
            status: GameStatus::InProgress,
            phase: TurnPhase::Roll,
            chance,
            community_chest,
            last_action: "Game started".to_string(),
            last_move: None,
            jail_entry_from: None,
            turn_number: 1,
            settings,
            rng_seed: rng.gen(),
        })
    }

    // ==================== Queries ====================

    /// Get a player by ID
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn get_player_mut(&mut self, id: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GameError::UnknownPlayer(id))
    }

    fn player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.get_player(id).ok_or(GameError::UnknownPlayer(id))
    }

    /// The player whose turn it is
    pub fn current(&self) -> Option<&Player> {
        self.get_player(self.current_player)
    }

    /// The player who must act next: the bidder during an auction, the
    /// counterparty of a pending trade, otherwise the current player
    pub fn acting_player(&self) -> Option<PlayerId> {
        match &self.phase {
            TurnPhase::Ended => None,
            TurnPhase::Auction(auction) => auction.current_bidder(),
            TurnPhase::Trade(TradeStage::Pending { offer, .. }) => Some(offer.counterparty),
            _ => Some(self.current_player),
        }
    }

    pub fn active_card(&self) -> Option<&Card> {
        match &self.phase {
            TurnPhase::Card(card) => Some(card),
            _ => None,
        }
    }

    pub fn auction(&self) -> Option<&AuctionState> {
        match &self.phase {
            TurnPhase::Auction(auction) => Some(auction),
            _ => None,
        }
    }

    /// The offer awaiting an answer, if any
    pub fn active_trade(&self) -> Option<&TradeOffer> {
        match &self.phase {
            TurnPhase::Trade(TradeStage::Pending { offer, .. }) => Some(offer),
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.status {
            GameStatus::Concluded { winner } => Some(winner),
            GameStatus::InProgress => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, GameStatus::Concluded { .. })
    }

    /// Whether the current player rolled doubles and still owes a roll
    pub fn pending_double(&self) -> bool {
        self.doubles_count > 0 && self.current().map_or(false, |p| !p.in_jail)
    }

    fn dice_total(&self) -> u8 {
        self.dice.0 + self.dice.1
    }

    fn next_player_after(&self, id: PlayerId) -> PlayerId {
        match self.players.iter().position(|p| p.id == id) {
            Some(i) => self.players[(i + 1) % self.players.len()].id,
            None => self.players.first().map_or(id, |p| p.id),
        }
    }

    // ==================== Transition ====================

    /// Apply an action, drawing dice from the seed carried in the state
    pub fn apply(&self, action: Action) -> GameState {
        let mut rng = StdRng::seed_from_u64(self.rng_seed);
        match self.try_apply(action, &mut rng) {
            Ok(mut next) => {
                next.rng_seed = rng.gen();
                next
            }
            Err(err) => self.refused(err),
        }
    }

    /// Apply an action with an explicit randomness source. A refused action
    /// returns the state unchanged except for `last_action`.
    pub fn apply_with<R: RandomSource + ?Sized>(&self, action: Action, rng: &mut R) -> GameState {
        self.try_apply(action, rng).unwrap_or_else(|err| self.refused(err))
    }

    fn refused(&self, err: GameError) -> GameState {
        debug!(error = %err, "action refused");
        let mut unchanged = self.clone();
        unchanged.last_action = err.to_string();
        unchanged
    }

    /// Apply an action, reporting why it was refused
    pub fn try_apply<R: RandomSource + ?Sized>(&self, action: Action, rng: &mut R) -> Result<GameState, GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }

        let mut next = self.clone();
        next.last_action.clear();

        match action {
            Action::RollDice => next.roll_dice(rng)?,
            Action::BuyProperty => next.buy_property()?,
            Action::DeclinePurchase => next.decline_purchase()?,
            Action::PlaceBid(amount) => next.place_bid(amount)?,
            Action::FoldAuction => next.fold_auction()?,
            Action::BuildHouse(id) => next.build_house(&id)?,
            Action::SellBuilding(id) => next.sell_building(&id)?,
            Action::MortgageProperty(id) => next.mortgage(&id)?,
            Action::UnmortgageProperty(id) => next.unmortgage(&id)?,
            Action::PayJailFine => next.pay_jail_fine()?,
            Action::UseJailCard => next.use_jail_card()?,
            Action::ApplyCard => next.apply_card()?,
            Action::SetupTrade => next.setup_trade()?,
            Action::CreateTrade(offer) => next.create_trade(offer)?,
            Action::AcceptTrade => next.accept_trade()?,
            Action::RejectTrade => next.reject_trade()?,
            Action::CancelTrade => next.cancel_trade()?,
            Action::DeclareBankruptcy => next.declare_bankruptcy()?,
            Action::EndTurn => next.end_turn()?,
        }

        Ok(next)
    }

    fn log(&mut self, message: impl AsRef<str>) {
        if !self.last_action.is_empty() {
            self.last_action.push_str("; ");
        }
        self.last_action.push_str(message.as_ref());
    }

    /// The unowned property the current player landed on and has not yet
    /// bought or declined
    fn purchase_pending(&self) -> Option<&Space> {
        if self.phase != TurnPhase::Action {
            return None;
        }
        let position = self.current()?.position;
        Some(self.board.at(position)).filter(|space| space.is_for_sale())
    }

    fn current_name(&self) -> String {
        self.current().map(|p| p.name.clone()).unwrap_or_default()
    }

    // ==================== Dice & Movement ====================

    fn roll_dice<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        let pid = self.current_player;
        match self.phase {
            TurnPhase::Roll => {}
            TurnPhase::Action | TurnPhase::End if self.pending_double() => {}
            _ => return Err(GameError::InvalidPhase),
        }
        let player = self.player(pid)?;
        if player.cash < 0 {
            return Err(GameError::NegativeCash);
        }
        if let Some(space) = self.purchase_pending() {
            return Err(GameError::PurchasePending(space.name.clone()));
        }
        let jailed = player.in_jail;
        let name = player.name.clone();

        let dice = movement::roll_dice(rng);
        let total = dice.0 + dice.1;
        self.dice = dice;
        self.last_move = None;
        self.jail_entry_from = None;

        if jailed {
            return self.roll_in_jail(pid, name, dice);
        }

        if movement::is_double(dice) {
            self.doubles_count += 1;
            if self.doubles_count >= SPEEDING_DOUBLES {
                self.log(format!("{} rolled doubles three times and went to jail", name));
                self.send_to_jail(pid)?;
                self.phase = TurnPhase::End;
                return Ok(());
            }
        } else {
            self.doubles_count = 0;
        }

        self.log(format!("{} rolled {} ({}, {})", name, total, dice.0, dice.1));
        self.move_forward(pid, total)?;
        self.resolve_landing(pid, RentBoost::None)
    }

    fn roll_in_jail(&mut self, pid: PlayerId, name: String, dice: (u8, u8)) -> Result<(), GameError> {
        let total = dice.0 + dice.1;
        self.doubles_count = 0;

        if movement::is_double(dice) {
            self.get_player_mut(pid)?.release_from_jail();
            self.log(format!("{} rolled doubles ({}, {}) and left jail", name, dice.0, dice.1));
        } else {
            let player = self.get_player_mut(pid)?;
            player.jail_turns += 1;
            let attempts = player.jail_turns;
            if attempts < MAX_JAIL_ROLLS {
                self.log(format!(
                    "{} failed to roll doubles ({}/{})",
                    name, attempts, MAX_JAIL_ROLLS
                ));
                self.phase = TurnPhase::End;
                return Ok(());
            }
            player.cash -= JAIL_FINE;
            player.release_from_jail();
            self.log(format!(
                "{} failed a third time, paid ${} and left jail",
                name, JAIL_FINE
            ));
        }

        self.move_forward(pid, total)?;
        self.resolve_landing(pid, RentBoost::None)
    }

    fn move_forward(&mut self, pid: PlayerId, spaces: u8) -> Result<(), GameError> {
        let player = self.get_player_mut(pid)?;
        let (position, passed_go) = movement::advance(player.position, spaces);
        player.position = position;
        if passed_go {
            player.cash += GO_SALARY;
        }
        self.last_move = Some(MoveHint::Forward);
        if passed_go {
            self.log(format!("passed GO and collected ${}", GO_SALARY));
        }
        Ok(())
    }

    /// Jump straight to `index`, collecting GO if the jump wraps the board
    fn move_to(&mut self, pid: PlayerId, index: u8, collect_go: bool) -> Result<(), GameError> {
        let player = self.get_player_mut(pid)?;
        let passed_go = index < player.position;
        player.position = index;
        let paid = collect_go && passed_go;
        if paid {
            player.cash += GO_SALARY;
        }
        self.last_move = Some(MoveHint::Teleport);
        if paid {
            self.log(format!("passed GO and collected ${}", GO_SALARY));
        }
        Ok(())
    }

    fn send_to_jail(&mut self, pid: PlayerId) -> Result<(), GameError> {
        let player = self.get_player_mut(pid)?;
        let from = player.position;
        player.send_to_jail();
        self.jail_entry_from = Some(from);
        self.last_move = Some(MoveHint::ToJail);
        self.doubles_count = 0;
        Ok(())
    }

    /// Move cash from one player to another, or to the bank when `to` is
    /// `None`. The payer's balance may go negative.
    fn transfer(&mut self, from: PlayerId, to: Option<PlayerId>, amount: Money) -> Result<(), GameError> {
        self.get_player_mut(from)?.cash -= amount;
        if let Some(to) = to {
            self.get_player_mut(to)?.cash += amount;
        }
        Ok(())
    }

    /// Settle whatever the space under the player demands and pick the next
    /// phase
    fn resolve_landing(&mut self, pid: PlayerId, boost: RentBoost) -> Result<(), GameError> {
        let position = self.player(pid)?.position;
        let space = self.board.at(position).clone();
        self.log(format!("landed on {}", space.name));

        match space.kind {
            SpaceKind::Corner(CornerTile::GoToJail) => {
                self.send_to_jail(pid)?;
                self.log("went to jail");
                self.phase = TurnPhase::End;
            }
            SpaceKind::Action(ActionTile::Chance) => self.draw_card(DeckKind::Chance),
            SpaceKind::Action(ActionTile::CommunityChest) => self.draw_card(DeckKind::CommunityChest),
            SpaceKind::Action(_) => {
                let fee = finance::tax_due(&space);
                self.transfer(pid, None, fee)?;
                self.log(format!("paid ${} tax", fee));
                self.phase = TurnPhase::Action;
            }
            SpaceKind::Property => {
                if let Some(owner) = space.owner.filter(|&o| o != pid) {
                    let rent = match boost {
                        RentBoost::None => finance::rent_due(&space, &self.board, self.dice_total()),
                        RentBoost::DoubleStation => 2 * finance::rent_due(&space, &self.board, self.dice_total()),
                        RentBoost::TenfoldUtility if !space.mortgaged => 10 * self.dice_total() as Money,
                        RentBoost::TenfoldUtility => 0,
                    };
                    if rent > 0 {
                        self.transfer(pid, Some(owner), rent)?;
                        let owner_name = self.player(owner)?.name.clone();
                        self.log(format!("paid ${} rent to {}", rent, owner_name));
                    }
                }
                self.phase = TurnPhase::Action;
            }
            SpaceKind::Corner(_) => self.phase = TurnPhase::Action,
        }

        Ok(())
    }

    fn draw_card(&mut self, kind: DeckKind) {
        let deck = match kind {
            DeckKind::Chance => &mut self.chance,
            DeckKind::CommunityChest => &mut self.community_chest,
        };
        match deck.draw() {
            Some(card) => {
                self.log(format!("drew \"{}\"", card.text));
                self.phase = TurnPhase::Card(card);
            }
            None => self.phase = TurnPhase::Action,
        }
    }

    // ==================== Cards ====================

    fn apply_card(&mut self) -> Result<(), GameError> {
        let card = match &self.phase {
            TurnPhase::Card(card) => card.clone(),
            _ => return Err(GameError::InvalidPhase),
        };
        let pid = self.current_player;
        let name = self.current_name();
        self.phase = TurnPhase::Action;
        self.log(format!("{}: {}", name, card.text));

        match card.effect {
            CardEffect::MoveTo { index, collect_go } => {
                self.move_to(pid, index, collect_go)?;
                self.resolve_landing(pid, RentBoost::None)?;
            }
            CardEffect::MoveRelative(spaces) if spaces >= 0 => {
                self.move_forward(pid, spaces as u8)?;
                self.resolve_landing(pid, RentBoost::None)?;
            }
            CardEffect::MoveRelative(spaces) => {
                let player = self.get_player_mut(pid)?;
                player.position = movement::step_back(player.position, spaces.unsigned_abs());
                self.last_move = Some(MoveHint::Backward);
                self.resolve_landing(pid, RentBoost::None)?;
            }
            CardEffect::Collect(amount) => self.get_player_mut(pid)?.cash += amount,
            CardEffect::Pay(amount) => self.transfer(pid, None, amount)?,
            CardEffect::CollectFromEach(amount) => {
                let others: Vec<PlayerId> = self.players.iter().map(|p| p.id).filter(|&id| id != pid).collect();
                for other in others {
                    self.transfer(other, Some(pid), amount)?;
                }
            }
            CardEffect::PayEach(amount) => {
                let others: Vec<PlayerId> = self.players.iter().map(|p| p.id).filter(|&id| id != pid).collect();
                for other in others {
                    self.transfer(pid, Some(other), amount)?;
                }
            }
            CardEffect::StreetRepairs { per_house, per_hotel } => {
                let (houses, hotels) = self.board.buildings_of(pid);
                let levy = houses as Money * per_house + hotels as Money * per_hotel;
                self.transfer(pid, None, levy)?;
                self.log(format!("paid ${} for repairs", levy));
            }
            CardEffect::GoToJail => {
                self.send_to_jail(pid)?;
                self.phase = TurnPhase::End;
            }
            CardEffect::JailFree => self.get_player_mut(pid)?.jail_free_cards += 1,
            CardEffect::MoveToNearest(kind) => {
                let from = self.player(pid)?.position;
                let target = movement::nearest_forward(&self.board, from, kind);
                self.move_to(pid, target, true)?;
                let boost = match kind {
                    NearestKind::Station => RentBoost::DoubleStation,
                    NearestKind::Utility => RentBoost::TenfoldUtility,
                };
                self.resolve_landing(pid, boost)?;
            }
        }

        Ok(())
    }

    // ==================== Purchasing & Auctions ====================

    fn space_for_sale_under_current(&self) -> Result<Space, GameError> {
        let position = self.player(self.current_player)?.position;
        let space = self.board.at(position);
        if !space.is_for_sale() {
            return Err(GameError::NotForSale(space.name.clone()));
        }
        Ok(space.clone())
    }

    fn grant_property(&mut self, pid: PlayerId, id: &str, price: Money) -> Result<(), GameError> {
        let player = self.get_player_mut(pid)?;
        player.cash -= price;
        player.add_property(id);
        self.board.set_owner(id, Some(pid));
        Ok(())
    }

    fn buy_property(&mut self) -> Result<(), GameError> {
        if self.phase != TurnPhase::Action {
            return Err(GameError::InvalidPhase);
        }
        let pid = self.current_player;
        let space = self.space_for_sale_under_current()?;
        if !self.player(pid)?.can_afford(space.price) {
            return Err(GameError::CannotAfford(space.price));
        }

        self.grant_property(pid, &space.id, space.price)?;
        let name = self.current_name();
        self.log(format!("{} bought {} for ${}", name, space.name, space.price));
        self.phase = TurnPhase::End;
        Ok(())
    }

    fn decline_purchase(&mut self) -> Result<(), GameError> {
        if self.phase != TurnPhase::Action {
            return Err(GameError::InvalidPhase);
        }
        let space = self.space_for_sale_under_current()?;
        let name = self.current_name();

        if !self.settings.enable_auctions {
            self.log(format!("{} declined {}", name, space.name));
            self.phase = TurnPhase::End;
            return Ok(());
        }

        // Everyone bids, starting with the player who declined
        let start = self
            .players
            .iter()
            .position(|p| p.id == self.current_player)
            .unwrap_or(0);
        let bidders: Vec<PlayerId> = (0..self.players.len())
            .map(|i| self.players[(start + i) % self.players.len()].id)
            .collect();

        self.log(format!("{} declined {}; auction opened", name, space.name));
        self.phase = TurnPhase::Auction(AuctionState {
            property: space.id,
            highest_bid: 0,
            highest_bidder: None,
            bidders,
            turn: 0,
        });
        Ok(())
    }

    fn running_auction(&self) -> Result<(AuctionState, PlayerId), GameError> {
        let auction = self.auction().cloned().ok_or(GameError::InvalidPhase)?;
        let bidder = auction.current_bidder().ok_or(GameError::InvalidPhase)?;
        Ok((auction, bidder))
    }

    fn place_bid(&mut self, amount: Money) -> Result<(), GameError> {
        let (mut auction, bidder) = self.running_auction()?;
        if amount <= auction.highest_bid {
            return Err(GameError::BidTooLow(auction.highest_bid));
        }
        let player = self.player(bidder)?;
        if !player.can_afford(amount) {
            return Err(GameError::CannotAfford(amount));
        }
        let name = player.name.clone();
        self.log(format!("{} bid ${}", name, amount));

        auction.highest_bid = amount;
        auction.highest_bidder = Some(bidder);
        auction.turn = (auction.turn + 1) % auction.bidders.len();

        if auction.bidders.len() == 1 {
            return self.finish_auction(auction);
        }
        self.phase = TurnPhase::Auction(auction);
        Ok(())
    }

    fn fold_auction(&mut self) -> Result<(), GameError> {
        let (mut auction, bidder) = self.running_auction()?;
        if auction.highest_bidder == Some(bidder) {
            return Err(GameError::HighestBidderCannotFold);
        }
        let name = self.player(bidder)?.name.clone();
        self.log(format!("{} folded", name));

        auction.bidders.remove(auction.turn);
        if auction.turn >= auction.bidders.len() {
            auction.turn = 0;
        }

        match (auction.bidders.len(), auction.highest_bidder) {
            (0, _) => {
                let property = self.board.get(&auction.property).map(|s| s.name.clone()).unwrap_or_default();
                self.log(format!("nobody bought {}", property));
                self.phase = TurnPhase::End;
                Ok(())
            }
            (1, Some(_)) => self.finish_auction(auction),
            _ => {
                self.phase = TurnPhase::Auction(auction);
                Ok(())
            }
        }
    }

    fn finish_auction(&mut self, auction: AuctionState) -> Result<(), GameError> {
        let winner = auction.highest_bidder.ok_or(GameError::InvalidPhase)?;
        self.grant_property(winner, &auction.property, auction.highest_bid)?;
        let name = self.player(winner)?.name.clone();
        let property = self.board.get(&auction.property).map(|s| s.name.clone()).unwrap_or_default();
        self.log(format!("{} won {} at auction for ${}", name, property, auction.highest_bid));
        self.phase = TurnPhase::End;
        Ok(())
    }

    // ==================== Property Management ====================

    fn managing_property(&self, id: &str) -> Result<(&Player, &Space), GameError> {
        if !matches!(self.phase, TurnPhase::Roll | TurnPhase::Action | TurnPhase::End) {
            return Err(GameError::InvalidPhase);
        }
        let player = self.player(self.current_player)?;
        let space = self
            .board
            .get(id)
            .ok_or_else(|| GameError::UnknownSpace(id.to_string()))?;
        Ok((player, space))
    }

    fn build_house(&mut self, id: &str) -> Result<(), GameError> {
        let (player, space) = self.managing_property(id)?;
        finance::can_build_house(player, space, &self.board)?;
        let (pid, cost, name) = (player.id, space.house_cost, space.name.clone());

        self.get_player_mut(pid)?.cash -= cost;
        if let Some(space) = self.board.get_mut(id) {
            space.houses += 1;
        }
        let player_name = self.current_name();
        self.log(format!("{} built on {} for ${}", player_name, name, cost));
        Ok(())
    }

    fn sell_building(&mut self, id: &str) -> Result<(), GameError> {
        let (player, space) = self.managing_property(id)?;
        finance::can_sell_house(player, space, &self.board)?;
        let (pid, refund, name) = (player.id, finance::building_sale_value(space), space.name.clone());

        self.get_player_mut(pid)?.cash += refund;
        if let Some(space) = self.board.get_mut(id) {
            space.houses -= 1;
        }
        let player_name = self.current_name();
        self.log(format!("{} sold a building on {} for ${}", player_name, name, refund));
        Ok(())
    }

    fn mortgage(&mut self, id: &str) -> Result<(), GameError> {
        let (player, space) = self.managing_property(id)?;
        finance::can_mortgage(player, space, &self.board)?;
        let (pid, value, name) = (player.id, finance::mortgage_value(space), space.name.clone());

        self.get_player_mut(pid)?.cash += value;
        if let Some(space) = self.board.get_mut(id) {
            space.mortgaged = true;
        }
        let player_name = self.current_name();
        self.log(format!("{} mortgaged {} for ${}", player_name, name, value));
        Ok(())
    }

    fn unmortgage(&mut self, id: &str) -> Result<(), GameError> {
        let (player, space) = self.managing_property(id)?;
        finance::can_unmortgage(player, space)?;
        let (pid, cost, name) = (player.id, finance::unmortgage_cost(space), space.name.clone());

        self.get_player_mut(pid)?.cash -= cost;
        if let Some(space) = self.board.get_mut(id) {
            space.mortgaged = false;
        }
        let player_name = self.current_name();
        self.log(format!("{} lifted the mortgage on {} for ${}", player_name, name, cost));
        Ok(())
    }

    // ==================== Jail ====================

    fn jailed_current(&mut self) -> Result<&mut Player, GameError> {
        if self.phase != TurnPhase::Roll {
            return Err(GameError::InvalidPhase);
        }
        let pid = self.current_player;
        let player = self.get_player_mut(pid)?;
        if !player.in_jail {
            return Err(GameError::NotInJail);
        }
        Ok(player)
    }

    fn pay_jail_fine(&mut self) -> Result<(), GameError> {
        let player = self.jailed_current()?;
        if !player.can_afford(JAIL_FINE) {
            return Err(GameError::CannotAfford(JAIL_FINE));
        }
        player.cash -= JAIL_FINE;
        player.release_from_jail();
        let message = format!("{} paid ${} to leave jail", player.name, JAIL_FINE);
        self.log(message);
        Ok(())
    }

    fn use_jail_card(&mut self) -> Result<(), GameError> {
        let player = self.jailed_current()?;
        if player.jail_free_cards == 0 {
            return Err(GameError::NoJailCard);
        }
        player.jail_free_cards -= 1;
        player.release_from_jail();
        let message = format!("{} used a Get Out of Jail Free card", player.name);
        self.log(message);
        Ok(())
    }

    // ==================== Trading ====================

    fn setup_trade(&mut self) -> Result<(), GameError> {
        let resume = match self.phase {
            TurnPhase::Roll => ResumePhase::Roll,
            TurnPhase::Action => ResumePhase::Action,
            TurnPhase::End => ResumePhase::End,
            _ => return Err(GameError::InvalidPhase),
        };
        if !self.settings.enable_trading {
            return Err(GameError::TradingDisabled);
        }
        let name = self.current_name();
        self.log(format!("{} is preparing a trade", name));
        self.phase = TurnPhase::Trade(TradeStage::Composing { resume });
        Ok(())
    }

    fn create_trade(&mut self, offer: TradeOffer) -> Result<(), GameError> {
        let resume = match self.phase {
            TurnPhase::Trade(TradeStage::Composing { resume }) => resume,
            _ => return Err(GameError::InvalidPhase),
        };
        if offer.proposer != self.current_player {
            return Err(GameError::NotProposer);
        }
        trade::validate_trade(&offer, &self.players, &self.board)?;

        let to = self.player(offer.counterparty)?.name.clone();
        let from = self.current_name();
        self.log(format!("{} offered a trade to {}", from, to));
        self.phase = TurnPhase::Trade(TradeStage::Pending { offer, resume });
        Ok(())
    }

    fn pending_trade(&self) -> Result<(TradeOffer, ResumePhase), GameError> {
        match &self.phase {
            TurnPhase::Trade(TradeStage::Pending { offer, resume }) => Ok((offer.clone(), *resume)),
            _ => Err(GameError::InvalidPhase),
        }
    }

    fn accept_trade(&mut self) -> Result<(), GameError> {
        let (offer, resume) = self.pending_trade()?;
        self.phase = resume.phase();

        // Holdings may have changed since the offer was made
        if let Err(violation) = trade::validate_trade(&offer, &self.players, &self.board) {
            self.log(format!("Trade could not be completed: {}", violation));
            return Ok(());
        }

        self.transfer(offer.proposer, Some(offer.counterparty), offer.offered.cash)?;
        self.transfer(offer.counterparty, Some(offer.proposer), offer.requested.cash)?;
        for id in &offer.offered.properties {
            self.hand_over(id, offer.proposer, offer.counterparty)?;
        }
        for id in &offer.requested.properties {
            self.hand_over(id, offer.counterparty, offer.proposer)?;
        }

        let to = self.player(offer.counterparty)?.name.clone();
        let from = self.player(offer.proposer)?.name.clone();
        self.log(format!("{} accepted the trade from {}", to, from));
        Ok(())
    }

    /// Move ownership of a property between players, as-is
    fn hand_over(&mut self, id: &str, from: PlayerId, to: PlayerId) -> Result<(), GameError> {
        self.get_player_mut(from)?.remove_property(id);
        self.get_player_mut(to)?.add_property(id);
        self.board.set_owner(id, Some(to));
        Ok(())
    }

    fn reject_trade(&mut self) -> Result<(), GameError> {
        let (offer, resume) = self.pending_trade()?;
        let name = self.player(offer.counterparty)?.name.clone();
        self.log(format!("{} rejected the trade", name));
        self.phase = resume.phase();
        Ok(())
    }

    fn cancel_trade(&mut self) -> Result<(), GameError> {
        let resume = match &self.phase {
            TurnPhase::Trade(TradeStage::Composing { resume })
            | TurnPhase::Trade(TradeStage::Pending { resume, .. }) => *resume,
            _ => return Err(GameError::InvalidPhase),
        };
        let name = self.current_name();
        self.log(format!("{} cancelled the trade", name));
        self.phase = resume.phase();
        Ok(())
    }

    // ==================== Bankruptcy & Turn End ====================

    fn declare_bankruptcy(&mut self) -> Result<(), GameError> {
        // Roll is included: another player's card can push cash below zero
        if !matches!(self.phase, TurnPhase::Roll | TurnPhase::Action | TurnPhase::End) {
            return Err(GameError::InvalidPhase);
        }
        let pid = self.current_player;
        let player = self.player(pid)?;
        let value = finance::liquidation_value(player, &self.board);
        if value >= 0 {
            return Err(GameError::NotInsolvent(value));
        }

        let name = player.name.clone();
        let jail_cards = player.jail_free_cards;
        let creditor = self
            .board
            .at(player.position)
            .owner
            .filter(|&owner| owner != pid && self.get_player(owner).is_some());

        let holdings: Vec<SpaceId> = self.board.owned_by(pid).map(|s| s.id.clone()).collect();
        match creditor {
            Some(creditor) => {
                for id in &holdings {
                    self.hand_over(id, pid, creditor)?;
                }
                self.get_player_mut(creditor)?.jail_free_cards += jail_cards;
                let creditor_name = self.player(creditor)?.name.clone();
                self.log(format!("{} went bankrupt to {}", name, creditor_name));
            }
            None => {
                for id in &holdings {
                    self.board.return_to_bank(id);
                }
                self.log(format!("{} went bankrupt to the bank", name));
            }
        }
        info!(player = %name, properties = holdings.len(), "bankruptcy");

        let seat = self.players.iter().position(|p| p.id == pid).unwrap_or(0);
        self.players.remove(seat);
        self.doubles_count = 0;

        if self.players.len() == 1 {
            let winner = self.players[0].id;
            let winner_name = self.players[0].name.clone();
            self.current_player = winner;
            self.status = GameStatus::Concluded { winner };
            self.phase = TurnPhase::Ended;
            self.log(format!("{} wins the game", winner_name));
            info!(winner = %winner_name, turns = self.turn_number, "game over");
            return Ok(());
        }

        self.current_player = self.players[seat % self.players.len()].id;
        self.turn_number += 1;
        self.phase = TurnPhase::Roll;
        Ok(())
    }

    fn end_turn(&mut self) -> Result<(), GameError> {
        if !matches!(self.phase, TurnPhase::Action | TurnPhase::End) {
            return Err(GameError::InvalidPhase);
        }
        if self.player(self.current_player)?.cash < 0 {
            return Err(GameError::NegativeCash);
        }
        if self.pending_double() {
            return Err(GameError::MustRollAgain);
        }

        let next = self.next_player_after(self.current_player);
        self.current_player = next;
        self.doubles_count = 0;
        self.turn_number += 1;
        self.last_move = None;
        self.phase = TurnPhase::Roll;
        let name = self.current_name();
        self.log(format!("Turn ended. {}'s turn", name));
        Ok(())
    }

    // ==================== Legal Actions ====================

    /// Representative legal actions for the acting player. Bids are listed at
    /// the minimum raise; trade offers need a payload and are not listed.
    pub fn valid_actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        let player = match self.current() {
            Some(p) if !self.is_finished() => p,
            _ => return actions,
        };

        match &self.phase {
            TurnPhase::Ended => {}

            TurnPhase::Card(_) => actions.push(Action::ApplyCard),

            TurnPhase::Auction(auction) => {
                if let Some(bidder) = auction.current_bidder().and_then(|id| self.get_player(id)) {
                    let bid = auction.highest_bid + MIN_BID_INCREMENT;
                    if bidder.can_afford(bid) {
                        actions.push(Action::PlaceBid(bid));
                    }
                    if auction.highest_bidder != Some(bidder.id) {
                        actions.push(Action::FoldAuction);
                    }
                }
            }

            TurnPhase::Trade(TradeStage::Composing { .. }) => actions.push(Action::CancelTrade),

            // The acting player here is the counterparty
            TurnPhase::Trade(TradeStage::Pending { .. }) => {
                actions.push(Action::AcceptTrade);
                actions.push(Action::RejectTrade);
            }

            TurnPhase::Roll => {
                if player.cash >= 0 {
                    actions.push(Action::RollDice);
                }
                if finance::liquidation_value(player, &self.board) < 0 {
                    actions.push(Action::DeclareBankruptcy);
                }
                if player.in_jail {
                    if player.can_afford(JAIL_FINE) {
                        actions.push(Action::PayJailFine);
                    }
                    if player.jail_free_cards > 0 {
                        actions.push(Action::UseJailCard);
                    }
                }
                self.push_management_actions(player, &mut actions);
            }

            TurnPhase::Action | TurnPhase::End => {
                let here = self.board.at(player.position);
                if self.phase == TurnPhase::Action && here.is_for_sale() {
                    if player.can_afford(here.price) {
                        actions.push(Action::BuyProperty);
                    }
                    actions.push(Action::DeclinePurchase);
                }
                if self.pending_double() && player.cash >= 0 && self.purchase_pending().is_none() {
                    actions.push(Action::RollDice);
                }
                if player.cash >= 0 && !self.pending_double() {
                    actions.push(Action::EndTurn);
                }
                if finance::liquidation_value(player, &self.board) < 0 {
                    actions.push(Action::DeclareBankruptcy);
                }
                self.push_management_actions(player, &mut actions);
            }
        }

        actions
    }

    fn push_management_actions(&self, player: &Player, actions: &mut Vec<Action>) {
        for space in self.board.owned_by(player.id) {
            if finance::can_build_house(player, space, &self.board).is_ok() {
                actions.push(Action::BuildHouse(space.id.clone()));
            }
            if finance::can_sell_house(player, space, &self.board).is_ok() {
                actions.push(Action::SellBuilding(space.id.clone()));
            }
            if finance::can_mortgage(player, space, &self.board).is_ok() {
                actions.push(Action::MortgageProperty(space.id.clone()));
            }
            if finance::can_unmortgage(player, space).is_ok() {
                actions.push(Action::UnmortgageProperty(space.id.clone()));
            }
        }
        if self.settings.enable_trading {
            actions.push(Action::SetupTrade);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedDice;
    use crate::trade::TradeSide;

    fn game(names: &[&str]) -> GameState {
        let seats = names.iter().map(|n| PlayerSeat::human(*n)).collect();
        GameState::new(seats, GameSettings::default(), 7).unwrap()
    }

    fn roll(state: &GameState, dice: (u8, u8)) -> GameState {
        state.try_apply(Action::RollDice, &mut ScriptedDice::new([dice])).unwrap()
    }

    fn act(state: &GameState, action: Action) -> Result<GameState, GameError> {
        state.try_apply(action, &mut ScriptedDice::default())
    }

    fn give(state: &mut GameState, owner: PlayerId, id: &str) {
        state.board.set_owner(id, Some(owner));
        state.get_player_mut(owner).unwrap().add_property(id);
    }

    #[test]
    fn test_new_game() {
        let state = game(&["Alice", "Bob"]);
        assert_eq!(state.players.len(), 2);
        assert!(state.players.iter().all(|p| p.cash == 1500 && p.position == 0));
        assert_eq!(state.current_player, 0);
        assert_eq!(state.phase, TurnPhase::Roll);
        assert_eq!(state.chance.len(), 16);
        assert_eq!(state.community_chest.len(), 16);
        assert_eq!(state.players[1].color, TokenColor::Blue);
    }

    #[test]
    fn test_setup_errors() {
        let settings = GameSettings::default();
        assert_eq!(
            GameState::new(vec![PlayerSeat::human("Solo")], settings.clone(), 1).unwrap_err(),
            SetupError::TooFewPlayers(1)
        );
        let crowd = (0..9).map(|i| PlayerSeat::human(format!("P{}", i))).collect();
        assert_eq!(
            GameState::new(crowd, settings.clone(), 1).unwrap_err(),
            SetupError::TooManyPlayers(9)
        );
        let blank = vec![PlayerSeat::human("Alice"), PlayerSeat::human("  ")];
        assert_eq!(GameState::new(blank, settings.clone(), 1).unwrap_err(), SetupError::EmptyName(1));
        let twins = vec![PlayerSeat::human("Alice"), PlayerSeat::human("Alice")];
        assert_eq!(
            GameState::new(twins, settings, 1).unwrap_err(),
            SetupError::DuplicateName("Alice".into())
        );
    }

    #[test]
    fn test_roll_passes_go_once() {
        let mut state = game(&["Alice", "Bob"]);
        state.players[0].position = 35;
        let state = roll(&state, (3, 5));
        assert_eq!(state.players[0].position, 3);
        assert_eq!(state.players[0].cash, 1700);
        assert_eq!(state.phase, TurnPhase::Action);
        assert_eq!(state.last_move, Some(MoveHint::Forward));
    }

    #[test]
    fn test_three_doubles_sends_to_jail() {
        let state = game(&["Alice", "Bob"]);
        let state = roll(&state, (2, 2));
        assert_eq!(state.players[0].position, 4);
        assert_eq!(state.players[0].cash, 1300);
        assert!(state.pending_double());
        assert_eq!(act(&state, Action::EndTurn).unwrap_err(), GameError::MustRollAgain);

        let state = roll(&state, (3, 3));
        assert_eq!(state.doubles_count, 2);
        let state = roll(&state, (4, 4));
        let alice = &state.players[0];
        assert_eq!(alice.position, 10);
        assert!(alice.in_jail);
        assert_eq!(state.doubles_count, 0);
        assert_eq!(state.phase, TurnPhase::End);
        assert_eq!(state.last_move, Some(MoveHint::ToJail));
        assert_eq!(state.jail_entry_from, Some(10));
        assert!(act(&state, Action::EndTurn).is_ok());
    }

    #[test]
    fn test_double_cannot_skip_purchase_decision() {
        let state = roll(&game(&["Alice", "Bob"]), (3, 3));
        assert_eq!(state.players[0].position, 6);
        assert!(state.pending_double());

        let actions = state.valid_actions();
        assert!(actions.contains(&Action::BuyProperty));
        assert!(actions.contains(&Action::DeclinePurchase));
        assert!(!actions.contains(&Action::RollDice));
        assert_eq!(
            act(&state, Action::RollDice).unwrap_err(),
            GameError::PurchasePending("Oriental Avenue".into())
        );

        let bought = act(&state, Action::BuyProperty).unwrap();
        assert!(bought.valid_actions().contains(&Action::RollDice));
        let moved = roll(&bought, (1, 2));
        assert_eq!(moved.players[0].position, 9);
        assert_eq!(moved.board.get("oriental").unwrap().owner, Some(0));
    }

    #[test]
    fn test_failed_jail_rolls() {
        let mut state = game(&["Alice", "Bob"]);
        state.players[0].send_to_jail();

        let next = roll(&state, (1, 2));
        assert_eq!(next.players[0].jail_turns, 1);
        assert_eq!(next.players[0].position, 10);
        assert_eq!(next.phase, TurnPhase::End);

        state.players[0].jail_turns = 2;
        let next = roll(&state, (1, 2));
        let alice = &next.players[0];
        assert!(!alice.in_jail);
        assert_eq!(alice.cash, 1450);
        assert_eq!(alice.position, 13);
        assert_eq!(next.phase, TurnPhase::Action);
    }

    #[test]
    fn test_doubles_release_from_jail_without_extra_roll() {
        let mut state = game(&["Alice", "Bob"]);
        state.players[0].send_to_jail();
        let state = roll(&state, (3, 3));
        assert!(!state.players[0].in_jail);
        assert_eq!(state.players[0].position, 16);
        assert!(!state.pending_double());
        assert!(act(&state, Action::EndTurn).is_ok());
    }

    #[test]
    fn test_jail_fine_and_card() {
        let mut state = game(&["Alice", "Bob"]);
        assert_eq!(act(&state, Action::PayJailFine).unwrap_err(), GameError::NotInJail);

        state.players[0].send_to_jail();
        assert_eq!(act(&state, Action::UseJailCard).unwrap_err(), GameError::NoJailCard);

        let paid = act(&state, Action::PayJailFine).unwrap();
        assert!(!paid.players[0].in_jail);
        assert_eq!(paid.players[0].cash, 1450);
        assert_eq!(paid.phase, TurnPhase::Roll);

        state.players[0].jail_free_cards = 1;
        let freed = act(&state, Action::UseJailCard).unwrap();
        assert!(!freed.players[0].in_jail);
        assert_eq!(freed.players[0].jail_free_cards, 0);
        assert_eq!(freed.players[0].cash, 1500);
    }

    #[test]
    fn test_rent_paid_to_owner() {
        let mut state = game(&["Alice", "Bob"]);
        give(&mut state, 1, "baltic");
        let state = roll(&state, (1, 2));
        assert_eq!(state.players[0].cash, 1496);
        assert_eq!(state.players[1].cash, 1504);
        assert_eq!(state.phase, TurnPhase::Action);
        assert!(!state.valid_actions().contains(&Action::BuyProperty));
    }

    #[test]
    fn test_buy_property() {
        let state = roll(&game(&["Alice", "Bob"]), (1, 2));
        let bought = act(&state, Action::BuyProperty).unwrap();
        assert_eq!(bought.board.get("baltic").unwrap().owner, Some(0));
        assert!(bought.players[0].owns("baltic"));
        assert_eq!(bought.players[0].cash, 1440);
        assert_eq!(bought.phase, TurnPhase::End);
        assert_eq!(act(&bought, Action::BuyProperty).unwrap_err(), GameError::InvalidPhase);

        let mut broke = state.clone();
        broke.players[0].cash = 10;
        assert_eq!(act(&broke, Action::BuyProperty).unwrap_err(), GameError::CannotAfford(60));
    }

    #[test]
    fn test_refused_action_only_touches_last_action() {
        let state = game(&["Alice", "Bob"]);
        let next = state.apply_with(Action::EndTurn, &mut ScriptedDice::default());
        let mut expected = state.clone();
        expected.last_action = GameError::InvalidPhase.to_string();
        assert_eq!(next, expected);
    }

    #[test]
    fn test_auction_goes_to_last_bidder_standing() {
        let state = roll(&game(&["Alice", "Bob", "Carol"]), (1, 2));
        let state = act(&state, Action::DeclinePurchase).unwrap();
        assert_eq!(state.auction().unwrap().bidders, vec![0, 1, 2]);
        assert_eq!(state.acting_player(), Some(0));

        let state = act(&state, Action::PlaceBid(50)).unwrap();
        assert_eq!(state.acting_player(), Some(1));
        assert_eq!(act(&state, Action::PlaceBid(50)).unwrap_err(), GameError::BidTooLow(50));

        let state = act(&state, Action::FoldAuction).unwrap();
        assert_eq!(state.acting_player(), Some(2));
        let state = act(&state, Action::PlaceBid(60)).unwrap();
        assert_eq!(state.acting_player(), Some(0));
        let state = act(&state, Action::FoldAuction).unwrap();

        assert_eq!(state.phase, TurnPhase::End);
        assert_eq!(state.board.get("baltic").unwrap().owner, Some(2));
        assert_eq!(state.players[2].cash, 1440);
        assert_eq!(state.players[0].cash, 1500);
    }

    #[test]
    fn test_auction_with_no_bids_leaves_property_unowned() {
        let state = roll(&game(&["Alice", "Bob"]), (1, 2));
        let state = act(&state, Action::DeclinePurchase).unwrap();
        let state = act(&state, Action::FoldAuction).unwrap();
        let state = act(&state, Action::FoldAuction).unwrap();
        assert_eq!(state.phase, TurnPhase::End);
        assert_eq!(state.board.get("baltic").unwrap().owner, None);
    }

    #[test]
    fn test_decline_without_auctions() {
        let seats = vec![PlayerSeat::human("Alice"), PlayerSeat::human("Bob")];
        let settings = GameSettings {
            enable_auctions: false,
            ..GameSettings::default()
        };
        let state = GameState::new(seats, settings, 3).unwrap();
        let state = roll(&state, (1, 2));
        let state = act(&state, Action::DeclinePurchase).unwrap();
        assert_eq!(state.phase, TurnPhase::End);
        assert_eq!(state.board.get("baltic").unwrap().owner, None);
    }

    #[test]
    fn test_advance_to_go_card() {
        let mut state = game(&["Alice", "Bob"]);
        assert!(state.chance.stack_on_top("ch_go"));
        let state = roll(&state, (3, 4));
        assert_eq!(state.active_card().map(|c| c.id.as_str()), Some("ch_go"));
        assert_eq!(act(&state, Action::EndTurn).unwrap_err(), GameError::InvalidPhase);

        let state = act(&state, Action::ApplyCard).unwrap();
        assert_eq!(state.players[0].position, 0);
        assert_eq!(state.players[0].cash, 1700);
        assert_eq!(state.last_move, Some(MoveHint::Teleport));
        assert_eq!(state.phase, TurnPhase::Action);
    }

    #[test]
    fn test_back_three_lands_on_tax() {
        let mut state = game(&["Alice", "Bob"]);
        state.chance.stack_on_top("ch_back_3");
        let state = act(&roll(&state, (3, 4)), Action::ApplyCard).unwrap();
        assert_eq!(state.players[0].position, 4);
        assert_eq!(state.players[0].cash, 1300);
        assert_eq!(state.last_move, Some(MoveHint::Backward));
    }

    #[test]
    fn test_birthday_collects_from_everyone() {
        let mut state = game(&["Alice", "Bob", "Carol"]);
        state.community_chest.stack_on_top("cc_birthday");
        let state = act(&roll(&state, (1, 1)), Action::ApplyCard).unwrap();
        assert_eq!(state.players[0].cash, 1520);
        assert_eq!(state.players[1].cash, 1490);
        assert_eq!(state.players[2].cash, 1490);
    }

    #[test]
    fn test_nearest_railroad_pays_double() {
        let mut state = game(&["Alice", "Bob"]);
        give(&mut state, 1, "pennsylvania_railroad");
        state.chance.stack_on_top("ch_railroad_1");
        let state = act(&roll(&state, (3, 4)), Action::ApplyCard).unwrap();
        assert_eq!(state.players[0].position, 15);
        assert_eq!(state.players[0].cash, 1450);
        assert_eq!(state.players[1].cash, 1550);
    }

    #[test]
    fn test_go_to_jail_card() {
        let mut state = game(&["Alice", "Bob"]);
        state.chance.stack_on_top("ch_jail");
        let state = act(&roll(&state, (3, 4)), Action::ApplyCard).unwrap();
        assert!(state.players[0].in_jail);
        assert_eq!(state.jail_entry_from, Some(7));
        assert_eq!(state.phase, TurnPhase::End);
    }

    #[test]
    fn test_nearest_utility_charges_ten_times_the_dice() {
        let mut state = game(&["Alice", "Bob"]);
        give(&mut state, 1, "electric_company");
        state.chance.stack_on_top("ch_utility");
        let state = act(&roll(&state, (3, 4)), Action::ApplyCard).unwrap();
        assert_eq!(state.players[0].position, 12);
        assert_eq!(state.players[0].cash, 1430);
        assert_eq!(state.players[1].cash, 1570);
    }

    #[test]
    fn test_chairman_pays_everyone() {
        let mut state = game(&["Alice", "Bob", "Carol"]);
        state.chance.stack_on_top("ch_chairman");
        let state = act(&roll(&state, (3, 4)), Action::ApplyCard).unwrap();
        let cash: Vec<Money> = state.players.iter().map(|p| p.cash).collect();
        assert_eq!(cash, vec![1400, 1550, 1550]);
    }

    #[test]
    fn test_jail_free_card_is_kept() {
        let mut state = game(&["Alice", "Bob"]);
        state.chance.stack_on_top("ch_jail_free");
        let state = act(&roll(&state, (3, 4)), Action::ApplyCard).unwrap();
        assert_eq!(state.players[0].jail_free_cards, 1);
        assert_eq!(state.players[0].cash, 1500);
        assert_eq!(state.phase, TurnPhase::Action);
        assert_eq!(state.chance.len(), 16);
    }

    #[test]
    fn test_building() {
        let mut state = game(&["Alice", "Bob"]);
        give(&mut state, 0, "mediterranean");
        let build = |s: &GameState, id: &str| act(s, Action::BuildHouse(id.into()));

        assert_eq!(
            build(&state, "mediterranean").unwrap_err(),
            GameError::Rule(RuleViolation::IncompleteMonopoly)
        );
        assert_eq!(build(&state, "atlantis").unwrap_err(), GameError::UnknownSpace("atlantis".into()));

        give(&mut state, 0, "baltic");
        let built = build(&state, "mediterranean").unwrap();
        assert_eq!(built.board.get("mediterranean").unwrap().houses, 1);
        assert_eq!(built.players[0].cash, 1450);
        assert_eq!(
            build(&built, "mediterranean").unwrap_err(),
            GameError::Rule(RuleViolation::UnevenBuild)
        );

        let sold = act(&built, Action::SellBuilding("mediterranean".into())).unwrap();
        assert_eq!(sold.board.get("mediterranean").unwrap().houses, 0);
        assert_eq!(sold.players[0].cash, 1475);
    }

    #[test]
    fn test_mortgage_round_trip_costs_interest() {
        let mut state = game(&["Alice", "Bob"]);
        give(&mut state, 0, "baltic");
        let state = act(&state, Action::MortgageProperty("baltic".into())).unwrap();
        assert!(state.board.get("baltic").unwrap().mortgaged);
        assert_eq!(state.players[0].cash, 1530);

        let state = act(&state, Action::UnmortgageProperty("baltic".into())).unwrap();
        assert!(!state.board.get("baltic").unwrap().mortgaged);
        assert_eq!(state.players[0].cash, 1497);
    }

    #[test]
    fn test_end_turn() {
        let state = roll(&game(&["Alice", "Bob"]), (1, 2));
        let next = act(&state, Action::EndTurn).unwrap();
        assert_eq!(next.current_player, 1);
        assert_eq!(next.phase, TurnPhase::Roll);
        assert_eq!(next.turn_number, 2);

        let mut indebted = state.clone();
        indebted.players[0].cash = -10;
        assert_eq!(act(&indebted, Action::EndTurn).unwrap_err(), GameError::NegativeCash);
    }

    #[test]
    fn test_bankruptcy_refused_while_solvent() {
        let mut state = roll(&game(&["Alice", "Bob"]), (1, 2));
        give(&mut state, 0, "mediterranean");
        state.players[0].cash = -10;
        assert_eq!(act(&state, Action::DeclareBankruptcy).unwrap_err(), GameError::NotInsolvent(20));
    }

    #[test]
    fn test_bankruptcy_to_creditor_ends_game() {
        let mut state = game(&["Alice", "Bob"]);
        give(&mut state, 1, "boardwalk");
        state.board.get_mut("boardwalk").unwrap().houses = crate::board::HOTEL;
        give(&mut state, 0, "mediterranean");
        give(&mut state, 0, "baltic");
        state.board.get_mut("mediterranean").unwrap().houses = 1;
        state.board.get_mut("baltic").unwrap().houses = 1;
        give(&mut state, 0, "oriental");
        state.board.get_mut("oriental").unwrap().mortgaged = true;
        state.players[0].jail_free_cards = 1;
        state.players[0].position = 36;

        let state = roll(&state, (1, 2));
        assert_eq!(state.players[0].cash, -500);
        assert_eq!(state.players[1].cash, 3500);

        let state = act(&state, Action::DeclareBankruptcy).unwrap();
        assert_eq!(state.players.len(), 1);
        assert_eq!(state.winner(), Some(1));
        assert_eq!(state.phase, TurnPhase::Ended);
        assert_eq!(state.board.get("mediterranean").unwrap().owner, Some(1));
        assert!(state.players[0].owns("mediterranean"));
        let baltic = state.board.get("baltic").unwrap();
        assert_eq!((baltic.owner, baltic.houses), (Some(1), 1));
        let oriental = state.board.get("oriental").unwrap();
        assert_eq!(oriental.owner, Some(1));
        assert!(oriental.mortgaged);
        assert!(state.players[0].owns("oriental"));
        assert_eq!(state.players[0].jail_free_cards, 1);
        assert_eq!(act(&state, Action::RollDice).unwrap_err(), GameError::GameOver);
        assert!(state.valid_actions().is_empty());
    }

    #[test]
    fn test_bankruptcy_to_bank_continues_game() {
        let mut state = game(&["Alice", "Bob", "Carol"]);
        give(&mut state, 0, "baltic");
        state.board.get_mut("baltic").unwrap().mortgaged = true;
        state.players[0].cash = 50;
        state.players[0].position = 35;

        let state = roll(&state, (1, 2));
        assert_eq!(state.players[0].cash, -50);
        let state = act(&state, Action::DeclareBankruptcy).unwrap();
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.current_player, 1);
        assert_eq!(state.phase, TurnPhase::Roll);
        let baltic = state.board.get("baltic").unwrap();
        assert_eq!(baltic.owner, None);
        assert!(!baltic.mortgaged);
    }

    fn swap_offer() -> TradeOffer {
        TradeOffer::new(0, 1, TradeSide::new(100, &["boardwalk"]), TradeSide::new(0, &["park_place"]))
    }

    fn trading_game() -> GameState {
        let mut state = game(&["Alice", "Bob"]);
        give(&mut state, 0, "boardwalk");
        give(&mut state, 1, "park_place");
        state
    }

    #[test]
    fn test_trade_accepted() {
        let state = act(&trading_game(), Action::SetupTrade).unwrap();
        assert_eq!(
            state.phase,
            TurnPhase::Trade(TradeStage::Composing { resume: ResumePhase::Roll })
        );
        let state = act(&state, Action::CreateTrade(swap_offer())).unwrap();
        assert_eq!(state.acting_player(), Some(1));
        assert_eq!(state.active_trade(), Some(&swap_offer()));

        let state = act(&state, Action::AcceptTrade).unwrap();
        assert_eq!(state.phase, TurnPhase::Roll);
        assert_eq!(state.board.get("boardwalk").unwrap().owner, Some(1));
        assert_eq!(state.board.get("park_place").unwrap().owner, Some(0));
        assert_eq!(state.players[0].cash, 1400);
        assert_eq!(state.players[1].cash, 1600);
        assert!(state.players[0].owns("park_place") && !state.players[0].owns("boardwalk"));
    }

    #[test]
    fn test_trade_rejected_and_cancelled() {
        let composing = act(&trading_game(), Action::SetupTrade).unwrap();
        let pending = act(&composing, Action::CreateTrade(swap_offer())).unwrap();

        let rejected = act(&pending, Action::RejectTrade).unwrap();
        assert_eq!(rejected.phase, TurnPhase::Roll);
        assert_eq!(rejected.board, trading_game().board);

        let cancelled = act(&composing, Action::CancelTrade).unwrap();
        assert_eq!(cancelled.phase, TurnPhase::Roll);
    }

    #[test]
    fn test_counterparty_is_offered_accept_or_reject() {
        let composing = act(&trading_game(), Action::SetupTrade).unwrap();
        assert_eq!(composing.valid_actions(), vec![Action::CancelTrade]);

        let pending = act(&composing, Action::CreateTrade(swap_offer())).unwrap();
        assert_eq!(pending.valid_actions(), vec![Action::AcceptTrade, Action::RejectTrade]);
    }

    #[test]
    fn test_trade_proposal_checks() {
        let composing = act(&trading_game(), Action::SetupTrade).unwrap();
        let reversed = TradeOffer::new(1, 0, TradeSide::default(), TradeSide::default());
        assert_eq!(act(&composing, Action::CreateTrade(reversed)).unwrap_err(), GameError::NotProposer);

        let greedy = TradeOffer::new(0, 1, TradeSide::default(), TradeSide::new(0, &["boardwalk"]));
        assert!(matches!(
            act(&composing, Action::CreateTrade(greedy)),
            Err(GameError::Trade(TradeViolation::NotOwned { .. }))
        ));

        let mut closed = trading_game();
        closed.settings.enable_trading = false;
        assert_eq!(act(&closed, Action::SetupTrade).unwrap_err(), GameError::TradingDisabled);
    }

    #[test]
    fn test_stale_trade_is_dropped_on_accept() {
        let composing = act(&trading_game(), Action::SetupTrade).unwrap();
        let mut pending = act(&composing, Action::CreateTrade(swap_offer())).unwrap();
        pending.players[0].cash = 50;

        let state = act(&pending, Action::AcceptTrade).unwrap();
        assert_eq!(state.phase, TurnPhase::Roll);
        assert_eq!(state.board.get("boardwalk").unwrap().owner, Some(0));
        assert!(state.last_action.starts_with("Trade could not be completed"));
    }

    #[test]
    fn test_apply_replays_from_seed() {
        let state = game(&["Alice", "Bob"]);
        let a = state.apply(Action::RollDice);
        let b = state.apply(Action::RollDice);
        assert_eq!(a, b);
        assert_ne!(a.dice, (0, 0));
    }

    #[test]
    fn test_valid_actions_at_start() {
        let actions = game(&["Alice", "Bob"]).valid_actions();
        assert!(actions.contains(&Action::RollDice));
        assert!(actions.contains(&Action::SetupTrade));
        assert!(!actions.contains(&Action::EndTurn));
        assert!(!actions.contains(&Action::PayJailFine));
    }
}
