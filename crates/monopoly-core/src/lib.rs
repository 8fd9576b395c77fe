//! Monopoly - a rules engine for the classic property-trading board game
//!
//! This crate provides the core game logic, including:
//! - The 40-space board and both 16-card decks
//! - Movement, rent, building, mortgage and tax rules
//! - Bilateral trades and open auctions
//! - A turn-phase state machine driven by one action at a time
//! - Computer-controlled players
//!
//! # Architecture
//!
//! The engine is a pure transition `(state, action) -> state`. It performs no
//! I/O and never blocks; dice and shuffles go through [`random::RandomSource`]
//! so games can be replayed from a seed. It can be compiled to:
//! - Native Rust for headless simulation
//! - WebAssembly for a browser front-end
//!
//! # Modules
//!
//! - [`board`]: Spaces, color groups and ownership
//! - [`cards`]: Chance and Community Chest decks
//! - [`movement`]: Dice and token movement
//! - [`finance`]: Rent, tax, building and mortgage rules
//! - [`trade`]: Trade offers and their validation
//! - [`game`]: Game state machine
//! - [`bot`]: Autonomous agent

pub mod actions;
pub mod board;
pub mod bot;
pub mod cards;
pub mod config;
pub mod finance;
pub mod game;
pub mod movement;
pub mod player;
pub mod random;
pub mod trade;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::Action;
pub use board::{Board, ColorGroup, Money, PlayerId, Space, SpaceId, SpaceKind};
pub use bot::{decide, evaluate_trade, BotPersonality, BotProfile, TradeDecision, TradeEvaluation};
pub use cards::{Card, CardEffect, Deck, DeckKind};
pub use config::{GameSettings, PlayerSeat};
pub use finance::RuleViolation;
pub use game::{AuctionState, GameError, GameState, GameStatus, MoveHint, SetupError, TradeStage, TurnPhase};
pub use player::{Player, PlayerKind, TokenColor};
pub use random::{RandomSource, ScriptedDice};
pub use trade::{validate_trade, TradeOffer, TradeSide, TradeViolation};
