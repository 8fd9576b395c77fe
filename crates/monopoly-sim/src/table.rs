//! A table: the seated players plus the one authoritative game state.

use monopoly_core::{
    decide, finance, Action, GameError, GameSettings, GameState, PlayerId, PlayerSeat, SetupError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Could not seat players: {0}")]
    Setup(#[from] SetupError),

    #[error("Waiting for {0} to act")]
    AwaitingHuman(String),

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game is over")]
    GameOver,

    #[error("Invalid action: {0}")]
    InvalidAction(#[from] GameError),
}

/// Final position of one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub name: String,
    pub cash: i64,
    pub properties: usize,
    /// Cash plus everything that could be raised by selling and mortgaging
    pub net_worth: i64,
}

/// Outcome of one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub game: u32,
    pub seed: u64,
    pub turns: u32,
    pub steps: usize,
    pub finished: bool,
    pub winner: Option<String>,
    /// Players still in the game, richest first
    pub standings: Vec<Standing>,
}

pub struct Table {
    pub number: u32,
    seed: u64,
    state: GameState,
    rng: StdRng,
    steps: usize,
}

impl Table {
    pub fn new(number: u32, seats: Vec<PlayerSeat>, settings: GameSettings, seed: u64) -> Result<Self, TableError> {
        let state = GameState::new(seats, settings, seed)?;
        Ok(Self {
            number,
            seed,
            state,
            rng: StdRng::seed_from_u64(seed),
            steps: 0,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Let the bot whose turn it is act once
    pub fn step(&mut self) -> Result<Action, TableError> {
        if self.state.is_finished() {
            return Err(TableError::GameOver);
        }
        let action = match decide(&self.state) {
            Some(action) => action,
            None => {
                let name = self
                    .state
                    .acting_player()
                    .and_then(|id| self.state.get_player(id))
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                return Err(TableError::AwaitingHuman(name));
            }
        };

        self.advance(action.clone())?;
        Ok(action)
    }

    /// Apply an action on behalf of a (human) player
    pub fn submit(&mut self, player: PlayerId, action: Action) -> Result<(), TableError> {
        if self.state.is_finished() {
            return Err(TableError::GameOver);
        }
        if self.state.acting_player() != Some(player) {
            return Err(TableError::NotYourTurn);
        }
        self.advance(action)
    }

    fn advance(&mut self, action: Action) -> Result<(), TableError> {
        self.state = self.state.try_apply(action, &mut self.rng)?;
        self.steps += 1;
        debug!(game = self.number, step = self.steps, "{}", self.state.last_action);

        if let Some(winner) = self.state.winner().and_then(|id| self.state.get_player(id)) {
            info!(
                game = self.number,
                winner = %winner.name,
                turns = self.state.turn_number,
                "game finished"
            );
        }
        Ok(())
    }

    /// Play bot turns until the game ends or `max_steps` actions have been
    /// applied
    pub fn run_to_end(&mut self, max_steps: usize) -> Result<GameSummary, TableError> {
        while !self.state.is_finished() && self.steps < max_steps {
            self.step()?;
        }
        if !self.state.is_finished() {
            warn!(game = self.number, steps = self.steps, "step limit reached");
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> GameSummary {
        let mut standings: Vec<Standing> = self
            .state
            .players
            .iter()
            .map(|p| Standing {
                name: p.name.clone(),
                cash: p.cash,
                properties: p.properties.len(),
                net_worth: finance::liquidation_value(p, &self.state.board),
            })
            .collect();
        standings.sort_by(|a, b| b.net_worth.cmp(&a.net_worth));

        GameSummary {
            game: self.number,
            seed: self.seed,
            turns: self.state.turn_number,
            steps: self.steps,
            finished: self.state.is_finished(),
            winner: self
                .state
                .winner()
                .and_then(|id| self.state.get_player(id))
                .map(|p| p.name.clone()),
            standings,
        }
    }
}
