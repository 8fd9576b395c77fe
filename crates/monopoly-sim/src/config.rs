//! Simulator configuration, read from the environment.

use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name}={value} is not valid")]
    Invalid { name: &'static str, value: String },

    #[error("SIM_PLAYERS must be between 2 and 8, got {0}")]
    PlayerCount(usize),
}

/// How many games to play and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub games: u32,
    pub players: usize,
    /// Game `n` is seeded with `seed + n`
    pub seed: u64,
    /// Actions after which an unfinished game is abandoned
    pub max_steps: usize,
    /// Print one JSON summary line per game on stdout
    pub json: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            games: 10,
            players: 4,
            seed: 42,
            max_steps: 20_000,
            json: false,
        }
    }
}

impl SimConfig {
    /// Read `SIM_GAMES`, `SIM_PLAYERS`, `SIM_SEED`, `SIM_MAX_STEPS` and
    /// `SIM_JSON`, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            games: parse(&lookup, "SIM_GAMES", defaults.games)?,
            players: parse(&lookup, "SIM_PLAYERS", defaults.players)?,
            seed: parse(&lookup, "SIM_SEED", defaults.seed)?,
            max_steps: parse(&lookup, "SIM_MAX_STEPS", defaults.max_steps)?,
            json: parse(&lookup, "SIM_JSON", defaults.json)?,
        };

        if !(2..=8).contains(&config.players) {
            return Err(ConfigError::PlayerCount(config.players));
        }
        Ok(config)
    }
}

fn parse<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
