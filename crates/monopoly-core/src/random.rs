//! Injectable randomness.
//!
//! Dice and deck shuffles are the only non-determinism in the engine. They go
//! through `RandomSource` so a game can be replayed from a seed or driven by
//! fixed rolls in tests.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Source of dice rolls and shuffle indices
pub trait RandomSource {
    /// One die, uniform in 1..=6
    fn roll_die(&mut self) -> u8;

    /// Uniform index in `0..bound`. `bound` is never zero.
    fn below(&mut self, bound: usize) -> usize;
}

impl RandomSource for StdRng {
    fn roll_die(&mut self) -> u8 {
        self.gen_range(1..=6)
    }

    fn below(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound)
    }
}

/// Plays back a fixed sequence of rolls.
///
/// Once the script runs out every die shows 1. Shuffles never reorder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedDice {
    dice: VecDeque<u8>,
}

impl ScriptedDice {
    /// Script a sequence of `(die1, die2)` rolls
    pub fn new<I>(rolls: I) -> Self
    where
        I: IntoIterator<Item = (u8, u8)>,
    {
        let dice = rolls
            .into_iter()
            .flat_map(|(a, b)| [a, b])
            .collect();
        Self { dice }
    }

    /// Append another roll to the script
    pub fn push(&mut self, roll: (u8, u8)) {
        self.dice.push_back(roll.0);
        self.dice.push_back(roll.1);
    }

    /// Rolls left in the script
    pub fn remaining(&self) -> usize {
        self.dice.len() / 2
    }
}

impl RandomSource for ScriptedDice {
    fn roll_die(&mut self) -> u8 {
        self.dice.pop_front().unwrap_or(1).clamp(1, 6)
    }

    fn below(&mut self, bound: usize) -> usize {
        bound - 1
    }
}
