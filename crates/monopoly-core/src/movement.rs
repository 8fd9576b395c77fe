//! Dice and token movement.

use crate::board::{Board, ColorGroup, Money, BOARD_SIZE};
use crate::cards::NearestKind;
use crate::random::RandomSource;

/// Salary collected when passing or landing on GO
pub const GO_SALARY: Money = 200;

/// Fine to leave jail
pub const JAIL_FINE: Money = 50;

/// Failed rolls in jail before the fine is forced
pub const MAX_JAIL_ROLLS: u8 = 3;

/// Doubles in a row that send a player to jail
pub const SPEEDING_DOUBLES: u8 = 3;

/// Roll two dice
pub fn roll_dice<R: RandomSource + ?Sized>(rng: &mut R) -> (u8, u8) {
    (rng.roll_die(), rng.roll_die())
}

pub fn is_double(dice: (u8, u8)) -> bool {
    dice.0 == dice.1
}

/// Move forward from `position`; returns the new position and whether GO was
/// passed (or landed on).
pub fn advance(position: u8, spaces: u8) -> (u8, bool) {
    let raw = position as u16 + spaces as u16;
    ((raw % BOARD_SIZE as u16) as u8, raw >= BOARD_SIZE as u16)
}

/// Move backward; never passes GO
pub fn step_back(position: u8, spaces: u8) -> u8 {
    let size = BOARD_SIZE as i16;
    ((position as i16 - spaces as i16).rem_euclid(size)) as u8
}

/// Forward distance from `from` to `to`
pub fn distance(from: u8, to: u8) -> u8 {
    ((to as i16 - from as i16).rem_euclid(BOARD_SIZE as i16)) as u8
}

/// The first station or utility strictly ahead of `from`
pub fn nearest_forward(board: &Board, from: u8, kind: NearestKind) -> u8 {
    let group = match kind {
        NearestKind::Station => ColorGroup::Station,
        NearestKind::Utility => ColorGroup::Utility,
    };

    board
        .group(group)
        .map(|s| s.index)
        .min_by_key(|&index| match distance(from, index) {
            0 => BOARD_SIZE,
            d => d,
        })
        .unwrap_or(from)
}
