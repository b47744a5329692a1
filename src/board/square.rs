/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};

/// Number of ranks/files on the board.
pub const BOARD_SIZE: u8 = 8;

/// One of the two players in a chess game.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// Number of sides in a chess game.
    pub const COUNT: usize = 2;

    /// The side playing against this one.
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Index of this side into side-keyed arrays (White is 0).
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => write!(f, "White"),
            Self::Black => write!(f, "Black"),
        }
    }
}

/// A location on the board.
///
/// Row 0 is Black's back rank (rank 8 in algebraic notation) and row 7 is
/// White's, so White pawns march toward smaller row numbers.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    /// Creates a new [`Square`].
    ///
    /// Both coordinates must lie in `0..8`.
    #[inline(always)]
    pub fn new(row: u8, col: u8) -> Self {
        debug_assert!(row < BOARD_SIZE && col < BOARD_SIZE);
        Self { row, col }
    }

    /// Offsets this square by the provided deltas, if the result is still on
    /// the board.
    #[inline(always)]
    pub fn offset(&self, row_delta: i8, col_delta: i8) -> Option<Self> {
        let row = self.row as i8 + row_delta;
        let col = self.col as i8 + col_delta;
        ((0..BOARD_SIZE as i8).contains(&row) && (0..BOARD_SIZE as i8).contains(&col))
            .then(|| Self::new(row as u8, col as u8))
    }

    /// Absolute difference in rows between two squares.
    #[inline(always)]
    pub fn row_diff(&self, other: Square) -> u8 {
        self.row.abs_diff(other.row)
    }

    /// Absolute difference in columns between two squares.
    #[inline(always)]
    pub fn col_diff(&self, other: Square) -> u8 {
        self.col.abs_diff(other.col)
    }

    /// How far this square is from the nearest board edge (0 for edge squares).
    pub fn distance_from_edge(&self) -> u8 {
        let vertical = self.row.min(7 - self.row);
        let horizontal = self.col.min(7 - self.col);
        vertical.min(horizontal)
    }
}

impl fmt::Display for Square {
    /// Algebraic notation: file letter followed by rank number, e.g. `e4`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, 8 - self.row)
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            bail!("invalid square {s:?}: expected a file letter and a rank digit");
        };

        if !('a'..='h').contains(&file) {
            bail!("invalid square {s:?}: file must be in a..=h");
        }
        let Some(rank) = rank.to_digit(10).filter(|r| (1..=8).contains(r)) else {
            bail!("invalid square {s:?}: rank must be in 1..=8");
        };

        Ok(Self::new(8 - rank as u8, file as u8 - b'a'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algebraic_round_trip() {
        for row in 0..8 {
            for col in 0..8 {
                let square = Square::new(row, col);
                let parsed: Square = square.to_string().parse().unwrap();
                assert_eq!(parsed, square);
            }
        }

        assert_eq!(Square::new(7, 0).to_string(), "a1");
        assert_eq!(Square::new(0, 7).to_string(), "h8");
        assert_eq!("e4".parse::<Square>().unwrap(), Square::new(4, 4));
    }

    #[test]
    fn test_offset_stays_on_board() {
        let corner = Square::new(0, 0);
        assert_eq!(corner.offset(-1, 0), None);
        assert_eq!(corner.offset(0, -1), None);
        assert_eq!(corner.offset(2, 1), Some(Square::new(2, 1)));
    }
}
