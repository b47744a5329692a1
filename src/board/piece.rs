/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

use super::{Side, Square};

/// The six kinds of chess pieces.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Number of piece kinds.
    pub const COUNT: usize = 6;

    /// Kinds a pawn may promote to.
    pub const PROMOTIONS: [Self; 4] = [Self::Queen, Self::Rook, Self::Knight, Self::Bishop];

    /// Material value of this kind, in pawns.
    #[inline(always)]
    pub const fn value(&self) -> i32 {
        match self {
            Self::Pawn => 1,
            Self::Knight => 3,
            Self::Bishop => 3,
            Self::Rook => 5,
            Self::Queen => 9,
            // The King can never be captured, so 0 is easier to work with in computations
            Self::King => 0,
        }
    }

    /// Stable per-kind index, used for Zobrist key lookup.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// The letter used for this kind in FEN notation (uppercase).
    #[inline(always)]
    pub const fn letter(&self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    /// Parses a FEN letter (either case) into a kind.
    pub fn from_letter(letter: char) -> Result<Self> {
        Ok(match letter.to_ascii_uppercase() {
            'P' => Self::Pawn,
            'N' => Self::Knight,
            'B' => Self::Bishop,
            'R' => Self::Rook,
            'Q' => Self::Queen,
            'K' => Self::King,
            _ => bail!("invalid piece letter {letter:?}"),
        })
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pawn => "Pawn",
            Self::Knight => "Knight",
            Self::Bishop => "Bishop",
            Self::Rook => "Rook",
            Self::Queen => "Queen",
            Self::King => "King",
        };
        write!(f, "{name}")
    }
}

/// A stable handle to a piece: the side it belongs to plus its slot in that
/// side's piece array.
///
/// Slots are assigned at setup time and never reused or compacted, so an id
/// stays valid across make/unmake and across position clones. A [`crate::Move`]
/// refers to pieces exclusively through ids, which is what lets a move found
/// on a search clone be applied directly to the authoritative position.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct PieceId {
    pub side: Side,
    pub index: u8,
}

impl PieceId {
    #[inline(always)]
    pub const fn new(side: Side, index: u8) -> Self {
        Self { side, index }
    }
}

/// A single piece on the board.
///
/// Captured pieces are soft-deleted: they keep their array slot with the
/// `taken` flag set, so slot indices stay stable when a capture is unmade.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
    pub square: Square,
    /// Still eligible for castling (kings/rooks) or a double step (pawns).
    pub unmoved: bool,
    /// Soft-delete flag; a taken piece is absent from the grid.
    pub taken: bool,
    /// Set on kings once they castle. Evaluation term only.
    pub has_castled: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, side: Side, square: Square, unmoved: bool) -> Self {
        Self {
            kind,
            side,
            square,
            unmoved,
            taken: false,
            has_castled: false,
        }
    }

    /// Material value of this piece, in pawns.
    #[inline(always)]
    pub const fn value(&self) -> i32 {
        self.kind.value()
    }

    /// How many ranks this piece has advanced from its side's back rank.
    #[inline(always)]
    pub fn progress_from_back_rank(&self) -> i32 {
        match self.side {
            Side::White => 7 - self.square.row as i32,
            Side::Black => self.square.row as i32,
        }
    }

    /// The letter used for this piece in FEN notation: uppercase for White,
    /// lowercase for Black.
    pub fn letter(&self) -> char {
        match self.side {
            Side::White => self.kind.letter(),
            Side::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:<6}", self.side, self.kind.to_string())
    }
}
