/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

use super::{PieceId, PieceKind, Position, Side, Square};

/// Maximum possible number of moves in a given chess position.
///
/// Found [here](<https://www.chessprogramming.org/Chess_Position#cite_note-4>)
pub const MAX_NUM_MOVES: usize = 218;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// The different kinds of moves that can be made during a chess game.
///
/// Castling, en passant and promotion bundle the extra state they need to be
/// applied and reverted; everything else (quiet moves, ordinary captures,
/// pawn double steps) is [`MoveKind::Standard`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum MoveKind {
    /// A single piece relocating, capturing whatever occupies the destination.
    Standard,

    /// The King stepping two files toward a Rook, which hops to the King's
    /// other side. The rook shift is applied and reverted atomically with the
    /// king move, but is not separately recorded in history or clocks.
    Castle {
        rook: PieceId,
        rook_from: Square,
        rook_to: Square,
    },

    /// A pawn capture whose victim does not occupy the destination square.
    ///
    /// Modeled as "shift the victim onto the destination, then capture", so
    /// the generic capture machinery applies unchanged.
    EnPassant {
        /// Where the captured pawn actually stands (same row as the attacker,
        /// same column as the destination).
        victim_from: Square,
    },

    /// A pawn reaching the last rank and becoming `promote_to`.
    ///
    /// The pawn's array slot is reused for the promoted piece, preserving
    /// slot identity across make/unmake.
    Promotion { promote_to: PieceKind },
}

/// A move on a chess board.
///
/// Pieces are referenced by [`PieceId`], so a move is meaningful on any
/// position sharing the same slot layout; in particular, on both a search
/// clone and the authoritative position it was cloned from.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Move {
    pub piece: PieceId,
    pub from: Square,
    pub to: Square,
    /// The piece captured by this move, if any.
    pub captured: Option<PieceId>,
    pub kind: MoveKind,
}

impl Move {
    /// A standard move (quiet or capturing the destination's occupant).
    pub fn standard(position: &Position, piece: PieceId, to: Square) -> Self {
        Self {
            piece,
            from: position.piece(piece).square,
            to,
            captured: position.id_at(to),
            kind: MoveKind::Standard,
        }
    }

    /// A castling move for the king heading to `to`, bundling the rook shift.
    pub fn castle(position: &Position, king: PieceId, to: Square) -> Self {
        let (rook_from_col, rook_to_col) = if to.col == 2 { (0, 3) } else { (7, 5) };
        let rook_from = Square::new(to.row, rook_from_col);
        let rook = position
            .id_at(rook_from)
            .expect("castling requires a rook in the corner");

        Self {
            piece: king,
            from: position.piece(king).square,
            to,
            captured: None,
            kind: MoveKind::Castle {
                rook,
                rook_from,
                rook_to: Square::new(to.row, rook_to_col),
            },
        }
    }

    /// An en passant capture of the pawn standing beside the attacker.
    pub fn en_passant(position: &Position, pawn: PieceId, to: Square) -> Self {
        let from = position.piece(pawn).square;
        let victim_from = Square::new(from.row, to.col);

        Self {
            piece: pawn,
            from,
            to,
            captured: position.id_at(victim_from),
            kind: MoveKind::EnPassant { victim_from },
        }
    }

    /// A promotion of `pawn` upon reaching `to`.
    pub fn promotion(
        position: &Position,
        pawn: PieceId,
        to: Square,
        promote_to: PieceKind,
    ) -> Self {
        Self {
            piece: pawn,
            from: position.piece(pawn).square,
            to,
            captured: position.id_at(to),
            kind: MoveKind::Promotion { promote_to },
        }
    }

    /// Absolute number of rows this move covers.
    #[inline(always)]
    pub fn row_diff(&self) -> u8 {
        self.from.row_diff(self.to)
    }

    /// Signed row progress toward the opponent's back rank.
    #[inline(always)]
    pub fn row_progress(&self) -> i32 {
        match self.piece.side {
            Side::White => self.from.row as i32 - self.to.row as i32,
            Side::Black => self.to.row as i32 - self.from.row as i32,
        }
    }

    /// A move is "interesting" iff it captures or promotes.
    ///
    /// Quiescence search expands interesting moves only.
    #[inline(always)]
    pub fn is_interesting(&self) -> bool {
        self.captured.is_some() || matches!(self.kind, MoveKind::Promotion { .. })
    }

    /// Finds the legal move matching a coordinate-notation string such as
    /// `e2e4` or `e7e8q` (the trailing letter selects the promotion kind).
    pub fn from_coords(position: &mut Position, s: &str) -> Result<Self> {
        let (Some(from), Some(to)) = (s.get(0..2), s.get(2..4)) else {
            bail!("invalid move {s:?}: expected coordinates like e2e4 or e7e8q");
        };
        if s.len() > 5 {
            bail!("invalid move {s:?}: expected coordinates like e2e4 or e7e8q");
        }
        let from: Square = from.parse()?;
        let to: Square = to.parse()?;
        let promotion = match s.as_bytes().get(4) {
            Some(&letter) => Some(PieceKind::from_letter(letter as char)?),
            None => None,
        };

        let found = position.legal_moves().into_iter().find(|mv| {
            mv.from == from
                && mv.to == to
                && match mv.kind {
                    MoveKind::Promotion { promote_to } => Some(promote_to) == promotion,
                    _ => promotion.is_none(),
                }
        });

        match found {
            Some(mv) => Ok(mv),
            None => bail!("{s} is not a legal move in this position"),
        }
    }
}

impl fmt::Display for Move {
    /// Coordinate notation: source square, destination square, and the
    /// promotion letter if applicable.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let MoveKind::Promotion { promote_to } = self.kind {
            write!(f, "{}", promote_to.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

/// Everything [`Position::make`] changes that cannot be recomputed from the
/// [`Move`] itself, captured so [`Position::undo`] can restore it exactly.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Undo {
    /// The moving piece's `unmoved` flag before the move.
    pub mover_was_unmoved: bool,
    /// The halfmove clock before the move.
    pub halfmove_clock: u32,
    /// The king's `has_castled` flag before the move (castling only).
    pub king_had_castled: bool,
}
