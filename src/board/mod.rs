/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The board: pieces, squares, moves, legality, and the reversible
//! make/unmake protocol.

/// FEN parsing and the structured [`Setup`] placement.
mod fen;
/// Legal move generation per piece kind.
mod movegen;
/// Moves, their kinds, and undo records.
mod moves;
/// Piece kinds, pieces, and stable piece handles.
mod piece;
/// The full position and its mutation protocol.
mod position;
/// Compile-time pseudo-random number generation.
mod prng;
/// Squares and sides.
mod square;
/// Zobrist hashing.
mod zobrist;

pub use fen::*;
pub use movegen::{is_checking, valid_move_exists, valid_moves};
pub use moves::*;
pub use piece::*;
pub use position::*;
pub use prng::*;
pub use square::*;
pub use zobrist::*;
