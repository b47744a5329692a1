/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Legal move generation.
//!
//! Generation is pseudo-legal geometry followed by a legality filter that
//! simulates each candidate (make, test for check, unmake) and discards any
//! move that would leave the mover's own king in check. The generators
//! therefore take `&mut Position`; every position they are handed is restored
//! exactly before they return.

use super::{Move, MoveList, Piece, PieceId, PieceKind, Position, Side, Square};

const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (2, 1),
    (2, -1),
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
];

/// Whether the piece `id` currently attacks the opposing king's square.
pub fn is_checking(position: &Position, id: PieceId) -> bool {
    let piece = position.piece(id);
    let king_square = position.piece(position.king(id.side.opponent())).square;
    let row_diff = king_square.row_diff(piece.square);
    let col_diff = king_square.col_diff(piece.square);

    match piece.kind {
        PieceKind::Pawn => {
            let forward = king_square.row as i8 - piece.square.row as i8;
            col_diff == 1 && forward == pawn_direction(id.side)
        }
        PieceKind::Knight => row_diff != 0 && col_diff != 0 && row_diff + col_diff == 3,
        PieceKind::Bishop => is_checking_diagonally(position, piece.square, king_square),
        PieceKind::Rook => is_checking_orthogonally(position, piece.square, king_square),
        PieceKind::Queen => {
            is_checking_orthogonally(position, piece.square, king_square)
                || is_checking_diagonally(position, piece.square, king_square)
        }
        PieceKind::King => row_diff <= 1 && col_diff <= 1,
    }
}

/// Whether `from` attacks `king_square` along a rank or file, with every
/// square in between empty.
fn is_checking_orthogonally(position: &Position, from: Square, king_square: Square) -> bool {
    if from.row != king_square.row && from.col != king_square.col {
        return false;
    }
    clear_path_between(position, from, king_square)
}

/// Whether `from` attacks `king_square` along a diagonal, with every square
/// in between empty.
fn is_checking_diagonally(position: &Position, from: Square, king_square: Square) -> bool {
    if from.row_diff(king_square) != from.col_diff(king_square) {
        return false;
    }
    clear_path_between(position, from, king_square)
}

/// Whether every square strictly between two (aligned) squares is empty.
fn clear_path_between(position: &Position, from: Square, to: Square) -> bool {
    let row_step = (to.row as i8 - from.row as i8).signum();
    let col_step = (to.col as i8 - from.col as i8).signum();

    let mut square = from;
    loop {
        square = match square.offset(row_step, col_step) {
            Some(next) => next,
            None => return false,
        };
        if square == to {
            return true;
        }
        if position.piece_at(square).is_some() {
            return false;
        }
    }
}

/// Every legal move for the piece `id`.
pub fn valid_moves(position: &mut Position, id: PieceId) -> MoveList {
    generate(position, id, false)
}

/// Whether any legal move exists for the piece `id`.
///
/// Short-circuits on the first legal move found, so stalemate/checkmate
/// detection never allocates full move lists.
pub fn valid_move_exists(position: &mut Position, id: PieceId) -> bool {
    !generate(position, id, true).is_empty()
}

fn generate(position: &mut Position, id: PieceId, stop_at_first: bool) -> MoveList {
    let mut moves = MoveList::new();

    match position.piece(id).kind {
        PieceKind::Pawn => pawn_moves(position, id, stop_at_first, &mut moves),
        PieceKind::Knight => {
            offset_moves(position, id, &KNIGHT_JUMPS, stop_at_first, &mut moves)
        }
        PieceKind::Bishop => slider_moves(position, id, &DIAGONALS, stop_at_first, &mut moves),
        PieceKind::Rook => slider_moves(position, id, &ORTHOGONALS, stop_at_first, &mut moves),
        PieceKind::Queen => {
            slider_moves(position, id, &ORTHOGONALS, stop_at_first, &mut moves);
            if moves.is_empty() || !stop_at_first {
                slider_moves(position, id, &DIAGONALS, stop_at_first, &mut moves);
            }
        }
        PieceKind::King => king_moves(position, id, stop_at_first, &mut moves),
    }

    moves
}

/// Appends `mv` if it does not leave the mover's king in check.
///
/// Returns `true` once the caller should stop generating.
fn try_push(position: &mut Position, mv: Move, moves: &mut MoveList, stop_at_first: bool) -> bool {
    if position.would_be_in_check(mv, mv.piece.side) {
        return false;
    }
    moves.push(mv);
    stop_at_first
}

fn slider_moves(
    position: &mut Position,
    id: PieceId,
    directions: &[(i8, i8)],
    stop_at_first: bool,
    moves: &mut MoveList,
) {
    let from = position.piece(id).square;

    for &(row_step, col_step) in directions {
        let mut square = from;
        while let Some(next) = square.offset(row_step, col_step) {
            match position.piece_at(next).map(|occupant| occupant.side) {
                None => {
                    let mv = Move::standard(position, id, next);
                    if try_push(position, mv, moves, stop_at_first) {
                        return;
                    }
                    square = next;
                }
                Some(occupant_side) => {
                    // Blocked; an enemy blocker can still be captured.
                    if occupant_side != id.side {
                        let mv = Move::standard(position, id, next);
                        if try_push(position, mv, moves, stop_at_first) {
                            return;
                        }
                    }
                    break;
                }
            }
        }
    }
}

fn offset_moves(
    position: &mut Position,
    id: PieceId,
    offsets: &[(i8, i8)],
    stop_at_first: bool,
    moves: &mut MoveList,
) {
    let from = position.piece(id).square;

    for &(row_delta, col_delta) in offsets {
        let Some(to) = from.offset(row_delta, col_delta) else {
            continue;
        };
        if position.piece_at(to).is_some_and(|occupant| occupant.side == id.side) {
            continue;
        }
        let mv = Move::standard(position, id, to);
        if try_push(position, mv, moves, stop_at_first) {
            return;
        }
    }
}

const KING_STEPS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

fn king_moves(position: &mut Position, id: PieceId, stop_at_first: bool, moves: &mut MoveList) {
    offset_moves(position, id, &KING_STEPS, stop_at_first, moves);
    if stop_at_first && !moves.is_empty() {
        return;
    }

    // Castling is only worth examining for an unmoved king.
    if !position.piece(id).unmoved {
        return;
    }
    let from = position.piece(id).square;
    for to_col_delta in [-2i8, 2] {
        let Some(to) = from.offset(0, to_col_delta) else {
            continue;
        };
        if castling_possible(position, id, to) {
            let mv = Move::castle(position, id, to);
            if try_push(position, mv, moves, stop_at_first) {
                return;
            }
        }
    }
}

/// Castling preconditions other than "the destination is safe" (which the
/// usual legality filter covers): king and rook both unmoved, king not
/// currently in check, the square the king passes through not attacked, and
/// every square between king and rook empty.
fn castling_possible(position: &mut Position, king: PieceId, to: Square) -> bool {
    let from = position.piece(king).square;
    if from.row != to.row || from.col_diff(to) != 2 || position.is_in_check(king.side) {
        return false;
    }

    let rook_col = if to.col == 2 { 0 } else { 7 };
    let rook_square = Square::new(to.row, rook_col);
    let Some(rook) = position.piece_at(rook_square).copied() else {
        return false;
    };
    if rook.kind != PieceKind::Rook || rook.side != king.side || !rook.unmoved {
        return false;
    }

    // Can't castle through check.
    let intermediate = Square::new(to.row, (from.col + to.col) / 2);
    let step = Move::standard(position, king, intermediate);
    if position.would_be_in_check(step, king.side) {
        return false;
    }

    let (low, high) = (from.col.min(rook_col), from.col.max(rook_col));
    for col in low + 1..high {
        if position.piece_at(Square::new(from.row, col)).is_some() {
            return false;
        }
    }

    true
}

#[inline(always)]
fn pawn_direction(side: Side) -> i8 {
    match side {
        Side::White => -1,
        Side::Black => 1,
    }
}

fn pawn_moves(position: &mut Position, id: PieceId, stop_at_first: bool, moves: &mut MoveList) {
    let piece = *position.piece(id);
    let direction = pawn_direction(id.side);

    for col_delta in [-1i8, 0, 1] {
        let Some(to) = piece.square.offset(direction, col_delta) else {
            continue;
        };
        if is_promotion_rank(id.side, to) {
            // If promotion applies, no other move type is possible for this
            // destination.
            promotion_moves(position, id, to, stop_at_first, moves);
            if stop_at_first && !moves.is_empty() {
                return;
            }
        } else if col_delta != 0 && en_passant_possible(position, &piece, to) {
            let mv = Move::en_passant(position, id, to);
            if try_push(position, mv, moves, stop_at_first) {
                return;
            }
        } else if can_reach(position, &piece, to) {
            let mv = Move::standard(position, id, to);
            if try_push(position, mv, moves, stop_at_first) {
                return;
            }
        }
    }

    if piece.unmoved {
        if let Some(to) = piece.square.offset(direction * 2, 0) {
            if can_reach(position, &piece, to) {
                let mv = Move::standard(position, id, to);
                try_push(position, mv, moves, stop_at_first);
            }
        }
    }
}

/// Whether the pawn can step or capture onto `to` with an ordinary move.
fn can_reach(position: &Position, pawn: &Piece, to: Square) -> bool {
    let from = pawn.square;

    // A double step needs both the intervening and destination squares empty.
    if pawn.unmoved && to.col == from.col && from.row_diff(to) == 2 {
        let intervening = Square::new((from.row + to.row) / 2, from.col);
        return position.piece_at(to).is_none() && position.piece_at(intervening).is_none();
    }
    if from.row_diff(to) != 1 {
        return false;
    }

    // Single step forward onto an empty square.
    if to.col == from.col {
        return position.piece_at(to).is_none();
    }

    // Diagonal step, which must capture.
    from.col_diff(to) == 1
        && position
            .piece_at(to)
            .is_some_and(|occupant| occupant.side != pawn.side)
}

/// En passant is available only immediately after an enemy pawn's double step
/// landed beside this pawn, which is verified against the move history.
fn en_passant_possible(position: &Position, pawn: &Piece, to: Square) -> bool {
    let from = pawn.square;
    let on_capture_rank = match pawn.side {
        Side::White => from.row == 3 && to.row == 2,
        Side::Black => from.row == 4 && to.row == 5,
    };
    if !on_capture_rank || from.row_diff(to) != 1 || from.col_diff(to) != 1 {
        return false;
    }

    let victim_square = Square::new(from.row, to.col);
    if !position
        .piece_at(victim_square)
        .is_some_and(|victim| victim.kind == PieceKind::Pawn && victim.side != pawn.side)
    {
        return false;
    }

    // The victim must have just arrived there with a double step.
    position.last_move().is_some_and(|last| {
        last.to == victim_square && last.row_diff() == 2
    })
}

#[inline(always)]
fn is_promotion_rank(side: Side, to: Square) -> bool {
    match side {
        Side::White => to.row == 0,
        Side::Black => to.row == 7,
    }
}

/// Generates one candidate per promotable kind.
///
/// All four variants share from/to geometry, so a single legality simulation
/// (with the queen stand-in) covers them all.
fn promotion_moves(
    position: &mut Position,
    id: PieceId,
    to: Square,
    stop_at_first: bool,
    moves: &mut MoveList,
) {
    let from = position.piece(id).square;

    // Straight ahead must be empty; diagonally must capture an enemy.
    if from.col == to.col && position.piece_at(to).is_some() {
        return;
    }
    if from.col != to.col
        && !position
            .piece_at(to)
            .is_some_and(|occupant| occupant.side != id.side)
    {
        return;
    }

    let sample = Move::promotion(position, id, to, PieceKind::Queen);
    if position.would_be_in_check(sample, id.side) {
        return;
    }

    moves.push(sample);
    if stop_at_first {
        return;
    }
    for kind in [PieceKind::Rook, PieceKind::Knight, PieceKind::Bishop] {
        moves.push(Move::promotion(position, id, to, kind));
    }
}
