/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use crate::{Move, MoveKind, MoveList, PieceKind, Position, Side, BOARD_SIZE, MAX_NUM_MOVES};

/// Yields moves in descending heuristic order.
///
/// Each move is scored exactly once at construction; iteration then performs
/// a lazy selection sort, so a search that cuts off early never pays for
/// ordering the rest of the list. Ordering affects only how fast alpha-beta
/// prunes, never which move is ultimately chosen.
pub struct MovePicker {
    moves: MoveList,
    scores: ArrayVec<i32, MAX_NUM_MOVES>,
    current: usize,
}

impl MovePicker {
    pub fn new(moves: MoveList, position: &Position) -> Self {
        let pawn_attacked = pawn_attacked_squares(position);

        let mut scores = ArrayVec::default();
        for mv in moves.iter() {
            scores.push(heuristic(position, mv, &pawn_attacked));
        }

        Self {
            moves,
            scores,
            current: 0,
        }
    }
}

impl Iterator for MovePicker {
    type Item = (Move, i32);

    fn next(&mut self) -> Option<Self::Item> {
        // No more moves left
        if self.current >= self.moves.len() {
            return None;
        }

        // Find the index of the next highest score
        let mut best_index = self.current;
        let mut best_score = self.scores[best_index];
        for i in (self.current + 1)..self.moves.len() {
            if self.scores[i] > best_score {
                best_index = i;
                best_score = self.scores[i];
            }
        }

        // Swap, if necessary
        if best_index != self.current {
            self.moves.swap(self.current, best_index);
            self.scores.swap(self.current, best_index);
        }

        let mv = self.moves[self.current];
        let score = self.scores[self.current];
        self.current += 1;

        Some((mv, score))
    }
}

/// A cheap, search-free estimate of how promising a move is:
///
/// - capturing a high-value piece with a low-value attacker scores best,
/// - promotions score by the promoted piece's value,
/// - developing a piece off its starting square (except the king) and pawn
///   progress earn small bonuses,
/// - landing on a square attacked by an enemy pawn is penalized by the
///   mover's value.
fn heuristic(position: &Position, mv: &Move, pawn_attacked: &SquareSet) -> i32 {
    let mut score = 0;
    let mover = position.piece(mv.piece);

    if let Some(victim) = mv.captured {
        score += position.piece(victim).value() * 10 - mover.value();
    }
    if let MoveKind::Promotion { promote_to } = mv.kind {
        score += promote_to.value() - 1;
    }
    if mover.unmoved && mover.kind != PieceKind::King {
        score += mv.row_progress();
    }
    if mover.kind == PieceKind::Pawn {
        score += mv.row_progress();
    } else if pawn_attacked[mv.to.row as usize][mv.to.col as usize] {
        score -= mover.value();
    }

    score
}

type SquareSet = [[bool; BOARD_SIZE as usize]; BOARD_SIZE as usize];

/// The squares attacked by the opponent's pawns: cheap danger zones for the
/// side to move.
fn pawn_attacked_squares(position: &Position) -> SquareSet {
    let mut attacked = SquareSet::default();
    let opponent = position.side_to_move().opponent();
    let forward: i8 = match opponent {
        Side::White => -1,
        Side::Black => 1,
    };

    for pawn in position
        .live_pieces(opponent)
        .filter(|piece| piece.kind == PieceKind::Pawn)
    {
        for col_delta in [-1, 1] {
            if let Some(square) = pawn.square.offset(forward, col_delta) {
                attacked[square.row as usize][square.col as usize] = true;
            }
        }
    }

    attacked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_are_tried_first() {
        // White can take the queen on d5 with the c4 pawn, among many quiet moves.
        let mut position: Position = "4k3/8/8/3q4/2P5/8/8/4K3 w - - 0 1".parse().unwrap();
        let picker = MovePicker::new(position.legal_moves(), &position);
        let (first, score) = picker.into_iter().next().unwrap();
        assert_eq!(first.to_string(), "c4d5", "got score {score}");
    }

    #[test]
    fn test_descending_order() {
        let mut position = Position::default();
        let scores: Vec<i32> = MovePicker::new(position.legal_moves(), &position)
            .map(|(_, score)| score)
            .collect();
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));
        assert_eq!(scores.len(), 20);
    }
}
