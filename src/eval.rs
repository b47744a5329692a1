/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{PieceKind, Position, Score, Side};

/// Evaluates the position from the side-to-move's perspective.
///
/// A positive score is good for the side to move. If that side has no legal
/// move, the result is a loss score when in check (biased by the number of
/// halfmoves played, so quicker mates are preferred) or a draw otherwise.
pub fn evaluate(position: &mut Position) -> Score {
    if position.no_valid_move_exists() {
        return if position.is_in_check(position.side_to_move()) {
            Score::loss(position.ply())
        } else {
            Score::DRAW
        };
    }

    let mover = position.side_to_move();
    Score(one_sided_eval(position, mover) - one_sided_eval(position, mover.opponent()))
}

/// Total material value of `side`'s live pieces, in pawns.
pub fn material(position: &Position, side: Side) -> i32 {
    position.live_pieces(side).map(|piece| piece.value()).sum()
}

/// Scores one side in isolation.
///
/// Material is weighted so heavily that the positional terms only ever break
/// ties between materially equal lines.
fn one_sided_eval(position: &Position, side: Side) -> i32 {
    let mut evaluation = 1000 * material(position, side);
    let mut pawn_on_file = [false; 8];

    for piece in position.live_pieces(side) {
        match piece.kind {
            PieceKind::Pawn => {
                // Gaining a rank near promotion is worth more than the same
                // step near home, hence the super-linear bonus.
                let progress = piece.progress_from_back_rank();
                evaluation += ((progress - 1) as f64).powf(1.5) as i32;

                let file = piece.square.col as usize;
                if pawn_on_file[file] {
                    evaluation -= 3;
                } else {
                    pawn_on_file[file] = true;
                }
                if !piece.unmoved {
                    evaluation += 1;
                }
            }
            PieceKind::King => {
                // Castling is good; otherwise moving the king out of position is bad.
                if piece.has_castled {
                    evaluation += 20;
                } else if !piece.unmoved {
                    evaluation -= 10;
                }
            }
            _ => {
                // Encourage development early in the game.
                if position.ply() < 20 {
                    evaluation += piece.progress_from_back_rank();
                }
                if !piece.unmoved {
                    evaluation += 3;
                }
            }
        }
    }

    // With only the king left, stay away from the edges and from the
    // opponent's king. (From the winner's perspective this drives the bare
    // king toward a corner, which is how overwhelming material forces mate.)
    if position.live_count(side) == 1 {
        let king = position.piece(position.king(side)).square;
        let opponent_king = position.piece(position.king(side.opponent())).square;
        evaluation += 3 * king.distance_from_edge() as i32;
        evaluation += (king.row_diff(opponent_king) + king.col_diff(opponent_king)) as i32;
    }

    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    #[test]
    fn test_starting_position_is_balanced() {
        let mut position = Position::default();
        assert_eq!(evaluate(&mut position), Score::DRAW);
    }

    #[test]
    fn test_material_dominates_positional_terms() {
        // White is up a queen; no arrangement of positional bonuses can
        // outweigh 9000 points.
        let mut position: Position = "4k3/8/8/8/8/8/8/Q3K3 w - - 0 1".parse().unwrap();
        let score = evaluate(&mut position);
        assert!(score > 8_000);

        // From Black's perspective the same material deficit is negative.
        let mut flipped: Position = "4k3/8/8/8/8/8/8/Q3K3 b - - 0 1".parse().unwrap();
        assert!(evaluate(&mut flipped) < -8_000);
    }

    #[test]
    fn test_checkmate_is_a_loss_for_the_mated_side() {
        // Back-rank mate: Black to move, no escape.
        let mut position: Position = "R3k3/8/4K3/8/8/8/8/8 b - - 0 1".parse().unwrap();
        let score = evaluate(&mut position);
        assert!(score.is_losing());
    }

    #[test]
    fn test_stalemate_evaluates_to_zero() {
        let mut position: Position = "k7/8/KQ6/8/8/8/8/8 b - - 0 1".parse().unwrap();
        assert_eq!(evaluate(&mut position), Score::DRAW);
    }

    #[test]
    fn test_doubled_pawns_are_penalized() {
        let mut doubled: Position = "4k3/8/8/8/8/3P4/3P4/4K3 w - - 0 1".parse().unwrap();
        let mut spread: Position = "4k3/8/8/8/8/4P3/3P4/4K3 w - - 0 1".parse().unwrap();
        assert!(evaluate(&mut doubled) < evaluate(&mut spread));
    }
}
