/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! End-to-end rules scenarios: full games of make/undo bookkeeping driven
//! through the public API.

use newt::{
    is_checking, valid_move_exists, valid_moves, DrawReason, Move, MoveKind, PieceKind, Position,
    Side, Square, Status,
};

fn pos(fen: &str) -> Position {
    fen.parse().unwrap()
}

fn play(position: &mut Position, coords: &str) {
    let mv = Move::from_coords(position, coords).unwrap();
    position.play(mv).unwrap();
}

#[test]
fn twenty_moves_from_the_starting_position() {
    let mut position = Position::default();
    assert!(!position.no_valid_move_exists());

    let moves = position.legal_moves();
    assert_eq!(moves.len(), 20);

    // 16 pawn moves and 4 knight moves, nothing else.
    let pawn_moves = moves
        .iter()
        .filter(|mv| position.piece(mv.piece).kind == PieceKind::Pawn)
        .count();
    let knight_moves = moves
        .iter()
        .filter(|mv| position.piece(mv.piece).kind == PieceKind::Knight)
        .count();
    assert_eq!(pawn_moves, 16);
    assert_eq!(knight_moves, 4);
}

#[test]
fn queen_next_to_the_king_is_checkmate() {
    // The queen stands beside the king, protected by its own king; no
    // escape, block, or capture exists.
    let position = pos("k7/1Q6/K7/8/8/8/8/8 b - - 0 1");

    let queen = position.id_at("b7".parse().unwrap()).unwrap();
    assert!(is_checking(&position, queen));

    let mut position = position;
    assert!(position.no_valid_move_exists());
    assert_eq!(
        position.status(),
        Status::Checkmate {
            winner: Side::White
        }
    );
    assert!(position.end_of_game_message().unwrap().contains("White"));
}

#[test]
fn castling_relocates_the_rook() {
    let mut position = pos("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");

    let king_moves = position.legal_moves_from("e1".parse().unwrap());
    let castles: Vec<&Move> = king_moves
        .iter()
        .filter(|mv| matches!(mv.kind, MoveKind::Castle { .. }))
        .collect();
    let destinations: Vec<String> = castles.iter().map(|mv| mv.to.to_string()).collect();
    assert!(destinations.contains(&"g1".to_string()));
    assert!(destinations.contains(&"c1".to_string()));

    play(&mut position, "e1c1");

    let d1: Square = "d1".parse().unwrap();
    assert_eq!(
        position.piece_at(d1).map(|piece| piece.kind),
        Some(PieceKind::Rook)
    );
    assert!(position.piece_at("a1".parse().unwrap()).is_none());
    assert!(position.piece(position.king(Side::White)).has_castled);
    position.assert_consistent(None);
}

#[test]
fn castling_is_blocked_through_check() {
    // The black rook on f8 attacks f1, the square the king would pass
    // through when castling short.
    let mut position = pos("4kr2/8/8/8/8/8/8/4K2R w K - 0 1");
    let king_moves = position.legal_moves_from("e1".parse().unwrap());
    assert!(
        !king_moves.iter().any(|mv| matches!(mv.kind, MoveKind::Castle { .. })),
        "castling through an attacked square must be illegal"
    );
}

#[test]
fn en_passant_captures_the_double_stepped_pawn() {
    let mut position = pos("4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1");
    play(&mut position, "e2e4");

    // The black pawn may now capture en passant.
    let d4: Square = "d4".parse().unwrap();
    let pawn_moves = position.legal_moves_from(d4);
    let ep = pawn_moves
        .iter()
        .find(|mv| matches!(mv.kind, MoveKind::EnPassant { .. }))
        .copied()
        .expect("en passant must be available");
    assert_eq!(ep.to.to_string(), "e3");

    position.play(ep).unwrap();

    // The captured pawn was on e4, not on the destination square e3.
    assert!(position.piece_at("e4".parse().unwrap()).is_none());
    assert_eq!(
        position.piece_at("e3".parse().unwrap()).map(|p| p.side),
        Some(Side::Black)
    );
    assert_eq!(position.live_count(Side::White), 1);
    position.assert_consistent(None);
}

#[test]
fn en_passant_expires_after_an_unrelated_move() {
    let mut position = pos("4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1");
    play(&mut position, "e2e4");
    play(&mut position, "e8d8");
    play(&mut position, "e1d1");

    let pawn_moves = position.legal_moves_from("d4".parse().unwrap());
    assert!(
        !pawn_moves.iter().any(|mv| matches!(mv.kind, MoveKind::EnPassant { .. })),
        "en passant is only available immediately after the double step"
    );
}

#[test]
fn promotion_offers_four_kinds_and_reuses_the_slot() {
    let mut position = pos("8/P7/8/8/8/8/7k/K7 w - - 0 1");

    let moves = position.legal_moves_from("a7".parse().unwrap());
    let mut offered: Vec<PieceKind> = moves
        .iter()
        .filter_map(|mv| match mv.kind {
            MoveKind::Promotion { promote_to } => Some(promote_to),
            _ => None,
        })
        .collect();
    offered.sort_by_key(|kind| kind.index());
    assert_eq!(
        offered,
        vec![
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen
        ]
    );
    assert_eq!(moves.len(), 4, "a promoting pawn has no other moves");

    let knight = moves
        .iter()
        .find(|mv| matches!(mv.kind, MoveKind::Promotion { promote_to } if promote_to == PieceKind::Knight))
        .copied()
        .unwrap();
    let slot = knight.piece;
    position.play(knight).unwrap();

    let promoted = position.piece(slot);
    assert_eq!(promoted.kind, PieceKind::Knight);
    assert_eq!(promoted.side, Side::White);
    assert_eq!(promoted.square.to_string(), "a8");
    position.assert_consistent(None);
}

#[test]
fn bare_kings_are_an_immediate_draw() {
    for fen in ["k7/8/8/8/8/8/8/K7 w - - 0 1", "k7/8/8/8/8/8/8/K7 b - - 0 1"] {
        let position = pos(fen);
        assert_eq!(
            position.status(),
            Status::Draw(DrawReason::InsufficientMaterial),
            "{fen} should be drawn regardless of the side to move"
        );
    }
}

#[test]
fn king_and_minor_piece_cannot_win() {
    let position = pos("k7/8/8/8/8/8/8/KB6 w - - 0 1");
    assert_eq!(
        position.status(),
        Status::Draw(DrawReason::InsufficientMaterial)
    );

    // A rook is mating material.
    let position = pos("k7/8/8/8/8/8/8/KR6 b - - 0 1");
    assert_eq!(position.status(), Status::Ongoing);
}

#[test]
fn valid_move_exists_agrees_with_full_generation() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "k7/1Q6/K7/8/8/8/8/8 b - - 0 1",        // checkmated
        "k7/8/KQ6/8/8/8/8/8 b - - 0 1",         // stalemated
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    ];

    for fen in fens {
        let mut position = pos(fen);

        let all_moves = position.legal_moves();
        assert_eq!(
            position.no_valid_move_exists(),
            all_moves.is_empty(),
            "aggregate disagreement on {fen}"
        );

        for side in [Side::White, Side::Black] {
            for id in position.ids(side).collect::<Vec<_>>() {
                if position.piece(id).taken {
                    continue;
                }
                let moves = valid_moves(&mut position, id);
                assert_eq!(
                    valid_move_exists(&mut position, id),
                    !moves.is_empty(),
                    "per-piece disagreement on {fen}"
                );
            }
        }
    }
}

#[test]
fn moves_never_leave_the_own_king_in_check() {
    let fens = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3", // in check
    ];

    for fen in fens {
        let mut position = pos(fen);
        let mover = position.side_to_move();
        for mv in position.legal_moves() {
            let undo = position.make(mv);
            assert!(
                !position.is_in_check(mover),
                "{mv} on {fen} leaves the king in check"
            );
            position.undo(mv, undo);
        }
    }
}

#[test]
fn undoing_a_game_restores_the_opening_fen() {
    let mut position = Position::default();
    let opening_fen = position.to_fen();
    let opening_hash = position.zobrist();

    for coords in ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1", "f6e4"] {
        play(&mut position, coords);
    }

    while position.last_move().is_some() {
        position.undo_last().unwrap();
    }

    assert_eq!(position.to_fen(), opening_fen);
    assert_eq!(position.zobrist(), opening_hash);
    position.assert_consistent(None);
}

#[test]
fn known_perft_counts() {
    // Leaf counts for the standard opening and for "kiwipete", the classic
    // castling/en-passant torture position.
    let mut start = Position::default();
    assert_eq!(start.perft(1), 20);
    assert_eq!(start.perft(2), 400);
    assert_eq!(start.perft(3), 8_902);
    assert_eq!(start.perft(4), 197_281);

    let mut kiwipete =
        pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
    assert_eq!(kiwipete.perft(1), 48);
    assert_eq!(kiwipete.perft(2), 2_039);
}
