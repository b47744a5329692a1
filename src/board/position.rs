/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

use super::{
    movegen, CastlingKey, Move, MoveKind, MoveList, Piece, PieceId, PieceKind, Setup, Side,
    Square, ZobristTracker, BOARD_SIZE,
};

/// Halfmoves without a pawn move or capture before the game is drawn
/// (the fifty-move rule: 50 full moves = 100 halfmoves).
pub const HALFMOVE_DRAW_CAP: u32 = 100;

const SIZE: usize = BOARD_SIZE as usize;

/// Why a drawn game is drawn.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DrawReason {
    FiftyMoves,
    InsufficientMaterial,
}

/// The state of a game: still going, or over and why.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Ongoing,
    Checkmate { winner: Side },
    Stalemate,
    Draw(DrawReason),
}

impl Status {
    /// Whether the game has ended.
    #[inline(always)]
    pub fn is_over(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

/// A full chess position.
///
/// The grid holds piece *handles*; the pieces themselves live in fixed-slot
/// per-side arrays. Captured pieces keep their slot with the `taken` flag set,
/// so a [`PieceId`] stays valid across make/unmake, and cloning the position
/// yields a fully independent deep copy (nothing is shared by reference).
///
/// Mutation goes exclusively through the reversible [`Position::make`] /
/// [`Position::undo`] pair, or through the validated [`Position::play`] /
/// [`Position::undo_last`] pair at the game boundary.
#[derive(Clone, PartialEq, Debug)]
pub struct Position {
    grid: [[Option<PieceId>; SIZE]; SIZE],
    pieces: [Vec<Piece>; Side::COUNT],
    /// Live (non-captured) piece counts per side.
    live: [u8; Side::COUNT],
    kings: [PieceId; Side::COUNT],
    side_to_move: Side,
    halfmove_clock: u32,
    fullmove_number: u32,
    /// Most recent move last. Each entry carries the undo record needed to
    /// reverse it, so only the top of the stack can ever be undone.
    history: Vec<(Move, super::Undo)>,
    zobrist: ZobristTracker,
    status: Status,
}

impl Position {
    /// Constructs a position from a structured placement.
    ///
    /// Fails if the placement is not a plausible chess position: a side with
    /// no king (or more than one), two pieces sharing a square, castling
    /// rights claimed without the king and rook standing unmoved on their
    /// home squares, or an en passant target with no matching pawn.
    pub fn from_setup(setup: &Setup) -> Result<Self> {
        let mut grid: [[Option<PieceId>; SIZE]; SIZE] = Default::default();
        let mut pieces: [Vec<Piece>; Side::COUNT] = [Vec::new(), Vec::new()];
        let mut kings: [Option<PieceId>; Side::COUNT] = [None, None];
        let mut live = [0u8; Side::COUNT];
        let mut zobrist = ZobristTracker::new();

        for placement in &setup.placements {
            let (kind, side, square) = (placement.kind, placement.side, placement.square);
            let id = PieceId::new(side, pieces[side.index()].len() as u8);

            let cell = &mut grid[square.row as usize][square.col as usize];
            if cell.is_some() {
                bail!("two pieces placed on {square}");
            }
            *cell = Some(id);

            // A piece still counts as unmoved if it stands where the opening
            // array would have it; castling rights below refine this for
            // rooks and kings.
            let unmoved = match kind {
                PieceKind::Pawn => match side {
                    Side::White => square.row == 6,
                    Side::Black => square.row == 1,
                },
                PieceKind::King => {
                    square.col == 4
                        && match side {
                            Side::White => square.row == 7,
                            Side::Black => square.row == 0,
                        }
                }
                _ => true,
            };

            if kind == PieceKind::King {
                if kings[side.index()].is_some() {
                    bail!("{side} has more than one king");
                }
                kings[side.index()] = Some(id);
            }

            pieces[side.index()].push(Piece::new(kind, side, square, unmoved));
            live[side.index()] += 1;
            zobrist.toggle(square, kind, side);
        }

        let [Some(white_king), Some(black_king)] = kings else {
            bail!("both sides must have exactly one king");
        };

        if setup.side_to_move == Side::Black {
            zobrist.toggle_turn();
        }

        let mut position = Self {
            grid,
            pieces,
            live,
            kings: [white_king, black_king],
            side_to_move: setup.side_to_move,
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::new(),
            zobrist,
            status: Status::Ongoing,
        };

        position.apply_castling_rights(setup)?;

        if let Some(target) = setup.en_passant {
            position.replay_double_step(target)?;
        }

        position.halfmove_clock = setup.halfmove_clock;
        position.fullmove_number = setup.fullmove_number;
        position.update_status();
        Ok(position)
    }

    /// Reconciles the rook/king `unmoved` flags with the claimed castling
    /// rights: a claimed right demands an unmoved king and corner rook, and
    /// an absent right marks the corner rook as having moved.
    fn apply_castling_rights(&mut self, setup: &Setup) -> Result<()> {
        let corners = [
            (Side::White, true, Square::new(7, 7)),
            (Side::White, false, Square::new(7, 0)),
            (Side::Black, true, Square::new(0, 7)),
            (Side::Black, false, Square::new(0, 0)),
        ];

        for (side, king_side, corner) in corners {
            let claimed = setup.castling.allows(side, king_side);
            let rook = self.id_at(corner).filter(|&id| {
                let piece = self.piece(id);
                piece.kind == PieceKind::Rook && piece.side == side
            });

            if claimed {
                let king_ready = self.piece(self.king(side)).unmoved;
                if !king_ready || rook.map_or(true, |id| !self.piece(id).unmoved) {
                    bail!(
                        "castling rights claimed for {side} but king/rook are not in place"
                    );
                }
            } else if let Some(id) = rook {
                self.piece_mut(id).unmoved = false;
            }
        }
        Ok(())
    }

    /// Realizes an en passant target square by rewinding the pawn that must
    /// have just double-stepped past it and replaying that move, so the move
    /// history witnesses the double step.
    fn replay_double_step(&mut self, target: Square) -> Result<()> {
        let (to_row, from_row) = match target.row {
            2 => (3u8, 1u8), // Black just pushed a pawn to row 3
            5 => (4, 6),     // White just pushed a pawn to row 4
            _ => bail!("invalid en passant target {target}"),
        };
        let to = Square::new(to_row, target.col);
        let from = Square::new(from_row, target.col);

        let mover = self.side_to_move.opponent();
        let Some(pawn) = self.id_at(to).filter(|&id| {
            let piece = self.piece(id);
            piece.kind == PieceKind::Pawn && piece.side == mover
        }) else {
            bail!("en passant target {target} has no matching pawn on {to}");
        };
        if self.piece_at(from).is_some() {
            bail!("en passant target {target} is blocked at {from}");
        }

        // Rewind the pawn, then make the double step for real.
        self.shift(pawn, to, from);
        self.piece_mut(pawn).unmoved = true;
        self.side_to_move = mover;
        self.zobrist.toggle_turn();

        let mv = Move::standard(self, pawn, to);
        self.make(mv);
        Ok(())
    }

    /// The position as a structured placement, suitable for display,
    /// round-trip validation, or reconstructing the position elsewhere.
    pub fn setup(&self) -> Setup {
        let mut placements = Vec::with_capacity(self.live.iter().map(|&n| n as usize).sum());
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let square = Square::new(row, col);
                if let Some(piece) = self.piece_at(square) {
                    placements.push(super::Placement {
                        kind: piece.kind,
                        side: piece.side,
                        square,
                    });
                }
            }
        }

        Setup {
            placements,
            side_to_move: self.side_to_move,
            castling: super::CastlingRights {
                white_king_side: self.castling_right(Side::White, true),
                white_queen_side: self.castling_right(Side::White, false),
                black_king_side: self.castling_right(Side::Black, true),
                black_queen_side: self.castling_right(Side::Black, false),
            },
            en_passant: self.en_passant_target(),
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        }
    }

    /// The position's FEN string.
    pub fn to_fen(&self) -> String {
        self.setup().to_string()
    }

    #[inline(always)]
    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.side.index()][id.index as usize]
    }

    #[inline(always)]
    fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id.side.index()][id.index as usize]
    }

    /// The handle of the piece standing on `square`, if any.
    #[inline(always)]
    pub fn id_at(&self, square: Square) -> Option<PieceId> {
        self.grid[square.row as usize][square.col as usize]
    }

    /// The piece standing on `square`, if any.
    #[inline(always)]
    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.id_at(square).map(|id| self.piece(id))
    }

    /// The king of `side`.
    #[inline(always)]
    pub fn king(&self, side: Side) -> PieceId {
        self.kings[side.index()]
    }

    /// All piece handles belonging to `side`, live or taken.
    pub fn ids(&self, side: Side) -> impl Iterator<Item = PieceId> + '_ {
        (0..self.pieces[side.index()].len()).map(move |index| PieceId::new(side, index as u8))
    }

    /// All live pieces belonging to `side`.
    pub fn live_pieces(&self, side: Side) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces[side.index()].iter().filter(|piece| !piece.taken)
    }

    /// Number of live pieces for `side`.
    #[inline(always)]
    pub fn live_count(&self, side: Side) -> u8 {
        self.live[side.index()]
    }

    #[inline(always)]
    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    #[inline(always)]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline(always)]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline(always)]
    pub fn status(&self) -> Status {
        self.status
    }

    /// The most recently made move, if any.
    #[inline(always)]
    pub fn last_move(&self) -> Option<&Move> {
        self.history.last().map(|(mv, _)| mv)
    }

    /// Number of halfmoves made so far.
    #[inline(always)]
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    /// Whether the piece on `square` (if any) belongs to the side to move.
    pub fn is_friendly(&self, square: Square) -> bool {
        self.piece_at(square)
            .is_some_and(|piece| piece.side == self.side_to_move)
    }

    /// Whether `side`'s king is currently attacked.
    pub fn is_in_check(&self, side: Side) -> bool {
        self.ids(side.opponent())
            .any(|id| !self.piece(id).taken && movegen::is_checking(self, id))
    }

    /// Whether making `mv` would leave `side`'s king attacked.
    ///
    /// Simulates the move, tests for check, and unmakes it.
    pub fn would_be_in_check(&mut self, mv: Move, side: Side) -> bool {
        let undo = self.make(mv);
        let result = self.is_in_check(side);
        self.undo(mv, undo);
        result
    }

    /// Every legal move for the side to move.
    pub fn legal_moves(&mut self) -> MoveList {
        let mut moves = MoveList::new();
        for id in self.ids(self.side_to_move).collect::<Vec<_>>() {
            if !self.piece(id).taken {
                moves.extend(movegen::valid_moves(self, id));
            }
        }
        moves
    }

    /// Every legal move for the piece on `square`, or an empty list if the
    /// square is empty.
    pub fn legal_moves_from(&mut self, square: Square) -> MoveList {
        match self.id_at(square) {
            Some(id) => movegen::valid_moves(self, id),
            None => MoveList::new(),
        }
    }

    /// Legal captures and promotions only. Quiescence search expands these.
    pub fn interesting_moves(&mut self) -> MoveList {
        self.legal_moves()
            .into_iter()
            .filter(Move::is_interesting)
            .collect()
    }

    /// Whether the side to move has no legal move at all.
    ///
    /// Short-circuits piece by piece without allocating full move lists.
    pub fn no_valid_move_exists(&mut self) -> bool {
        for id in self.ids(self.side_to_move).collect::<Vec<_>>() {
            if !self.piece(id).taken && movegen::valid_move_exists(self, id) {
                return false;
            }
        }
        true
    }

    /// Applies `mv` to the position, returning the record needed to [`undo`]
    /// it. The caller is responsible for only making legal moves; use
    /// [`Position::play`] at the game boundary.
    ///
    /// [`undo`]: Position::undo
    pub fn make(&mut self, mv: Move) -> super::Undo {
        let undo = super::Undo {
            mover_was_unmoved: self.piece(mv.piece).unmoved,
            halfmove_clock: self.halfmove_clock,
            king_had_castled: self.piece(mv.piece).has_castled,
        };

        // Bundled partial moves first: they touch grid and hash only, never
        // history, clocks, or the turn.
        match mv.kind {
            MoveKind::Castle {
                rook,
                rook_from,
                rook_to,
            } => {
                self.piece_mut(mv.piece).has_castled = true;
                self.shift(rook, rook_from, rook_to);
                self.piece_mut(rook).unmoved = false;
            }
            MoveKind::EnPassant { victim_from } => {
                let victim = mv.captured.expect("en passant always captures");
                self.shift(victim, victim_from, mv.to);
            }
            _ => {}
        }

        debug_assert_eq!(self.piece(mv.piece).square, mv.from);

        if let Some(victim) = mv.captured {
            let kind = self.piece(victim).kind;
            self.piece_mut(victim).taken = true;
            self.live[victim.side.index()] -= 1;
            self.zobrist.toggle(mv.to, kind, victim.side);
        }

        let mover_kind = self.piece(mv.piece).kind;
        {
            let piece = self.piece_mut(mv.piece);
            piece.unmoved = false;
            piece.square = mv.to;
        }
        self.set_grid(mv.from, None);
        self.set_grid(mv.to, Some(mv.piece));
        self.zobrist.toggle(mv.from, mover_kind, mv.piece.side);
        self.zobrist.toggle(mv.to, mover_kind, mv.piece.side);
        self.zobrist.toggle_turn();

        if let MoveKind::Promotion { promote_to } = mv.kind {
            // The pawn's slot now holds the promoted piece.
            self.zobrist.toggle(mv.to, PieceKind::Pawn, mv.piece.side);
            self.zobrist.toggle(mv.to, promote_to, mv.piece.side);
            self.piece_mut(mv.piece).kind = promote_to;
        }

        if mv.piece.side == Side::Black {
            self.fullmove_number += 1;
        }
        if mover_kind == PieceKind::Pawn || mv.captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        self.history.push((mv, undo));
        self.side_to_move = self.side_to_move.opponent();

        // The bundled rook shift makes castling the easiest move to corrupt.
        if cfg!(debug_assertions) && matches!(mv.kind, MoveKind::Castle { .. }) {
            self.assert_consistent(Some(&mv));
        }

        undo
    }

    /// Reverses `mv`, which must be the most recently made move, restoring
    /// the position to a state indistinguishable from before [`Position::make`].
    pub fn undo(&mut self, mv: Move, undo: super::Undo) {
        match self.history.pop() {
            Some((top, _)) if top == mv => {}
            top => self.fail_consistency(
                Some(&mv),
                &format!("undo of a move that is not the most recent ({top:?})"),
            ),
        }

        if let MoveKind::Promotion { promote_to } = mv.kind {
            self.zobrist.toggle(mv.to, promote_to, mv.piece.side);
            self.zobrist.toggle(mv.to, PieceKind::Pawn, mv.piece.side);
            self.piece_mut(mv.piece).kind = PieceKind::Pawn;
        }

        debug_assert_eq!(self.piece(mv.piece).square, mv.to);

        let mover_kind = self.piece(mv.piece).kind;
        self.zobrist.toggle(mv.from, mover_kind, mv.piece.side);
        self.zobrist.toggle(mv.to, mover_kind, mv.piece.side);
        self.zobrist.toggle_turn();

        if let Some(victim) = mv.captured {
            let kind = self.piece(victim).kind;
            self.piece_mut(victim).taken = false;
            self.live[victim.side.index()] += 1;
            self.zobrist.toggle(mv.to, kind, victim.side);
        }

        self.set_grid(mv.to, mv.captured);
        self.set_grid(mv.from, Some(mv.piece));
        {
            let piece = self.piece_mut(mv.piece);
            piece.square = mv.from;
            piece.unmoved = undo.mover_was_unmoved;
        }

        if mv.piece.side == Side::Black {
            self.fullmove_number -= 1;
        }
        self.halfmove_clock = undo.halfmove_clock;
        self.side_to_move = self.side_to_move.opponent();

        match mv.kind {
            MoveKind::Castle {
                rook,
                rook_from,
                rook_to,
            } => {
                self.shift(rook, rook_to, rook_from);
                // Castling demanded an unmoved rook, so its prior state is known.
                self.piece_mut(rook).unmoved = true;
                self.piece_mut(mv.piece).has_castled = undo.king_had_castled;
            }
            MoveKind::EnPassant { victim_from } => {
                let victim = mv.captured.expect("en passant always captures");
                self.shift(victim, mv.to, victim_from);
            }
            _ => {}
        }

        if cfg!(debug_assertions) && matches!(mv.kind, MoveKind::Castle { .. }) {
            self.assert_consistent(Some(&mv));
        }
    }

    /// Relocates a piece on the grid, updating only grid and hash.
    ///
    /// This is the "partial move" used by castling (the rook) and en passant
    /// (the victim pawn): it is applied and reverted atomically with its
    /// parent move and deliberately skips history/clock/turn bookkeeping.
    fn shift(&mut self, id: PieceId, from: Square, to: Square) {
        let kind = self.piece(id).kind;
        self.set_grid(from, None);
        self.set_grid(to, Some(id));
        self.piece_mut(id).square = to;
        self.zobrist.toggle(from, kind, id.side);
        self.zobrist.toggle(to, kind, id.side);
    }

    #[inline(always)]
    fn set_grid(&mut self, square: Square, id: Option<PieceId>) {
        self.grid[square.row as usize][square.col as usize] = id;
    }

    /// Applies a move chosen by the player or the engine.
    ///
    /// Rejects anything not in the current legal move set, then finalizes the
    /// move and refreshes the end-of-game status.
    pub fn play(&mut self, mv: Move) -> Result<()> {
        if !self.legal_moves().contains(&mv) {
            bail!("{mv} is not a legal move in this position");
        }
        self.make(mv);
        self.update_status();
        Ok(())
    }

    /// Undoes the most recently played move.
    ///
    /// Calling this with an empty history means the caller has lost track of
    /// the game state, and is reported as an error rather than ignored.
    pub fn undo_last(&mut self) -> Result<Move> {
        let Some(&(mv, undo)) = self.history.last() else {
            bail!("no move to undo");
        };
        self.undo(mv, undo);
        self.update_status();
        Ok(mv)
    }

    /// Re-evaluates the end-of-game conditions.
    ///
    /// Run once per finalized move; search deliberately skips this and uses
    /// the lighter `no_valid_move_exists` + check test.
    pub fn update_status(&mut self) {
        self.status = if self.no_valid_move_exists() {
            if self.is_in_check(self.side_to_move) {
                Status::Checkmate {
                    winner: self.side_to_move.opponent(),
                }
            } else {
                Status::Stalemate
            }
        } else if self.halfmove_clock >= HALFMOVE_DRAW_CAP {
            Status::Draw(DrawReason::FiftyMoves)
        } else if self.insufficient_material() {
            Status::Draw(DrawReason::InsufficientMaterial)
        } else {
            Status::Ongoing
        };
    }

    /// Bare kings, or one side down to king plus a single minor piece while
    /// neither side retains a queen, rook, or pawn.
    fn insufficient_material(&self) -> bool {
        let total = self.live[0] + self.live[1];
        if total == 2 {
            return true;
        }
        if self.live[0] != 2 && self.live[1] != 2 {
            return false;
        }
        for side in [Side::White, Side::Black] {
            for piece in self.live_pieces(side) {
                if matches!(
                    piece.kind,
                    PieceKind::Queen | PieceKind::Rook | PieceKind::Pawn
                ) {
                    return false;
                }
            }
        }
        true
    }

    /// A human-readable report of how the game ended, if it has.
    pub fn end_of_game_message(&self) -> Option<String> {
        match self.status {
            Status::Ongoing => None,
            Status::Checkmate { winner } => Some(format!(
                "Checkmate! Victory to {winner} in {} moves.",
                self.fullmove_number
            )),
            Status::Stalemate => Some(format!(
                "Stalemate in {} moves.",
                self.fullmove_number
            )),
            Status::Draw(DrawReason::FiftyMoves) => {
                Some("Draw by the fifty-move rule.".to_string())
            }
            Status::Draw(DrawReason::InsufficientMaterial) => {
                Some("Draw by insufficient material.".to_string())
            }
        }
    }

    /// The square a pawn skipped with a just-made double step, if any:
    /// the en passant target square.
    pub fn en_passant_target(&self) -> Option<Square> {
        let mv = self.last_move()?;
        let piece = self.piece(mv.piece);
        (piece.kind == PieceKind::Pawn && mv.row_diff() == 2)
            .then(|| Square::new((mv.to.row + mv.from.row) / 2, mv.from.col))
    }

    fn castling_right(&self, side: Side, king_side: bool) -> bool {
        if !self.piece(self.king(side)).unmoved {
            return false;
        }
        let row = match side {
            Side::White => 7,
            Side::Black => 0,
        };
        let corner = Square::new(row, if king_side { 7 } else { 0 });
        self.piece_at(corner).is_some_and(|piece| {
            piece.kind == PieceKind::Rook && piece.side == side && piece.unmoved
        })
    }

    /// The position's full Zobrist hash.
    ///
    /// The incremental accumulator covers piece placement and the turn; the
    /// en passant and castling-rights contributions can change without any
    /// piece crossing the affected squares, so they are recomputed from the
    /// current state on every call.
    pub fn zobrist(&self) -> u64 {
        let mut hash = self.zobrist.accumulated();
        if let Some(target) = self.en_passant_target() {
            hash ^= ZobristTracker::en_passant_key(target.col);
        }
        let rights = [
            (Side::White, true, CastlingKey::WhiteKingSide),
            (Side::White, false, CastlingKey::WhiteQueenSide),
            (Side::Black, true, CastlingKey::BlackKingSide),
            (Side::Black, false, CastlingKey::BlackQueenSide),
        ];
        for (side, king_side, key) in rights {
            if self.castling_right(side, king_side) {
                hash ^= ZobristTracker::castling_key(key);
            }
        }
        hash
    }

    /// Rebuilds the incremental accumulator from nothing but the current
    /// placement and turn. Used to validate the incremental bookkeeping.
    #[cfg(test)]
    pub(crate) fn recomputed_accumulator(&self) -> u64 {
        let mut tracker = ZobristTracker::new();
        for side in [Side::White, Side::Black] {
            for piece in self.live_pieces(side) {
                tracker.toggle(piece.square, piece.kind, side);
            }
        }
        if self.side_to_move == Side::Black {
            tracker.toggle_turn();
        }
        tracker.accumulated()
    }

    /// Counts leaf nodes of the legal move tree to the given depth.
    ///
    /// A movegen validation tool: the counts for standard positions are
    /// well known.
    pub fn perft(&mut self, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = self.legal_moves();
        if depth == 1 {
            return moves.len() as u64;
        }
        let mut total = 0;
        for mv in moves {
            let undo = self.make(mv);
            total += self.perft(depth - 1);
            self.undo(mv, undo);
        }
        total
    }

    /// Verifies that the grid and the piece arrays agree; on any mismatch,
    /// dumps the full position state and aborts.
    ///
    /// A failure here means the make/unmake bookkeeping is corrupted, and any
    /// further move generation over this position would be meaningless.
    pub fn assert_consistent(&self, context: Option<&Move>) {
        let mut counted = [0u8; Side::COUNT];
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let square = Square::new(row, col);
                let Some(id) = self.id_at(square) else {
                    continue;
                };
                let piece = self.piece(id);
                if piece.taken {
                    self.fail_consistency(context, &format!("taken {piece} on grid at {square}"));
                }
                if piece.square != square {
                    self.fail_consistency(
                        context,
                        &format!("{piece} thinks it is on {}, grid has it at {square}", piece.square),
                    );
                }
                counted[id.side.index()] += 1;
            }
        }

        for side in [Side::White, Side::Black] {
            if counted[side.index()] != self.live[side.index()] {
                self.fail_consistency(
                    context,
                    &format!(
                        "{side} has {} pieces on the grid but a live count of {}",
                        counted[side.index()],
                        self.live[side.index()]
                    ),
                );
            }
            for id in self.ids(side) {
                let piece = self.piece(id);
                if !piece.taken && self.id_at(piece.square) != Some(id) {
                    self.fail_consistency(
                        context,
                        &format!("{piece} at {} is not on the grid there", piece.square),
                    );
                }
            }
        }
    }

    /// Dumps everything needed to diagnose a corrupted position, then panics.
    fn fail_consistency(&self, context: Option<&Move>, message: &str) -> ! {
        eprintln!("piece arrays do not match board: {message}");
        if let Some(mv) = context {
            eprintln!("while processing move: {mv} ({:?})", mv.kind);
        }
        eprintln!("{self}");
        for side in [Side::White, Side::Black] {
            eprintln!("{side} pieces:");
            for id in self.ids(side) {
                let piece = self.piece(id);
                eprintln!(
                    "  [{}] {piece} at {} unmoved={} taken={}",
                    id.index, piece.square, piece.unmoved, piece.taken
                );
            }
        }
        eprintln!("move history (most recent last):");
        for (mv, _) in &self.history {
            eprintln!("  {mv}");
        }
        panic!("position invariants violated: {message}");
    }
}

impl Default for Position {
    /// The standard starting position.
    fn default() -> Self {
        Self::from_setup(&Setup::standard()).expect("the standard setup is a valid position")
    }
}

impl std::str::FromStr for Position {
    type Err = anyhow::Error;

    /// Parses a FEN string, via the [`Setup`] adapter.
    fn from_str(s: &str) -> Result<Self> {
        Self::from_setup(&s.parse::<Setup>()?)
    }
}

impl fmt::Display for Position {
    /// An ASCII snapshot of the board, with the side to move and the FEN
    /// string below it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIZE {
            write!(f, "{} ", 8 - row)?;
            for col in 0..BOARD_SIZE {
                let letter = self
                    .piece_at(Square::new(row, col))
                    .map(Piece::letter)
                    .unwrap_or(' ');
                write!(f, "| {letter} ")?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "    a   b   c   d   e   f   g   h")?;
        writeln!(f, "{} to move", self.side_to_move)?;
        write!(f, "{}", self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn startpos() -> Position {
        Position::default()
    }

    #[test]
    fn test_standard_setup() {
        let pos = startpos();
        assert_eq!(pos.side_to_move(), Side::White);
        assert_eq!(pos.live_count(Side::White), 16);
        assert_eq!(pos.live_count(Side::Black), 16);
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);
        assert_eq!(pos.status(), Status::Ongoing);
        pos.assert_consistent(None);
    }

    #[test]
    fn test_make_undo_round_trip() {
        let mut pos = startpos();
        let before = pos.clone();
        let hash = pos.zobrist();

        for mv in pos.legal_moves() {
            let undo = pos.make(mv);
            assert_ne!(pos.zobrist(), hash, "{mv} should change the hash");
            pos.undo(mv, undo);
            assert_eq!(pos, before, "{mv} did not round-trip");
            assert_eq!(pos.zobrist(), hash);
        }
    }

    #[test]
    fn test_capture_round_trip() {
        // Scandinavian: White can capture the d5 pawn.
        let mut pos: Position =
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2"
                .parse()
                .unwrap();
        let before = pos.clone();

        let capture = Move::from_coords(&mut pos, "e4d5").unwrap();
        assert!(capture.captured.is_some());

        let undo = pos.make(capture);
        assert_eq!(pos.live_count(Side::Black), 15);
        pos.undo(capture, undo);
        assert_eq!(pos.live_count(Side::Black), 16);
        assert_eq!(pos, before);
    }

    #[test]
    fn test_castle_round_trip() {
        let mut pos: Position = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let before = pos.clone();

        let castle = Move::from_coords(&mut pos, "e1g1").unwrap();
        assert!(matches!(castle.kind, MoveKind::Castle { .. }));

        let undo = pos.make(castle);
        assert_eq!(
            pos.piece_at(Square::new(7, 5)).map(|p| p.kind),
            Some(PieceKind::Rook),
            "the rook should land on f1"
        );
        assert!(pos.piece(pos.king(Side::White)).has_castled);
        pos.undo(castle, undo);
        assert_eq!(pos, before);
    }

    #[test]
    fn test_en_passant_round_trip() {
        let mut pos: Position =
            "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 3"
                .parse()
                .unwrap();
        let before = pos.clone();

        let ep = Move::from_coords(&mut pos, "d4e3").unwrap();
        assert!(matches!(ep.kind, MoveKind::EnPassant { .. }));

        let undo = pos.make(ep);
        // The white pawn that double-stepped is gone; e4 and d4 are empty.
        assert!(pos.piece_at(Square::new(4, 4)).is_none());
        assert_eq!(pos.live_count(Side::White), 15);
        pos.undo(ep, undo);
        assert_eq!(pos, before);
    }

    #[test]
    fn test_promotion_round_trip_preserves_slot() {
        let mut pos: Position = "8/P7/8/8/8/8/7k/K7 w - - 0 1".parse().unwrap();
        let before = pos.clone();

        let promo = Move::from_coords(&mut pos, "a7a8q").unwrap();
        let slot = promo.piece;

        let undo = pos.make(promo);
        let promoted = pos.piece(slot);
        assert_eq!(promoted.kind, PieceKind::Queen);
        assert_eq!(promoted.square, Square::new(0, 0));
        pos.undo(promo, undo);
        assert_eq!(pos.piece(slot).kind, PieceKind::Pawn);
        assert_eq!(pos, before);
    }

    #[test]
    fn test_zobrist_incremental_matches_scratch() {
        let mut pos = startpos();
        let line = ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "g8f6", "e1g1"];
        for s in line {
            let mv = Move::from_coords(&mut pos, s).unwrap();
            pos.play(mv).unwrap();
            assert_eq!(
                pos.zobrist.accumulated(),
                pos.recomputed_accumulator(),
                "incremental hash diverged after {s}"
            );
        }
        while pos.ply() > 0 {
            pos.undo_last().unwrap();
            assert_eq!(pos.zobrist.accumulated(), pos.recomputed_accumulator());
        }
    }

    #[test]
    fn test_transposition_hashes_equal() {
        // Two move orders reaching the same position must hash identically.
        let mut a = startpos();
        for s in ["g1f3", "g8f6", "b1c3", "b8c6"] {
            let mv = Move::from_coords(&mut a, s).unwrap();
            a.play(mv).unwrap();
        }
        let mut b = startpos();
        for s in ["b1c3", "b8c6", "g1f3", "g8f6"] {
            let mv = Move::from_coords(&mut b, s).unwrap();
            b.play(mv).unwrap();
        }
        assert_eq!(a.zobrist(), b.zobrist());
    }

    #[test]
    fn test_undo_with_empty_history_is_an_error() {
        let mut pos = startpos();
        assert!(pos.undo_last().is_err());
    }

    #[test]
    fn test_play_rejects_illegal_moves() {
        let mut pos = startpos();
        // The king cannot move at all in the starting position.
        let illegal = Move::standard(&pos, pos.king(Side::White), Square::new(5, 4));
        assert!(pos.play(illegal).is_err());
    }

    #[test]
    fn test_fifty_move_rule() {
        let mut pos: Position = "8/8/8/3k4/8/3K4/4R3/8 w - - 99 80".parse().unwrap();
        assert_eq!(pos.status(), Status::Ongoing);
        let mv = Move::from_coords(&mut pos, "e2e1").unwrap();
        pos.play(mv).unwrap();
        assert_eq!(pos.status(), Status::Draw(DrawReason::FiftyMoves));
    }

    #[test]
    fn test_perft_from_start() {
        let mut pos = startpos();
        assert_eq!(pos.perft(1), 20);
        assert_eq!(pos.perft(2), 400);
        assert_eq!(pos.perft(3), 8_902);
    }
}
