/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! The boundary between positions and text.
//!
//! A [`Setup`] is the structured description of a position: every occupied
//! square with its piece, plus the side to move, castling rights, en passant
//! target, and the clocks. It carries the same information as a FEN string,
//! and this module is the only place FEN text is parsed or produced; the rest
//! of the engine works with [`Setup`] values.

use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Result};

use super::{PieceKind, Side, Square, BOARD_SIZE};

/// FEN string of the standard starting position.
pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// One occupied square.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Placement {
    pub kind: PieceKind,
    pub side: Side,
    pub square: Square,
}

/// Which of the four castling moves are still available.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    /// Whether `side` may still castle toward the given wing.
    pub fn allows(&self, side: Side, king_side: bool) -> bool {
        match (side, king_side) {
            (Side::White, true) => self.white_king_side,
            (Side::White, false) => self.white_queen_side,
            (Side::Black, true) => self.black_king_side,
            (Side::Black, false) => self.black_queen_side,
        }
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut any = false;
        for (available, letter) in [
            (self.white_king_side, 'K'),
            (self.white_queen_side, 'Q'),
            (self.black_king_side, 'k'),
            (self.black_queen_side, 'q'),
        ] {
            if available {
                write!(f, "{letter}")?;
                any = true;
            }
        }
        if !any {
            write!(f, "-")?;
        }
        Ok(())
    }
}

/// A structured description of a chess position.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Setup {
    pub placements: Vec<Placement>,
    pub side_to_move: Side,
    pub castling: CastlingRights,
    /// The square a pawn just skipped with a double step, if any.
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl Setup {
    /// The standard starting array.
    pub fn standard() -> Self {
        STARTPOS_FEN
            .parse()
            .expect("the startpos FEN is well-formed")
    }
}

impl FromStr for Setup {
    type Err = anyhow::Error;

    fn from_str(fen: &str) -> Result<Self> {
        let mut fields = fen.split_ascii_whitespace();
        let board = fields.next().context("FEN is empty")?;
        let side = fields.next().context("FEN is missing the side to move")?;
        let castling = fields.next().context("FEN is missing castling rights")?;
        let en_passant = fields
            .next()
            .context("FEN is missing the en passant target")?;
        let halfmove = fields.next().context("FEN is missing the halfmove clock")?;
        let fullmove = fields
            .next()
            .context("FEN is missing the fullmove number")?;
        if fields.next().is_some() {
            bail!("FEN has trailing fields");
        }

        let rows: Vec<&str> = board.split('/').collect();
        if rows.len() != BOARD_SIZE as usize {
            bail!("FEN board must have 8 rows, found {}", rows.len());
        }

        let mut placements = Vec::new();
        for (row, row_str) in rows.iter().enumerate() {
            let mut col = 0u8;
            for letter in row_str.chars() {
                if let Some(blanks) = letter.to_digit(10) {
                    col += blanks as u8;
                    continue;
                }
                if col >= BOARD_SIZE {
                    bail!("FEN row {row_str:?} is too wide");
                }
                let side = if letter.is_ascii_uppercase() {
                    Side::White
                } else {
                    Side::Black
                };
                placements.push(Placement {
                    kind: PieceKind::from_letter(letter)?,
                    side,
                    square: Square::new(row as u8, col),
                });
                col += 1;
            }
            if col != BOARD_SIZE {
                bail!("FEN row {row_str:?} does not cover 8 files");
            }
        }

        let side_to_move = match side {
            "w" => Side::White,
            "b" => Side::Black,
            _ => bail!("invalid side to move {side:?}"),
        };

        let castling = if castling == "-" {
            CastlingRights::default()
        } else {
            let mut rights = CastlingRights::default();
            for letter in castling.chars() {
                match letter {
                    'K' => rights.white_king_side = true,
                    'Q' => rights.white_queen_side = true,
                    'k' => rights.black_king_side = true,
                    'q' => rights.black_queen_side = true,
                    _ => bail!("invalid castling rights {castling:?}"),
                }
            }
            rights
        };

        let en_passant = match en_passant {
            "-" => None,
            square => Some(square.parse()?),
        };

        Ok(Self {
            placements,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock: halfmove
                .parse()
                .with_context(|| format!("invalid halfmove clock {halfmove:?}"))?,
            fullmove_number: fullmove
                .parse()
                .with_context(|| format!("invalid fullmove number {fullmove:?}"))?,
        })
    }
}

impl fmt::Display for Setup {
    /// Serializes this setup as a FEN string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grid = [[None::<&Placement>; BOARD_SIZE as usize]; BOARD_SIZE as usize];
        for placement in &self.placements {
            grid[placement.square.row as usize][placement.square.col as usize] = Some(placement);
        }

        for (row, cells) in grid.iter().enumerate() {
            let mut blanks = 0;
            for cell in cells {
                match cell {
                    None => blanks += 1,
                    Some(placement) => {
                        if blanks > 0 {
                            write!(f, "{blanks}")?;
                            blanks = 0;
                        }
                        let letter = match placement.side {
                            Side::White => placement.kind.letter(),
                            Side::Black => placement.kind.letter().to_ascii_lowercase(),
                        };
                        write!(f, "{letter}")?;
                    }
                }
            }
            if blanks > 0 {
                write!(f, "{blanks}")?;
            }
            if row + 1 < BOARD_SIZE as usize {
                write!(f, "/")?;
            }
        }

        let side = match self.side_to_move {
            Side::White => 'w',
            Side::Black => 'b',
        };
        write!(f, " {side} {} ", self.castling)?;
        match self.en_passant {
            Some(square) => write!(f, "{square}")?,
            None => write!(f, "-")?,
        }
        write!(f, " {} {}", self.halfmove_clock, self.fullmove_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    #[test]
    fn test_fen_round_trip() {
        let fens = [
            STARTPOS_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2",
            "8/P7/8/8/8/8/7k/K7 w - - 12 60",
        ];
        for fen in fens {
            let setup: Setup = fen.parse().unwrap();
            assert_eq!(setup.to_string(), fen);
        }
    }

    #[test]
    fn test_position_setup_round_trip() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let setup: Setup = fen.parse().unwrap();
        let position = Position::from_setup(&setup).unwrap();
        assert_eq!(position.setup(), setup);
        assert_eq!(position.to_fen(), fen);
    }

    #[test]
    fn test_position_round_trip_with_en_passant_target() {
        // The en passant target is realized by replaying the double step, and
        // must serialize back out unchanged.
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        let position: Position = fen.parse().unwrap();
        assert_eq!(position.to_fen(), fen);
    }

    #[test]
    fn test_rejects_malformed_fens() {
        for fen in [
            "",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR",         // missing fields
            "rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", // 7 rows
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", // bad width
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1", // bad side
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1", // bad castling
        ] {
            assert!(fen.parse::<Setup>().is_err(), "accepted {fen:?}");
        }
    }

    #[test]
    fn test_setup_validation_in_position() {
        // No kings.
        assert!("8/8/8/8/8/8/8/8 w - - 0 1".parse::<Position>().is_err());
        // Two white kings.
        assert!("8/8/8/8/8/8/8/KK5k w - - 0 1".parse::<Position>().is_err());
        // Castling rights without a rook in the corner.
        assert!("4k3/8/8/8/8/8/8/4K3 w K - 0 1".parse::<Position>().is_err());
    }
}
