/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use clap::Parser;

use crate::Square;

/// A command to be sent to the engine.
#[derive(Debug, Clone, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<ENGINE COMMAND>")
)]
pub enum EngineCommand {
    /// Print a visual representation of the current board state.
    #[command(alias = "d")]
    Display,

    /// Print an evaluation of the current position.
    Eval,

    /// Quit the engine.
    #[command(aliases = ["quit", "q"])]
    Exit,

    /// Generate and print a FEN string for the current position.
    Fen,

    /// Ask the engine to choose and play a move for the side to move.
    #[command(alias = "g")]
    Go,

    /// Show all legal moves in the current position, or for the piece on a
    /// specific square.
    Moves { square: Option<Square> },

    /// Start a new game from the standard starting position.
    New,

    /// Performs a perft on the current position at the supplied depth,
    /// printing total node count.
    Perft { depth: usize },

    /// Apply the provided move to the game, given in coordinate notation
    /// (e.g. `e2e4`, or `e7e8q` to choose a promotion).
    #[command(alias = "move")]
    Play { mv: String },

    /// Set the position from a FEN string.
    Position { fen: Vec<String> },

    /// Report whether the game is still going, and the outcome if not.
    Status,

    /// Undo the most recently played move.
    Undo,
}

impl FromStr for EngineCommand {
    type Err = clap::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse_from(s.split_ascii_whitespace())
    }
}
