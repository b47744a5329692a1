/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// The board: pieces, squares, moves, legality, and the reversible
/// make/unmake protocol.
mod board;

/// The interactive command surface.
mod cli;

/// Code related to the engine's functionality, such as user input handling.
mod engine;

/// Evaluation of chess positions.
mod eval;

/// Move ordering for faster alpha-beta cutoffs.
mod movepicker;

/// Evaluation scores and their arithmetic.
mod score;

/// Main engine logic; all search related code.
mod search;

/// The transposition table.
mod ttable;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use eval::*;
pub use movepicker::*;
pub use score::*;
pub use search::*;
pub use ttable::*;
