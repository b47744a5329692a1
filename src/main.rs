/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use newt::Engine;

/// A time-boxed alpha-beta chess engine.
#[derive(Debug, Parser)]
#[command(about, version)]
struct Args {
    /// Starting position as a FEN string (defaults to the standard opening
    /// array).
    #[arg(long)]
    fen: Option<String>,

    /// Seconds the engine may spend choosing a move.
    #[arg(long, default_value_t = 5.0)]
    movetime: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut engine = Engine::new();
    if let Some(fen) = args.fen.as_deref() {
        engine.set_position(fen)?;
    }
    engine.set_time_cap(Duration::from_secs_f64(args.movetime));

    engine.run()
}
