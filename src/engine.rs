/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    io,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};

use crate::{evaluate, EngineCommand, Move, Position, Search, SearchConfig, SearchResult, Square};

/// The interactive engine: the authoritative game state plus the command
/// loop that drives it.
///
/// This is the presentation boundary. Text goes in (commands, FEN strings,
/// coordinate moves) and text comes out (board snapshots, move lists, search
/// reports); everything in between is structured.
#[derive(Debug)]
pub struct Engine {
    /// The current state of the game, as known to the engine.
    ///
    /// Searches never mutate this; they work on their own clone, and only
    /// the chosen move comes back to be applied here.
    position: Position,

    /// Parameters used when the engine is asked to choose a move.
    config: SearchConfig,
}

impl Engine {
    /// Constructs a new [`Engine`] at the standard starting position.
    pub fn new() -> Self {
        Self {
            position: Position::default(),
            config: SearchConfig::default(),
        }
    }

    /// Replaces the game state with the position described by `fen`.
    pub fn set_position(&mut self, fen: &str) -> Result<()> {
        self.position = fen.parse()?;
        Ok(())
    }

    /// Overrides the wall-clock budget used for computed moves.
    pub fn set_time_cap(&mut self, time_cap: Duration) {
        self.config.time_cap = time_cap;
    }

    /// Executes the main event loop, reading commands from stdin until told
    /// to exit.
    pub fn run(&mut self) -> Result<()> {
        let mut buffer = String::with_capacity(128);

        loop {
            buffer.clear();
            let bytes = io::stdin()
                .read_line(&mut buffer)
                .context("failed to read a command line")?;

            // Ctrl+D
            if bytes == 0 {
                return Ok(());
            }

            let input = buffer.trim();
            if input.is_empty() {
                continue;
            }

            match input.parse::<EngineCommand>() {
                Ok(EngineCommand::Exit) => return Ok(()),
                // Command errors are reported but never fatal.
                Ok(command) => {
                    if let Err(e) = self.execute(command) {
                        eprintln!("error: {e}");
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
        }
    }

    /// Handles the execution of a single [`EngineCommand`].
    fn execute(&mut self, command: EngineCommand) -> Result<()> {
        match command {
            EngineCommand::Display => println!("{}", self.position),

            EngineCommand::Eval => println!("{}", evaluate(&mut self.position)),

            EngineCommand::Fen => println!("{}", self.position.to_fen()),

            EngineCommand::Go => self.go()?,

            EngineCommand::Moves { square } => self.moves(square),

            EngineCommand::New => self.position = Position::default(),

            EngineCommand::Perft { depth } => {
                let started = Instant::now();
                let nodes = self.position.perft(depth);
                let elapsed = started.elapsed();
                let nps = (nodes as f64 / elapsed.as_secs_f64()).trunc();
                println!("{nodes} nodes in {}ms ({nps} nps)", elapsed.as_millis());
            }

            EngineCommand::Play { mv } => {
                let mv = Move::from_coords(&mut self.position, &mv)?;
                self.position.play(mv)?;
                self.report_end_of_game();
            }

            EngineCommand::Position { fen } => self.set_position(&fen.join(" "))?,

            EngineCommand::Status => match self.position.end_of_game_message() {
                Some(message) => println!("{message}"),
                None => println!(
                    "Ongoing; {} to move (halfmove clock {}, move {})",
                    self.position.side_to_move(),
                    self.position.halfmove_clock(),
                    self.position.fullmove_number()
                ),
            },

            EngineCommand::Undo => {
                let mv = self.position.undo_last()?;
                println!("undid {mv}");
            }

            EngineCommand::Exit => unreachable!("exit is handled by the event loop"),
        }

        Ok(())
    }

    /// Computes and plays a move for the side to move.
    fn go(&mut self) -> Result<()> {
        if self.position.status().is_over() {
            self.report_end_of_game();
            return Ok(());
        }

        let Some(result) = Search::new(&self.position, self.config).choose_move()? else {
            self.report_end_of_game();
            return Ok(());
        };

        self.report_search(&result);
        self.position.play(result.mv)?;
        println!("{}", self.position);
        self.report_end_of_game();
        Ok(())
    }

    /// Prints the legal moves for the whole position or for one square.
    fn moves(&mut self, square: Option<Square>) {
        let moves = match square {
            Some(square) => self.position.legal_moves_from(square),
            None => self.position.legal_moves(),
        };

        let moves_string = if moves.is_empty() {
            String::from("(none)")
        } else {
            moves
                .into_iter()
                .map(|mv| mv.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("{moves_string}");
    }

    /// Prints what the search found: the move, the depth it completed, the
    /// node and transposition counters, and the anticipated continuation.
    fn report_search(&self, result: &SearchResult) {
        let stats = &result.stats;
        println!("Best move: {} ({})", result.mv, result.score);
        println!("Depth reached:   {}", stats.depth);
        println!("Nodes searched:  {}", stats.nodes);
        println!("Leaf nodes:      {}", stats.leaf_nodes);
        println!("Evaluations:     {}", stats.evaluations);
        println!("Transpositions:  {}", stats.transpositions);
        println!("Time:            {:.3}s", stats.elapsed.as_secs_f64());

        if !result.line.is_empty() {
            let line = result
                .line
                .iter()
                .map(|mv| mv.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            println!("Anticipated sequence: {line}");
        }
    }

    fn report_end_of_game(&self) {
        if let Some(message) = self.position.end_of_game_message() {
            println!("{message}");
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
