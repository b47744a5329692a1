/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, bail, Result};

use crate::{
    evaluate, Bound, Move, MovePicker, Position, Score, TableEntry, TranspositionTable,
};

/// Maximum depth that can be searched.
pub const MAX_DEPTH: usize = 255;

/// Depth at which iterative deepening starts.
///
/// Depth 1 is pointless: the heuristic fallback already is a depth-1 search
/// without the evaluation.
pub const MIN_DEPTH: usize = 2;

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Wall-clock budget for choosing a move.
    pub time_cap: Duration,

    /// Depth of the first iterative-deepening pass.
    pub min_depth: usize,

    /// Iterative deepening stops once this depth has been searched.
    pub max_depth: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_cap: Duration::from_secs(5),
            min_depth: MIN_DEPTH,
            max_depth: MAX_DEPTH,
        }
    }
}

/// Counters accumulated while searching one depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Depth of the completed pass that produced the result.
    pub depth: usize,

    /// Number of negamax calls.
    pub nodes: u64,

    /// Number of nodes at which the search bottomed out into quiescence.
    pub leaf_nodes: u64,

    /// Number of static evaluations performed.
    pub evaluations: u64,

    /// Number of usable transposition-table hits.
    pub transpositions: u64,

    /// Wall-clock time since the search began.
    pub elapsed: Duration,
}

/// The engine's chosen move, plus everything learned while choosing it.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The best move found.
    pub mv: Move,

    /// Evaluation of the position assuming `mv` is played.
    pub score: Score,

    /// The anticipated continuation after `mv`.
    pub line: Vec<Move>,

    /// Counters from the pass that produced this result.
    pub stats: SearchStats,
}

/// State owned by a single search invocation: the transposition table and
/// the counters. Nothing here is shared between searches, so concurrent
/// searches on different positions need no synchronization.
struct SearchContext {
    ttable: TranspositionTable,
    is_searching: Arc<AtomicBool>,
    nodes: u64,
    leaf_nodes: u64,
    evaluations: u64,
    transpositions: u64,
}

impl SearchContext {
    fn new(is_searching: Arc<AtomicBool>) -> Self {
        Self {
            ttable: TranspositionTable::new(),
            is_searching,
            nodes: 0,
            leaf_nodes: 0,
            evaluations: 0,
            transpositions: 0,
        }
    }

    #[inline(always)]
    fn keep_going(&self) -> bool {
        self.is_searching.load(Ordering::Relaxed)
    }
}

/// Chooses a move for the side to move, within a wall-clock budget.
///
/// The search runs on its own clone of the position, so the authoritative
/// game state is never touched by the worker thread.
pub struct Search {
    position: Position,
    config: SearchConfig,
}

impl Search {
    /// Constructs a search over a private clone of `position`.
    pub fn new(position: &Position, config: SearchConfig) -> Self {
        Self {
            position: position.clone(),
            config,
        }
    }

    /// Runs the time-boxed search and returns the best move found.
    ///
    /// Returns `Ok(None)` when the side to move has no legal move (the game
    /// is already over). Otherwise always produces a move: iterative
    /// deepening publishes the result of every *fully completed* depth, and
    /// if not even the shallowest pass completes within the budget, the
    /// highest-heuristic legal move is chosen with no lookahead.
    pub fn choose_move(mut self) -> Result<Option<SearchResult>> {
        if self.position.no_valid_move_exists() {
            return Ok(None);
        }

        let started = Instant::now();
        let is_searching = Arc::new(AtomicBool::new(true));
        let best: Arc<Mutex<Option<SearchResult>>> = Arc::default();

        let worker = {
            let position = self.position.clone();
            let config = self.config;
            let is_searching = Arc::clone(&is_searching);
            let best = Arc::clone(&best);
            thread::spawn(move || iterative_deepening(position, config, is_searching, best))
        };

        // Block for the budget, then ask the worker to stop. The join is the
        // grace period: the worker polls the flag at every negamax entry, so
        // it unwinds promptly without committing a partial pass.
        thread::sleep(self.config.time_cap);
        is_searching.store(false, Ordering::Relaxed);
        worker
            .join()
            .map_err(|_| anyhow!("search thread panicked"))?;

        let result = best
            .lock()
            .map_err(|_| anyhow!("search result slot was poisoned"))?
            .take();
        match result {
            Some(result) => Ok(Some(result)),
            None => self.fallback_move(started).map(Some),
        }
    }

    /// Runs a single fixed-depth pass with no time cap.
    ///
    /// Deterministic: repeated calls on the same position return the same
    /// move and score.
    pub fn at_depth(mut self, depth: usize) -> Result<Option<SearchResult>> {
        if self.position.no_valid_move_exists() {
            return Ok(None);
        }

        let started = Instant::now();
        let mut context = SearchContext::new(Arc::new(AtomicBool::new(true)));
        let mut line = Vec::new();
        let score = negamax(
            &mut self.position,
            &mut context,
            depth,
            -Score::INF,
            Score::INF,
            &mut line,
        )?;

        let Some((&mv, rest)) = line.split_first() else {
            bail!("search at depth {depth} produced no principal variation");
        };
        Ok(Some(SearchResult {
            mv,
            score,
            line: rest.to_vec(),
            stats: stats_of(&context, depth, started),
        }))
    }

    /// Degenerate case: the budget expired before any depth completed.
    /// Fall back to the single best move by the ordering heuristic.
    fn fallback_move(&mut self, started: Instant) -> Result<SearchResult> {
        let moves = self.position.legal_moves();
        let Some((mv, heuristic)) = MovePicker::new(moves, &self.position).next() else {
            bail!("no legal move available for the heuristic fallback");
        };

        Ok(SearchResult {
            mv,
            score: Score(heuristic),
            line: Vec::new(),
            stats: SearchStats {
                depth: 0,
                elapsed: started.elapsed(),
                ..Default::default()
            },
        })
    }
}

/// The worker loop: search at increasing depth, publishing the result of each
/// completed pass into the shared slot.
///
/// A cancelled pass unwinds without publishing, so whatever the caller reads
/// after joining is always the product of a fully completed depth.
fn iterative_deepening(
    mut position: Position,
    config: SearchConfig,
    is_searching: Arc<AtomicBool>,
    best: Arc<Mutex<Option<SearchResult>>>,
) {
    let started = Instant::now();
    let mut depth = config.min_depth;

    while is_searching.load(Ordering::Relaxed) && depth <= config.max_depth {
        let mut context = SearchContext::new(Arc::clone(&is_searching));
        let mut line = Vec::new();

        let Ok(score) = negamax(
            &mut position,
            &mut context,
            depth,
            -Score::INF,
            Score::INF,
            &mut line,
        ) else {
            // Cancelled mid-pass; the slot keeps the previous depth's result.
            return;
        };

        let Some((&mv, rest)) = line.split_first() else {
            return;
        };
        let result = SearchResult {
            mv,
            score,
            line: rest.to_vec(),
            stats: stats_of(&context, depth, started),
        };

        // The slot lock is only ever held for these assignments and the
        // caller's final read, neither of which can panic.
        *best.lock().expect("search result slot poisoned") = Some(result);

        depth += 1;
    }
}

fn stats_of(context: &SearchContext, depth: usize, started: Instant) -> SearchStats {
    SearchStats {
        depth,
        nodes: context.nodes,
        leaf_nodes: context.leaf_nodes,
        evaluations: context.evaluations,
        transpositions: context.transpositions,
        elapsed: started.elapsed(),
    }
}

/// Negamax with alpha-beta pruning and a transposition table.
///
/// `line` receives the principal variation found below this node whenever a
/// move raises alpha. Errors mean "cancelled", never a usable value: a
/// cancelled call must not be mistaken for a searched one.
fn negamax(
    position: &mut Position,
    context: &mut SearchContext,
    depth: usize,
    mut alpha: Score,
    mut beta: Score,
    line: &mut Vec<Move>,
) -> Result<Score> {
    if !context.keep_going() {
        bail!("cancelled");
    }
    context.nodes += 1;

    let alpha_orig = alpha;
    let key = position.zobrist();
    if let Some(entry) = context.ttable.get(key) {
        if entry.depth >= depth {
            context.transpositions += 1;
            match entry.bound {
                Bound::Exact => return Ok(entry.value),
                Bound::Lower => alpha = alpha.max(entry.value),
                Bound::Upper => beta = beta.min(entry.value),
            }
            if alpha >= beta {
                return Ok(entry.value);
            }
        }
    }

    if depth == 0 || position.no_valid_move_exists() {
        context.leaf_nodes += 1;
        return quiesce(position, context, alpha, beta);
    }

    let mut value = -Score::INF;
    for (mv, _) in MovePicker::new(position.legal_moves(), position) {
        let undo = position.make(mv);
        let mut child_line = Vec::new();
        let result = negamax(position, context, depth - 1, -beta, -alpha, &mut child_line);
        position.undo(mv, undo);
        let score = -result?;

        value = value.max(score);
        if value > alpha {
            alpha = value;
            line.clear();
            line.push(mv);
            line.append(&mut child_line);
        }
        if alpha >= beta {
            break;
        }
    }

    context.ttable.store(
        key,
        TableEntry {
            value,
            depth,
            bound: Bound::classify(value, alpha_orig, beta),
        },
    );

    Ok(value)
}

/// Quiescence search: expand captures and promotions only, to unbounded
/// depth, with the static evaluation as a stand-pat floor.
///
/// Keeps the engine from misjudging positions in the middle of an exchange.
fn quiesce(
    position: &mut Position,
    context: &mut SearchContext,
    mut alpha: Score,
    beta: Score,
) -> Result<Score> {
    if !context.keep_going() {
        bail!("cancelled");
    }
    context.evaluations += 1;

    let stand_pat = evaluate(position);
    if stand_pat >= beta {
        return Ok(beta);
    }
    alpha = alpha.max(stand_pat);

    for (mv, _) in MovePicker::new(position.interesting_moves(), position) {
        let undo = position.make(mv);
        let result = quiesce(position, context, -beta, -alpha);
        position.undo(mv, undo);
        let score = -result?;

        if score >= beta {
            return Ok(beta);
        }
        alpha = alpha.max(score);
    }

    Ok(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_mate_in_one() {
        let position: Position = "k7/8/KQ6/8/8/8/8/8 w - - 0 1".parse().unwrap();
        let result = Search::new(&position, SearchConfig::default())
            .at_depth(2)
            .unwrap()
            .unwrap();

        assert!(result.score.is_winning(), "score was {:?}", result.score);

        // Playing the chosen move must actually end the game.
        let mut played = position.clone();
        played.play(result.mv).unwrap();
        assert_eq!(
            played.status(),
            crate::Status::Checkmate {
                winner: crate::Side::White
            }
        );
    }

    #[test]
    fn test_no_move_when_stalemated() {
        let position: Position = "k7/8/KQ6/8/8/8/8/8 b - - 0 1".parse().unwrap();
        let result = Search::new(&position, SearchConfig::default())
            .at_depth(2)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_fixed_depth_is_deterministic() {
        let position: Position =
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4"
                .parse()
                .unwrap();

        let first = Search::new(&position, SearchConfig::default())
            .at_depth(3)
            .unwrap()
            .unwrap();
        let second = Search::new(&position, SearchConfig::default())
            .at_depth(3)
            .unwrap()
            .unwrap();

        assert_eq!(first.mv, second.mv);
        assert_eq!(first.score, second.score);
        assert_eq!(first.line, second.line);
    }

    #[test]
    fn test_prefers_winning_material() {
        // White can win the undefended rook with the bishop.
        let position: Position = "4k3/8/8/3r4/8/5B2/8/4K3 w - - 0 1".parse().unwrap();
        let result = Search::new(&position, SearchConfig::default())
            .at_depth(2)
            .unwrap()
            .unwrap();
        assert_eq!(result.mv.to_string(), "f3d5");
    }

    #[test]
    fn test_timed_search_returns_a_legal_move() {
        let mut position = Position::default();
        let config = SearchConfig {
            time_cap: Duration::from_millis(500),
            ..Default::default()
        };
        let result = Search::new(&position, config).choose_move().unwrap().unwrap();
        assert!(
            position.legal_moves().contains(&result.mv),
            "{} is not legal in the starting position",
            result.mv
        );
    }

    #[test]
    fn test_anticipated_line_is_playable() {
        let position: Position =
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4"
                .parse()
                .unwrap();
        let result = Search::new(&position, SearchConfig::default())
            .at_depth(3)
            .unwrap()
            .unwrap();

        // The chosen move and its anticipated continuation must replay cleanly.
        let mut replay = position.clone();
        replay.play(result.mv).unwrap();
        for mv in &result.line {
            replay.play(*mv).unwrap();
        }
    }
}
