/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! End-to-end search scenarios through the public API.

use std::time::Duration;

use newt::{Position, Search, SearchConfig, Side, Status};

#[test]
fn engine_plays_itself_without_corrupting_the_game() {
    let mut position = Position::default();

    for _ in 0..6 {
        if position.status().is_over() {
            break;
        }
        let result = Search::new(&position, SearchConfig::default())
            .at_depth(2)
            .unwrap()
            .expect("an ongoing game always has a move");

        position.play(result.mv).unwrap();
        position.assert_consistent(None);
    }

    assert!(position.ply() >= 6 || position.status().is_over());
}

#[test]
fn back_rank_mate_is_found_and_delivered() {
    // White mates with the rook on the back rank.
    let position: Position = "6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1".parse().unwrap();
    let result = Search::new(&position, SearchConfig::default())
        .at_depth(2)
        .unwrap()
        .unwrap();

    assert_eq!(result.mv.to_string(), "e1e8");
    assert!(result.score.is_winning());

    let mut played = position.clone();
    played.play(result.mv).unwrap();
    assert_eq!(
        played.status(),
        Status::Checkmate {
            winner: Side::White
        }
    );
}

#[test]
fn timed_search_honors_its_budget() {
    let position = Position::default();
    let config = SearchConfig {
        time_cap: Duration::from_millis(300),
        ..Default::default()
    };

    let start = std::time::Instant::now();
    let result = Search::new(&position, config).choose_move().unwrap();
    let elapsed = start.elapsed();

    assert!(result.is_some());
    // The budget plus the cancellation grace period, with wide margin for
    // slow machines.
    assert!(
        elapsed < Duration::from_secs(5),
        "search took {elapsed:?} on a 300ms budget"
    );
}

#[test]
fn no_move_is_offered_once_the_game_is_over() {
    // Checkmated: Black has no move for the engine to find.
    let position: Position = "k7/1Q6/K7/8/8/8/8/8 b - - 0 1".parse().unwrap();
    let config = SearchConfig {
        time_cap: Duration::from_millis(50),
        ..Default::default()
    };
    let result = Search::new(&position, config).choose_move().unwrap();
    assert!(result.is_none());
}

#[test]
fn deeper_search_still_prefers_the_forced_mate() {
    // Even with more depth available, the quickest mate wins the tie-break.
    let position: Position = "6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1".parse().unwrap();
    let result = Search::new(&position, SearchConfig::default())
        .at_depth(4)
        .unwrap()
        .unwrap();

    let mut played = position.clone();
    played.play(result.mv).unwrap();
    assert_eq!(
        played.status(),
        Status::Checkmate {
            winner: Side::White
        }
    );
}
