/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;

use crate::Score;

/// How the stored value relates to the true value of the node.
///
/// See [CPW](https://www.chessprogramming.org/Node_Types) for more.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Bound {
    /// The stored value is exact.
    Exact,

    /// The search failed high: the true value is at least the stored value.
    Lower,

    /// The search failed low: the true value is at most the stored value.
    Upper,
}

impl Bound {
    /// Classifies `value` against the search window it was computed in:
    ///
    /// ```text
    /// if value <= original alpha:
    ///     Upper
    /// else if value >= beta:
    ///     Lower
    /// else:
    ///     Exact
    /// ```
    #[inline(always)]
    pub fn classify(value: Score, alpha_orig: Score, beta: Score) -> Self {
        if value <= alpha_orig {
            Self::Upper
        } else if value >= beta {
            Self::Lower
        } else {
            Self::Exact
        }
    }
}

/// What the search learned about a position.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct TableEntry {
    /// Best value found for the position.
    pub value: Score,

    /// Depth at which `value` was computed.
    pub depth: usize,

    /// Whether `value` is exact or a bound.
    pub bound: Bound,
}

/// Transposition table: a cache from Zobrist hash to previous search results,
/// exploiting the fact that move order often does not matter.
///
/// A table is owned by a single search invocation, constructed fresh and
/// discarded at the end, so no synchronization is ever needed.
#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: HashMap<u64, TableEntry>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the entry stored for `key`, if any.
    #[inline(always)]
    pub fn get(&self, key: u64) -> Option<&TableEntry> {
        self.entries.get(&key)
    }

    /// Stores `entry` for `key`, overwriting and returning whatever was there.
    ///
    /// A deeper search of the same position legitimately replaces a
    /// shallower entry.
    #[inline(always)]
    pub fn store(&mut self, key: u64, entry: TableEntry) -> Option<TableEntry> {
        self.entries.insert(key, entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_overwrite() {
        let mut table = TranspositionTable::new();
        assert!(table.is_empty());
        assert!(table.get(42).is_none());

        let shallow = TableEntry {
            value: Score(10),
            depth: 2,
            bound: Bound::Exact,
        };
        assert!(table.store(42, shallow).is_none());
        assert_eq!(table.get(42), Some(&shallow));
        assert_eq!(table.len(), 1);

        let deep = TableEntry {
            value: Score(-3),
            depth: 5,
            bound: Bound::Lower,
        };
        assert_eq!(table.store(42, deep), Some(shallow));
        assert_eq!(table.get(42), Some(&deep));
        assert_eq!(table.len(), 1);

        table.clear();
        assert!(table.get(42).is_none());
    }

    #[test]
    fn test_bound_classification() {
        let (alpha, beta) = (Score(-10), Score(10));
        assert_eq!(Bound::classify(Score(-50), alpha, beta), Bound::Upper);
        assert_eq!(Bound::classify(Score(-10), alpha, beta), Bound::Upper);
        assert_eq!(Bound::classify(Score(0), alpha, beta), Bound::Exact);
        assert_eq!(Bound::classify(Score(10), alpha, beta), Bound::Lower);
        assert_eq!(Bound::classify(Score(50), alpha, beta), Bound::Lower);
    }
}
