//! A directed span of squares.

use super::grid::Direction;
use crate::xword::error::{Result, XwordError};

/// An ordered, directed span of square positions.
///
/// Straight words are built from their two endpoints; irregular or
/// diagonal words from an explicit position list. A word owns no
/// squares, only `(col, row)` references into the grid arena.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Word {
    positions: Vec<(usize, usize)>,
}

impl Word {
    pub fn new() -> Word {
        Word::default()
    }

    /// A straight run from `start` to `end` inclusive. The direction is
    /// inferred from the endpoints; a diagonal pair is rejected.
    pub fn straight(start: (usize, usize), end: (usize, usize)) -> Result<Word> {
        let (sc, sr) = start;
        let (ec, er) = end;
        let positions: Vec<(usize, usize)> = if sr == er && sc <= ec {
            (sc..=ec).map(|col| (col, sr)).collect()
        } else if sc == ec && sr <= er {
            (sr..=er).map(|row| (sc, row)).collect()
        } else {
            return Err(XwordError::InvalidWord(format!(
                "({}, {}) to ({}, {}) is not a forward straight run",
                sc, sr, ec, er
            )));
        };
        Ok(Word { positions })
    }

    /// An explicit, possibly irregular span.
    pub fn from_positions(positions: Vec<(usize, usize)>) -> Word {
        Word { positions }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn first(&self) -> Option<(usize, usize)> {
        self.positions.first().copied()
    }

    pub fn last(&self) -> Option<(usize, usize)> {
        self.positions.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.positions.iter().copied()
    }

    /// Direction derived from the first two positions; `None` for words
    /// shorter than two squares or irregular spans.
    pub fn direction(&self) -> Option<Direction> {
        let (first, second) = match (self.positions.first(), self.positions.get(1)) {
            (Some(&a), Some(&b)) => (a, b),
            _ => return None,
        };
        if first.1 == second.1 {
            Some(Direction::Across)
        } else if first.0 == second.0 {
            Some(Direction::Down)
        } else {
            None
        }
    }
}
