//! The puzzle document: metadata, grid, clues, and the numbering and
//! validation algorithms shared by every codec.

use log::debug;

use super::clue::{Clue, Clues, ACROSS, DOWN};
use super::grid::{Direction, Grid};
use super::word::Word;
use crate::xword::error::{Result, XwordError};
use crate::xword::tree::json::Json;
use crate::xword::tree::xml::XmlElement;

/// Format-specific leftover data, retained so a subsequent save can
/// round-trip structure the domain model does not represent.
///
/// A closed variant per format; only the matching save path consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatData {
    Puz {
        /// On-disk version string, e.g. `b"1.3\0"`.
        version: [u8; 4],
        /// Reserved header field at offset 0x1c, preserved byte-for-byte.
        reserved_1c: u16,
        /// Reserved header region at offset 0x20, preserved byte-for-byte.
        reserved_20: [u8; 12],
        /// Unrecognized trailing sections in original order: (tag, payload).
        sections: Vec<(String, Vec<u8>)>,
    },
    Ipuz {
        /// Unconsumed top-level members of the source document.
        leftovers: Vec<(String, Json)>,
    },
    Xpf {
        /// Unrecognized children of the source `<Puzzle>` element.
        extras: Vec<XmlElement>,
    },
}

/// A complete crossword document.
///
/// Constructed empty; exactly one load populates it (replacing any
/// previous content including the grid dimensions). Saving never
/// mutates the model.
#[derive(Debug, Default)]
pub struct Puzzle {
    pub title: String,
    pub author: String,
    pub copyright: String,
    pub notes: String,
    /// Elapsed solving time in seconds.
    pub time: u32,
    pub timer_running: bool,
    pub grid: Grid,
    pub clues: Clues,
    pub format_data: Option<FormatData>,
    /// Non-fatal damage recorded during the last load, for the caller to
    /// surface. The puzzle itself is usable.
    pub warning: Option<XwordError>,
}

impl Puzzle {
    pub fn new() -> Puzzle {
        Puzzle::default()
    }

    pub fn is_scrambled(&self) -> bool {
        self.grid.is_scrambled()
    }

    /// Assigns clue numbers 1, 2, 3, … in one row-major scan.
    ///
    /// A white square gets a number when it starts an across and/or down
    /// run: no white predecessor in that direction, but a white
    /// successor. Existing numbers and has-clue marks are replaced.
    pub fn number_grid(&mut self) {
        let width = self.grid.width();
        let height = self.grid.height();
        let mut next = 1u32;
        for row in 0..height {
            for col in 0..width {
                let starts_across = self.starts_word(col, row, Direction::Across);
                let starts_down = self.starts_word(col, row, Direction::Down);
                let square = self.grid.at_mut(col, row);
                square.set_has_clue(true, starts_across);
                square.set_has_clue(false, starts_down);
                if starts_across || starts_down {
                    square.number = next.to_string();
                    next += 1;
                } else {
                    square.number.clear();
                }
            }
        }
        debug!("numbered grid: {} clue starts", next - 1);
    }

    fn starts_word(&self, col: usize, row: usize, dir: Direction) -> bool {
        let grid = &self.grid;
        if !grid.at(col, row).is_white() {
            return false;
        }
        let before_is_white = match dir {
            Direction::Across => col > 0 && grid.at(col - 1, row).is_white(),
            Direction::Down => row > 0 && grid.at(col, row - 1).is_white(),
        };
        let after_is_white = match dir {
            Direction::Across => col + 1 < grid.width() && grid.at(col + 1, row).is_white(),
            Direction::Down => row + 1 < grid.height() && grid.at(col, row + 1).is_white(),
        };
        !before_is_white && after_is_white
    }

    /// Numbers the grid and distributes a flat clue sequence, given in
    /// grid-scan order with across before down per square, into the
    /// "Across" and "Down" lists.
    pub fn set_all_clues(&mut self, flat: &[String]) -> Result<()> {
        self.number_grid();
        let mut across = Vec::new();
        let mut down = Vec::new();
        let mut iter = flat.iter();
        for row in 0..self.grid.height() {
            for col in 0..self.grid.width() {
                let square = self.grid.at(col, row);
                if !square.has_number() {
                    continue;
                }
                let number = square.number.clone();
                if square.has_clue(true) {
                    let text = iter.next().ok_or_else(|| {
                        XwordError::InvalidClues("too few clues for this grid".to_string())
                    })?;
                    across.push(Clue::new(number.clone(), text.clone()));
                }
                if square.has_clue(false) {
                    let text = iter.next().ok_or_else(|| {
                        XwordError::InvalidClues("too few clues for this grid".to_string())
                    })?;
                    down.push(Clue::new(number, text.clone()));
                }
            }
        }
        if iter.next().is_some() {
            return Err(XwordError::InvalidClues(
                "too many clues for this grid".to_string(),
            ));
        }
        self.clues.clear();
        self.clues.insert(ACROSS, across);
        self.clues.insert(DOWN, down);
        Ok(())
    }

    /// Numbers the grid and re-numbers the existing "Across"/"Down" clue
    /// lists in lock-step, failing when the list lengths do not match
    /// the grid.
    pub fn number_clues(&mut self) -> Result<()> {
        self.number_grid();
        let mut across_numbers = Vec::new();
        let mut down_numbers = Vec::new();
        for square in self.grid.iter() {
            if square.has_clue(true) {
                across_numbers.push(square.number.clone());
            }
            if square.has_clue(false) {
                down_numbers.push(square.number.clone());
            }
        }
        for (heading, numbers) in [(ACROSS, across_numbers), (DOWN, down_numbers)] {
            let list = self.clues.entry(heading);
            if list.len() != numbers.len() {
                return Err(XwordError::InvalidClues(format!(
                    "{} {} clues supplied, grid has {} {} starts",
                    list.len(),
                    heading,
                    numbers.len(),
                    heading
                )));
            }
            for (clue, number) in list.iter_mut().zip(numbers) {
                clue.number = number;
            }
        }
        Ok(())
    }

    /// True when the current "Across"/"Down" clue numbers are exactly
    /// what [`number_grid`](Puzzle::number_grid) would produce.
    pub fn uses_number_algorithm(&self) -> bool {
        let mut across_numbers = Vec::new();
        let mut down_numbers = Vec::new();
        let mut next = 1u32;
        for row in 0..self.grid.height() {
            for col in 0..self.grid.width() {
                let starts_across = self.starts_word(col, row, Direction::Across);
                let starts_down = self.starts_word(col, row, Direction::Down);
                if !(starts_across || starts_down) {
                    continue;
                }
                if starts_across {
                    across_numbers.push(next.to_string());
                }
                if starts_down {
                    down_numbers.push(next.to_string());
                }
                next += 1;
            }
        }
        let matches = |heading: &str, expected: &[String]| {
            let supplied: Vec<&str> = self
                .clues
                .get(heading)
                .map(|list| list.iter().map(|c| c.number.as_str()).collect())
                .unwrap_or_default();
            supplied.len() == expected.len()
                && supplied.iter().zip(expected).all(|(a, b)| *a == b)
        };
        matches(ACROSS, &across_numbers) && matches(DOWN, &down_numbers)
    }

    /// Resolves every "Across"/"Down" clue to its word on the grid.
    ///
    /// The clue number is looked up among the numbered squares and the
    /// word's end found by walking in the clue's direction until a
    /// non-white square or the grid edge. Numbers already on the grid
    /// are respected, not recomputed, so non-algorithmic numberings
    /// resolve too. Headings other than "Across"/"Down" keep whatever
    /// explicit words they carry.
    pub fn generate_words(&mut self) -> Result<()> {
        let grid = self.grid.clone();
        for (heading, list) in self.clues.iter_mut() {
            let dir = match heading.as_str() {
                ACROSS => Direction::Across,
                DOWN => Direction::Down,
                _ => continue,
            };
            for clue in list.iter_mut() {
                let start = grid
                    .iter()
                    .find(|s| s.number == clue.number)
                    .map(|s| (s.col, s.row))
                    .ok_or_else(|| {
                        XwordError::InvalidWord(format!(
                            "no square numbered {} for {} clue",
                            clue.number, dir
                        ))
                    })?;
                let mut end = start;
                loop {
                    let next = match dir {
                        Direction::Across => (end.0 + 1, end.1),
                        Direction::Down => (end.0, end.1 + 1),
                    };
                    if !grid.contains(next.0, next.1) || !grid.at(next.0, next.1).is_white() {
                        break;
                    }
                    end = next;
                }
                clue.word = Word::straight(start, end)?;
            }
        }
        Ok(())
    }

    /// True when no clue list carries explicit word spans yet.
    pub fn needs_words(&self) -> bool {
        self.clues
            .iter()
            .all(|(_, list)| list.iter().all(|clue| clue.word.is_empty()))
    }

    /// Post-load domain validation.
    ///
    /// Every "Across"/"Down" clue must have a word; clues under other
    /// headings (e.g. ipuz "Diagonal" lists) may go without one, since no
    /// direction exists to derive it from.
    pub fn test_ok(&self) -> Result<()> {
        self.grid.test_ok()?;
        for (heading, list) in self.clues.iter() {
            let standard = heading == ACROSS || heading == DOWN;
            for clue in list {
                if clue.word.is_empty() {
                    if !standard {
                        continue;
                    }
                    return Err(XwordError::InvalidWord(format!(
                        "{} clue {} has no word",
                        heading, clue.number
                    )));
                }
                for (col, row) in clue.word.iter() {
                    if !self.grid.contains(col, row) {
                        return Err(XwordError::InvalidWord(format!(
                            "{} clue {} references ({}, {}) outside the grid",
                            heading, clue.number, col, row
                        )));
                    }
                    if !self.grid.at(col, row).is_white() {
                        return Err(XwordError::InvalidWord(format!(
                            "{} clue {} crosses a non-white square at ({}, {})",
                            heading, clue.number, col, row
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
