//! The crossword grid: an arena of squares with two traversal orders.
//!
//! Squares are stored row-major and addressed by `(col, row)` or a flat
//! index; neighbors, first/last queries and both reading orders are
//! computed from the index, so nothing dangles when the grid is resized
//! or copied.

use super::square::Square;
use crate::xword::error::{Result, XwordError};

/// Reading direction over the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    pub fn is_across(self) -> bool {
        self == Direction::Across
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Direction::Across => write!(f, "Across"),
            Direction::Down => write!(f, "Down"),
        }
    }
}

/// Grid type word of the binary format: a normal crossword.
pub const TYPE_NORMAL: u16 = 0x0001;
/// Grid type word of the binary format: a diagramless crossword.
pub const TYPE_DIAGRAMLESS: u16 = 0x0401;

/// Grid flag bit: the solution is scrambled.
pub const FLAG_SCRAMBLED: u16 = 0x0004;
/// Grid flag word of an unscrambled grid.
pub const FLAG_NORMAL: u16 = 0x0000;

/// A width × height arena of [`Square`]s plus scramble state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    squares: Vec<Square>,
    /// Scramble key; `0` means the solution is not scrambled.
    pub scramble_key: u16,
    /// Checksum of the correct (unscrambled) solution, kept so a supplied
    /// key can be verified without exposing the plain solution.
    pub scramble_cksum: u16,
    /// Grid type word, preserved for binary round-trips.
    pub kind: u16,
    /// Grid flag word, preserved for binary round-trips.
    pub flags: u16,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Grid {
        let mut grid = Grid {
            kind: TYPE_NORMAL,
            flags: FLAG_NORMAL,
            ..Grid::default()
        };
        grid.set_size(width, height);
        grid
    }

    /// Resizes the grid, discarding all squares and rebuilding the arena.
    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.squares = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                self.squares.push(Square::new(col, row));
            }
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    pub fn at(&self, col: usize, row: usize) -> &Square {
        &self.squares[row * self.width + col]
    }

    pub fn at_mut(&mut self, col: usize, row: usize) -> &mut Square {
        &mut self.squares[row * self.width + col]
    }

    pub fn contains(&self, col: usize, row: usize) -> bool {
        col < self.width && row < self.height
    }

    /// The neighbor of `(col, row)` in reading order, or `None` at the
    /// last square of the given direction.
    pub fn next_pos(&self, col: usize, row: usize, dir: Direction) -> Option<(usize, usize)> {
        match dir {
            Direction::Across => {
                if col + 1 < self.width {
                    Some((col + 1, row))
                } else if row + 1 < self.height {
                    Some((0, row + 1))
                } else {
                    None
                }
            }
            Direction::Down => {
                if row + 1 < self.height {
                    Some((col, row + 1))
                } else if col + 1 < self.width {
                    Some((col + 1, 0))
                } else {
                    None
                }
            }
        }
    }

    /// The neighbor of `(col, row)` against reading order, or `None` at
    /// the first square.
    pub fn prev_pos(&self, col: usize, row: usize, dir: Direction) -> Option<(usize, usize)> {
        match dir {
            Direction::Across => {
                if col > 0 {
                    Some((col - 1, row))
                } else if row > 0 {
                    Some((self.width - 1, row - 1))
                } else {
                    None
                }
            }
            Direction::Down => {
                if row > 0 {
                    Some((col, row - 1))
                } else if col > 0 {
                    Some((col - 1, self.height - 1))
                } else {
                    None
                }
            }
        }
    }

    pub fn is_first(&self, col: usize, row: usize, dir: Direction) -> bool {
        match dir {
            Direction::Across => col == 0,
            Direction::Down => row == 0,
        }
    }

    pub fn is_last(&self, col: usize, row: usize, dir: Direction) -> bool {
        match dir {
            Direction::Across => col + 1 == self.width,
            Direction::Down => row + 1 == self.height,
        }
    }

    /// Squares in across (row-major) reading order.
    pub fn iter(&self) -> impl Iterator<Item = &Square> {
        self.squares.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Square> {
        self.squares.iter_mut()
    }

    /// Square positions in down (column-major) reading order.
    pub fn positions_down(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (w, h) = (self.width, self.height);
        (0..w).flat_map(move |col| (0..h).map(move |row| (col, row)))
    }

    /// Positions of white squares in down reading order, as consumed by
    /// the scrambling cipher.
    pub fn white_positions_down(&self) -> Vec<(usize, usize)> {
        self.positions_down()
            .filter(|&(col, row)| self.at(col, row).is_white())
            .collect()
    }

    pub fn is_scrambled(&self) -> bool {
        self.flags & FLAG_SCRAMBLED != 0
    }

    pub fn is_diagramless(&self) -> bool {
        self.kind == TYPE_DIAGRAMLESS
    }

    /// True when every white square carries a solution letter.
    pub fn has_solution(&self) -> bool {
        !self.is_empty() && self.iter().filter(|s| s.is_white()).all(Square::has_solution)
    }

    /// Structural validation run after any load or renumber.
    pub fn test_ok(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(XwordError::InvalidGrid("grid has zero size".to_string()));
        }
        if self.squares.len() != self.width * self.height {
            return Err(XwordError::InvalidGrid(format!(
                "expected {} squares, found {}",
                self.width * self.height,
                self.squares.len()
            )));
        }
        for (i, square) in self.squares.iter().enumerate() {
            let (col, row) = (i % self.width, i / self.width);
            if square.col != col || square.row != row {
                return Err(XwordError::InvalidGrid(format!(
                    "square at index {} claims position ({}, {})",
                    i, square.col, square.row
                )));
            }
        }
        Ok(())
    }
}
