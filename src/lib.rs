//! # xword-codec
//!
//! A crossword-puzzle document engine: an in-memory puzzle model plus
//! codecs that losslessly read and write the legacy checksummed binary
//! `.puz` format, ipuz (JSON), XPF (XML) and JPZ (zip-wrapped XML).
//!
//! The crate also implements the grid-numbering algorithm shared by all
//! formats and the symmetric cipher used to hide a grid's solution
//! behind a 4-digit key.

pub mod xword;

// Re-export the main types for convenience
pub use xword::{
    can_load, can_save, load, save, Clue, Clues, Direction, Grid, Handler, Puzzle, Result, Square,
    SquareFlags, Word, XwordError,
};
