//! Core crossword document engine.

pub mod checksum;
pub mod error;
pub mod format;
pub mod model;
pub mod scramble;
pub mod tree;

pub use error::{Result, TreeError, XwordError};
pub use format::{can_load, can_save, load, save, Handler};
pub use model::{Clue, ClueList, Clues, Direction, Grid, Puzzle, Square, SquareFlags, Word};
