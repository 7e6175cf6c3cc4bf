//! The shared domain model all codecs read and write.

mod clue;
mod grid;
mod puzzle;
mod square;
mod word;

pub use clue::{Clue, ClueList, Clues, ACROSS, DOWN};
pub use grid::{
    Direction, Grid, FLAG_NORMAL, FLAG_SCRAMBLED, TYPE_DIAGRAMLESS, TYPE_NORMAL,
};
pub use puzzle::{FormatData, Puzzle};
pub use square::{Square, SquareFlags, BLOCK};
pub use word::Word;
