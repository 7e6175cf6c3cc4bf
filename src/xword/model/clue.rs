//! Clues and clue lists.

use indexmap::IndexMap;

use super::word::Word;

/// A single clue: its display number, text (which may carry inline
/// markup), and the word it applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clue {
    /// Display number; non-numeric values are allowed (rebus-style and
    /// variety puzzles).
    pub number: String,
    pub text: String,
    pub word: Word,
}

impl Clue {
    pub fn new(number: impl Into<String>, text: impl Into<String>) -> Clue {
        Clue {
            number: number.into(),
            text: text.into(),
            word: Word::new(),
        }
    }
}

/// An ordered sequence of clues under one heading.
pub type ClueList = Vec<Clue>;

pub const ACROSS: &str = "Across";
pub const DOWN: &str = "Down";

/// All clue lists of a puzzle, keyed by heading.
///
/// Insertion order is preserved so that unknown or non-standard headings
/// round-trip in their original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clues(IndexMap<String, ClueList>);

impl Clues {
    pub fn new() -> Clues {
        Clues::default()
    }

    pub fn get(&self, heading: &str) -> Option<&ClueList> {
        self.0.get(heading)
    }

    pub fn get_mut(&mut self, heading: &str) -> Option<&mut ClueList> {
        self.0.get_mut(heading)
    }

    pub fn insert(&mut self, heading: impl Into<String>, list: ClueList) {
        self.0.insert(heading.into(), list);
    }

    /// The list for `heading`, created empty on first use.
    pub fn entry(&mut self, heading: impl Into<String>) -> &mut ClueList {
        self.0.entry(heading.into()).or_default()
    }

    pub fn across(&self) -> Option<&ClueList> {
        self.get(ACROSS)
    }

    pub fn down(&self) -> Option<&ClueList> {
        self.get(DOWN)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ClueList)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut ClueList)> {
        self.0.iter_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Total clue count across all headings.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}
