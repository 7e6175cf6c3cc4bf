//! A single cell of the crossword grid.

use encoding_rs::WINDOWS_1252;

/// Per-square state flags.
///
/// The low byte matches the GEXT flag byte of the binary format so that
/// codec round-trips are a plain mask; `COLOR` and `MISSING` are
/// model-only bits with no GEXT representation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquareFlags(pub u16);

impl SquareFlags {
    pub const PENCIL: u16 = 0x0008;
    /// Previously marked incorrect (the "checked once" mark).
    pub const BLACK_MARK: u16 = 0x0010;
    /// Currently marked incorrect.
    pub const X: u16 = 0x0020;
    pub const REVEALED: u16 = 0x0040;
    pub const CIRCLE: u16 = 0x0080;
    /// Square carries a background color.
    pub const COLOR: u16 = 0x0100;
    /// Square does not exist (diagramless / irregular shapes).
    pub const MISSING: u16 = 0x0200;

    pub fn contains(self, mask: u16) -> bool {
        self.0 & mask != 0
    }

    pub fn set(&mut self, mask: u16, on: bool) {
        if on {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    /// The low byte, as stored in a GEXT section.
    pub fn gext_byte(self) -> u8 {
        (self.0 & 0x00f8) as u8
    }

    /// Merges a GEXT flag byte into the model-only high bits.
    pub fn from_gext_byte(self, byte: u8) -> SquareFlags {
        SquareFlags((self.0 & !0x00ff) | u16::from(byte) & 0x00f8)
    }
}

/// The plain-projection byte that denotes a block.
pub const BLOCK: u8 = b'.';

/// One cell of a [`Grid`](super::Grid).
///
/// Both the solution and the user-entered text are strings so that rebus
/// entries (multi-character answers) are representable; each carries a
/// single-byte "plain" projection used wherever the binary format or the
/// scrambling cipher needs exactly one byte per square. A plain byte of
/// `0` means blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Square {
    pub col: usize,
    pub row: usize,
    solution: String,
    plain_solution: u8,
    text: String,
    plain_text: u8,
    pub flags: SquareFlags,
    /// Clue number as displayed; empty when the square starts no word.
    pub number: String,
    /// Background color, kept verbatim (e.g. `"gray"` or `"FFCC00"`).
    pub color: Option<String>,
    has_across_clue: bool,
    has_down_clue: bool,
}

impl Square {
    pub fn new(col: usize, row: usize) -> Square {
        Square {
            col,
            row,
            ..Square::default()
        }
    }

    /// Sets the solution, deriving the plain projection from the text:
    /// the first ASCII alphanumeric character, uppercased.
    pub fn set_solution(&mut self, solution: &str) {
        let plain = plain_projection(solution);
        self.set_solution_rebus(solution, plain);
    }

    /// Sets a rebus solution with an explicit plain projection.
    pub fn set_solution_rebus(&mut self, solution: &str, plain: u8) {
        self.solution = solution.to_string();
        self.plain_solution = plain;
    }

    /// Overwrites only the plain projection, preserving a rebus solution.
    /// A single-character solution is rewritten to match.
    pub fn set_plain_solution(&mut self, plain: u8) {
        self.plain_solution = plain;
        if self.solution.chars().count() <= 1 {
            self.solution = if plain == 0 {
                String::new()
            } else {
                (plain as char).to_string()
            };
        }
    }

    pub fn solution(&self) -> &str {
        &self.solution
    }

    pub fn plain_solution(&self) -> u8 {
        self.plain_solution
    }

    pub fn set_text(&mut self, text: &str) {
        let plain = plain_projection(text);
        self.set_text_rebus(text, plain);
    }

    pub fn set_text_rebus(&mut self, text: &str, plain: u8) {
        self.text = text.to_string();
        self.plain_text = plain;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn plain_text(&self) -> u8 {
        self.plain_text
    }

    /// True when the plain solution denotes a block.
    pub fn is_black(&self) -> bool {
        self.plain_solution == BLOCK
    }

    /// True when the square does not exist on the board.
    pub fn is_missing(&self) -> bool {
        self.flags.contains(SquareFlags::MISSING)
    }

    /// White squares are the ones solving happens in.
    pub fn is_white(&self) -> bool {
        !self.is_black() && !self.is_missing()
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }

    pub fn has_solution(&self) -> bool {
        !self.solution.is_empty()
    }

    /// True when the solution is a multi-character rebus entry.
    pub fn is_solution_rebus(&self) -> bool {
        self.solution.chars().count() > 1
    }

    pub fn is_text_rebus(&self) -> bool {
        self.text.chars().count() > 1
    }

    pub fn is_circled(&self) -> bool {
        self.flags.contains(SquareFlags::CIRCLE)
    }

    pub fn has_number(&self) -> bool {
        !self.number.is_empty()
    }

    pub fn has_clue(&self, across: bool) -> bool {
        if across {
            self.has_across_clue
        } else {
            self.has_down_clue
        }
    }

    pub(crate) fn set_has_clue(&mut self, across: bool, value: bool) {
        if across {
            self.has_across_clue = value;
        } else {
            self.has_down_clue = value;
        }
    }
}

/// The one-byte projection of `text`: a single character maps to its
/// uppercased Windows-1252 byte (so accented letters survive the binary
/// format); a rebus entry maps to its first ASCII alphanumeric
/// character, uppercased. `0` when neither applies.
fn plain_projection(text: &str) -> u8 {
    let mut chars = text.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        let upper: String = only.to_uppercase().collect();
        let (bytes, _, _) = WINDOWS_1252.encode(&upper);
        if bytes.len() == 1 {
            return bytes[0];
        }
    }
    text.bytes()
        .find(|b| b.is_ascii_alphanumeric())
        .map(|b| b.to_ascii_uppercase())
        .unwrap_or(0)
}
