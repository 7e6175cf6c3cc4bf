//! Custom error types for the xword-codec crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum XwordError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The bytes do not match this codec's format. The caller should try
    /// another handler.
    #[error("Not a {0} file")]
    WrongFormat(&'static str),

    /// The file is structurally unreadable; nothing usable was produced.
    #[error("Invalid or corrupted header: {0}")]
    Header(String),

    /// The file declares a format version this crate does not read.
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(String),

    /// A checksum validation failed, indicating data corruption.
    /// Non-fatal: the puzzle is still returned with this error attached.
    #[error("Checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    /// An optional trailing section is damaged or truncated.
    /// Non-fatal: the puzzle is still returned with this error attached.
    #[error("Damaged section [{tag}]: {reason}")]
    Section { tag: String, reason: String },

    /// The loaded grid violates a structural invariant.
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// Clue lists do not line up with the grid numbering.
    #[error("Invalid clues: {0}")]
    InvalidClues(String),

    /// A clue's word cannot be resolved on the grid.
    #[error("Invalid word: {0}")]
    InvalidWord(String),

    /// No handler is registered for the requested file extension.
    #[error("No handler for extension .{0}")]
    MissingHandler(String),

    /// The in-memory puzzle cannot be represented in the requested format.
    #[error("Cannot convert puzzle: {0}")]
    Conversion(String),

    /// A document tree had an unexpected shape or failed to parse.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl XwordError {
    /// True for errors that leave the already-parsed puzzle usable.
    ///
    /// Section and checksum damage is recorded on the puzzle rather than
    /// propagated; everything else aborts the load.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            XwordError::ChecksumMismatch { .. } | XwordError::Section { .. }
        )
    }

    /// True when the bytes simply belong to some other format and the
    /// caller should probe the next handler.
    pub fn is_wrong_format(&self) -> bool {
        matches!(self, XwordError::WrongFormat(_))
    }
}

/// Shape errors produced by the generic JSON/XML document trees.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A value did not have the type the accessor asked for.
    #[error("Expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A required object member was absent.
    #[error("Missing value \"{0}\"")]
    MissingKey(String),

    /// A required child element was absent.
    #[error("Missing element <{0}>")]
    MissingElement(String),

    /// The document could not be parsed at all.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A convenience `Result` type alias using the crate's `XwordError` type.
pub type Result<T> = std::result::Result<T, XwordError>;
