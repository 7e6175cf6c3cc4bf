//! Codec registry and the load/save façade.
//!
//! Dispatch is keyed by file extension with fallback probing: when the
//! extension-matched handler fails, every other registered handler is
//! tried in a fixed order, and the extension-matched handler's error is
//! what the caller ultimately sees if nothing succeeds.

pub mod ipuz;
pub mod jpz;
pub mod puz;
pub mod xpf;

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::xword::error::{Result, XwordError};
use crate::xword::model::Puzzle;

/// A registered codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Puz,
    Ipuz,
    Xpf,
    Jpz,
}

impl Handler {
    /// All handlers, in fallback probing order.
    pub const ALL: [Handler; 4] = [Handler::Puz, Handler::Ipuz, Handler::Xpf, Handler::Jpz];

    /// The handler matching a file extension, case-insensitive.
    pub fn for_extension(extension: &str) -> Option<Handler> {
        match extension.to_ascii_lowercase().as_str() {
            "puz" => Some(Handler::Puz),
            "ipuz" => Some(Handler::Ipuz),
            "xpf" | "xml" => Some(Handler::Xpf),
            "jpz" => Some(Handler::Jpz),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Handler::Puz => "Across Lite",
            Handler::Ipuz => "ipuz",
            Handler::Xpf => "XPF",
            Handler::Jpz => "JPZ",
        }
    }

    pub fn can_load(self) -> bool {
        true
    }

    pub fn can_save(self) -> bool {
        !matches!(self, Handler::Ipuz)
    }

    /// Decodes a complete in-memory file.
    pub fn read(self, data: &[u8]) -> Result<Puzzle> {
        match self {
            Handler::Puz => puz::read(data),
            Handler::Ipuz => ipuz::read(data),
            Handler::Xpf => xpf::read(data),
            Handler::Jpz => jpz::read(data),
        }
    }

    /// Encodes a puzzle to a complete in-memory file.
    pub fn write(self, puzzle: &Puzzle) -> Result<Vec<u8>> {
        match self {
            Handler::Puz => puz::write(puzzle),
            Handler::Ipuz => Err(XwordError::Conversion(
                "saving ipuz is not supported".to_string(),
            )),
            Handler::Xpf => xpf::write(puzzle),
            Handler::Jpz => jpz::write(puzzle),
        }
    }
}

/// True when some handler loads files with this extension.
pub fn can_load(extension: &str) -> bool {
    Handler::for_extension(extension).map_or(false, Handler::can_load)
}

/// True when some handler saves files with this extension.
pub fn can_save(extension: &str) -> bool {
    Handler::for_extension(extension).map_or(false, Handler::can_save)
}

/// Loads a puzzle from a file.
///
/// With a `handler` hint only that codec is tried. Otherwise the
/// extension-matched handler goes first and the remaining handlers are
/// probed on failure; if an extension-matched handler failed, its error
/// is reported in preference to any fallback's.
pub fn load(path: impl AsRef<Path>, handler: Option<Handler>) -> Result<Puzzle> {
    let path = path.as_ref();
    info!("loading puzzle: {}", path.display());
    let data = fs::read(path)?;

    if let Some(handler) = handler {
        return finish(handler.read(&data)?);
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let matched = Handler::for_extension(extension);

    let first_error = match matched {
        Some(handler) => match handler.read(&data) {
            Ok(puzzle) => return finish(puzzle),
            Err(e) => {
                debug!("{} handler failed: {}", handler.name(), e);
                Some(e)
            }
        },
        None => None,
    };

    for handler in Handler::ALL {
        if Some(handler) == matched {
            continue;
        }
        match handler.read(&data) {
            Ok(puzzle) => return finish(puzzle),
            Err(e) => debug!("{} handler failed: {}", handler.name(), e),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Err(XwordError::MissingHandler(extension.to_string())),
    }
}

/// Saves a puzzle to a file, dispatched by extension unless a handler
/// hint is given. Saving never mutates the puzzle.
pub fn save(puzzle: &Puzzle, path: impl AsRef<Path>, handler: Option<Handler>) -> Result<()> {
    let path = path.as_ref();
    let handler = match handler {
        Some(handler) => handler,
        None => {
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default();
            Handler::for_extension(extension)
                .filter(|h| h.can_save())
                .ok_or_else(|| XwordError::MissingHandler(extension.to_string()))?
        }
    };
    info!("saving puzzle as {}: {}", handler.name(), path.display());
    let data = handler.write(puzzle)?;
    fs::write(path, data)?;
    Ok(())
}

/// Post-load steps shared by every handler: derive words when no clue
/// list carries explicit spans, then validate.
fn finish(mut puzzle: Puzzle) -> Result<Puzzle> {
    if puzzle.needs_words() {
        puzzle.generate_words()?;
    }
    puzzle.test_ok()?;
    Ok(puzzle)
}
