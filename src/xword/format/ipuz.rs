//! The ipuz (JSON) mapper. Load only.
//!
//! Consumes members of the top-level object with the tree's pop
//! accessors; whatever is left over is retained on the puzzle so the
//! unsupported-but-present structure is not silently discarded.

use log::{debug, info};

use crate::xword::error::{Result, TreeError, XwordError};
use crate::xword::model::{Clue, FormatData, Puzzle, Square, SquareFlags, TYPE_DIAGRAMLESS};
use crate::xword::tree::json::Json;

const KIND_CROSSWORD: &str = "crossword";
const KIND_DIAGRAMLESS: &str = "diagramless";
const KIND_CODED: &str = "coded";

/// Reads an ipuz document.
pub fn read(data: &[u8]) -> Result<Puzzle> {
    let mut root = match Json::parse(data) {
        Ok(root @ Json::Object(_)) => root,
        _ => return Err(XwordError::WrongFormat("ipuz")),
    };
    if root.get("version").is_none() || root.get("kind").is_none() {
        return Err(XwordError::WrongFormat("ipuz"));
    }
    root.pop("version");

    let kind = root.pop_required("kind")?;
    let kinds: Vec<String> = kind
        .as_array()?
        .iter()
        .map(|k| Ok(k.as_str()?.to_string()))
        .collect::<Result<_>>()?;
    // Most specific first: the diagramless and coded kind URNs also
    // contain the substring "crossword".
    let supported = [KIND_DIAGRAMLESS, KIND_CODED, KIND_CROSSWORD];
    let kind = kinds
        .iter()
        .find_map(|urn| supported.iter().find(|k| urn.contains(*k)))
        .ok_or_else(|| XwordError::UnsupportedVersion(kinds.join(", ")))?;
    debug!("ipuz kind: {}", kind);

    let mut dimensions = root.pop_required("dimensions")?;
    let width = dimensions.pop_required("width")?.as_usize()?;
    let height = dimensions.pop_required("height")?.as_usize()?;
    if width == 0 || height == 0 {
        return Err(XwordError::Header("grid has zero size".to_string()));
    }

    let block = root
        .pop_string("block")?
        .unwrap_or_else(|| "#".to_string());
    let empty = root
        .pop_string("empty")?
        .unwrap_or_else(|| "0".to_string());

    let mut puzzle = Puzzle::new();
    puzzle.grid.set_size(width, height);
    if *kind == KIND_DIAGRAMLESS {
        puzzle.grid.kind = TYPE_DIAGRAMLESS;
    }
    puzzle.title = root.pop_string("title")?.unwrap_or_default();
    puzzle.author = root.pop_string("author")?.unwrap_or_default();
    puzzle.copyright = root.pop_string("copyright")?.unwrap_or_default();
    puzzle.notes = root.pop_string("notes")?.unwrap_or_default();

    let sentinels = Sentinels { block, empty };
    if let Some(cells) = root.pop("puzzle") {
        apply_puzzle_cells(&mut puzzle, &cells, &sentinels)?;
    }
    if let Some(solution) = root.pop("solution") {
        apply_solution(&mut puzzle, &solution, &sentinels)?;
    }
    if let Some(saved) = root.pop("saved") {
        apply_saved(&mut puzzle, &saved, &sentinels)?;
    }
    if let Some(clues) = root.pop("clues") {
        read_clues(&mut puzzle, clues)?;
    }

    let leftovers = root.into_members()?;
    if !leftovers.is_empty() {
        debug!("retaining {} unconsumed ipuz members", leftovers.len());
    }
    puzzle.format_data = Some(FormatData::Ipuz { leftovers });
    info!("loaded ipuz: {}x{}, kind {}", width, height, kind);
    Ok(puzzle)
}

struct Sentinels {
    block: String,
    empty: String,
}

/// One cell of a 2-D ipuz array: either a bare scalar or an object
/// wrapping the scalar in `"cell"` plus optional `"style"`.
struct CellSpec<'a> {
    value: &'a Json,
    style: Option<&'a Json>,
}

fn cell_spec(cell: &Json) -> CellSpec<'_> {
    if let Json::Object(_) = cell {
        CellSpec {
            value: cell.get("cell").unwrap_or(&Json::Null),
            style: cell.get("style"),
        }
    } else {
        CellSpec {
            value: cell,
            style: None,
        }
    }
}

fn for_each_cell<'a>(
    rows: &'a Json,
    width: usize,
    height: usize,
    mut f: impl FnMut(usize, usize, &'a Json) -> Result<()>,
) -> Result<()> {
    let rows = rows.as_array()?;
    if rows.len() != height {
        return Err(XwordError::InvalidGrid(format!(
            "expected {} rows, found {}",
            height,
            rows.len()
        )));
    }
    for (row, cells) in rows.iter().enumerate() {
        let cells = cells.as_array()?;
        if cells.len() != width {
            return Err(XwordError::InvalidGrid(format!(
                "expected {} cells in row {}, found {}",
                width,
                row + 1,
                cells.len()
            )));
        }
        for (col, cell) in cells.iter().enumerate() {
            f(col, row, cell)?;
        }
    }
    Ok(())
}

/// The `puzzle` array: blocks, missing cells, clue numbers, styling.
fn apply_puzzle_cells(puzzle: &mut Puzzle, cells: &Json, sentinels: &Sentinels) -> Result<()> {
    let (width, height) = (puzzle.grid.width(), puzzle.grid.height());
    for_each_cell(cells, width, height, |col, row, cell| {
        let spec = cell_spec(cell);
        let square = puzzle.grid.at_mut(col, row);
        match spec.value {
            Json::Null => square.flags.set(SquareFlags::MISSING, true),
            Json::String(s) if *s == sentinels.block => square.set_solution("."),
            Json::String(s) if *s == sentinels.empty => {}
            Json::Number(n) if *n == sentinels.empty => {}
            Json::Number(n) => square.number = n.clone(),
            Json::String(s) => square.number = s.clone(),
            other => {
                return Err(XwordError::Tree(TreeError::TypeMismatch {
                    expected: "cell scalar",
                    found: other.kind(),
                }))
            }
        }
        if let Some(style) = spec.style {
            apply_style(square, style);
        }
        Ok(())
    })
}

fn apply_style(square: &mut Square, style: &Json) {
    if let Ok(Some(shape)) = style_str(style, "shapebg") {
        if shape == "circle" {
            square.flags.set(SquareFlags::CIRCLE, true);
        }
    }
    match style.get("highlight") {
        Some(Json::Bool(true)) => square.flags.set(SquareFlags::COLOR, true),
        _ => {}
    }
    if let Ok(Some(color)) = style_str(style, "color") {
        square.flags.set(SquareFlags::COLOR, true);
        square.color = Some(color.to_string());
    }
}

fn style_str<'a>(style: &'a Json, key: &str) -> Result<Option<&'a str>> {
    match style.get(key) {
        Some(value) => Ok(Some(value.as_str()?)),
        None => Ok(None),
    }
}

fn apply_solution(puzzle: &mut Puzzle, solution: &Json, sentinels: &Sentinels) -> Result<()> {
    let (width, height) = (puzzle.grid.width(), puzzle.grid.height());
    for_each_cell(solution, width, height, |col, row, cell| {
        let spec = cell_spec(cell);
        let square = puzzle.grid.at_mut(col, row);
        match spec.value {
            Json::Null => {}
            Json::String(s) if *s == sentinels.block => square.set_solution("."),
            Json::String(s) => square.set_solution(s),
            Json::Number(n) => square.set_solution(n),
            _ => {}
        }
        Ok(())
    })
}

fn apply_saved(puzzle: &mut Puzzle, saved: &Json, sentinels: &Sentinels) -> Result<()> {
    let (width, height) = (puzzle.grid.width(), puzzle.grid.height());
    for_each_cell(saved, width, height, |col, row, cell| {
        let spec = cell_spec(cell);
        let square = puzzle.grid.at_mut(col, row);
        match spec.value {
            Json::String(s) if *s != sentinels.block && *s != sentinels.empty => {
                square.set_text(s)
            }
            _ => {}
        }
        Ok(())
    })
}

/// Clue lists keyed by heading. Entries are `[number, text]` pairs or
/// objects with `number`/`clue` and an optional `enumeration`.
fn read_clues(puzzle: &mut Puzzle, clues: Json) -> Result<()> {
    let members = clues.into_members()?;
    for (heading, list) in members {
        let mut out = Vec::new();
        for entry in list.as_array()? {
            out.push(read_clue(entry)?);
        }
        puzzle.clues.insert(heading, out);
    }
    Ok(())
}

fn read_clue(entry: &Json) -> Result<Clue> {
    match entry {
        Json::Array(pair) if pair.len() == 2 => {
            let number = scalar_text(&pair[0])?;
            let text = pair[1].as_str()?.to_string();
            Ok(Clue::new(number, text))
        }
        Json::Object(_) => {
            let number = entry
                .get("number")
                .map(scalar_text)
                .transpose()?
                .unwrap_or_default();
            let mut text = entry
                .get("clue")
                .map(|t| Ok::<_, XwordError>(t.as_str()?.to_string()))
                .transpose()?
                .unwrap_or_default();
            if let Some(enumeration) = entry.get("enumeration") {
                let suffix = normalize_enumeration(enumeration.as_str()?);
                if !suffix.is_empty() {
                    text = format!("{} ({})", text, suffix);
                }
            }
            Ok(Clue::new(number, text))
        }
        other => Err(XwordError::Tree(TreeError::TypeMismatch {
            expected: "clue entry",
            found: other.kind(),
        })),
    }
}

fn scalar_text(value: &Json) -> Result<String> {
    match value {
        Json::Number(n) => Ok(n.clone()),
        Json::String(s) => Ok(s.clone()),
        other => Err(XwordError::Tree(TreeError::TypeMismatch {
            expected: "number or string",
            found: other.kind(),
        })),
    }
}

/// Normalizes an enumeration pattern (`"3-4,5"`, `"3 4 5"`, …) to the
/// word lengths joined by single spaces.
fn normalize_enumeration(pattern: &str) -> String {
    pattern
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
