//! The JPZ (zip-wrapped XML) mapper. Load and save.
//!
//! A JPZ file is a zip archive holding a crossword-compiler document,
//! occasionally with unrelated siblings; each entry is tried as an
//! independent candidate until one parses. Bare, unzipped documents are
//! accepted too. Coordinates are 1-based.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use log::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::xword::error::{Result, XwordError};
use crate::xword::model::{Clue, Puzzle, SquareFlags, Word};
use crate::xword::tree::xml::XmlElement;

const ROOT_NAMES: &[&str] = &["crossword-compiler-applet", "crossword-compiler"];
const APPLET_NS: &str = "http://crossword.info/xml/crossword-compiler-applet";
const PUZZLE_NS: &str = "http://crossword.info/xml/rectangular-puzzle";

/// Reads a JPZ file, probing every archive entry.
pub fn read(data: &[u8]) -> Result<Puzzle> {
    let mut candidates: Vec<Vec<u8>> = Vec::new();
    match ZipArchive::new(Cursor::new(data)) {
        Ok(mut archive) => {
            for index in 0..archive.len() {
                let mut entry = match archive.by_index(index) {
                    Ok(entry) => entry,
                    Err(_) => continue,
                };
                let mut bytes = Vec::new();
                if entry.read_to_end(&mut bytes).is_ok() {
                    candidates.push(bytes);
                }
            }
        }
        // Some writers skip the zip wrapper entirely.
        Err(_) => candidates.push(data.to_vec()),
    }

    for (index, candidate) in candidates.iter().enumerate() {
        match read_document(candidate) {
            Ok(puzzle) => return Ok(puzzle),
            Err(e) => debug!("JPZ candidate {} rejected: {}", index, e),
        }
    }
    Err(XwordError::WrongFormat("JPZ"))
}

fn read_document(data: &[u8]) -> Result<Puzzle> {
    let root = match XmlElement::parse(data) {
        Ok(root) if ROOT_NAMES.contains(&root.name.as_str()) => root,
        _ => return Err(XwordError::WrongFormat("JPZ")),
    };
    let rectangular = root.require_child("rectangular-puzzle")?;
    let crossword = rectangular.require_child("crossword")?;

    let mut puzzle = Puzzle::new();
    if let Some(metadata) = rectangular.child("metadata") {
        puzzle.title = metadata.child("title").map(|e| e.text()).unwrap_or_default();
        puzzle.author = metadata
            .child("creator")
            .map(|e| e.text())
            .unwrap_or_default();
        puzzle.copyright = metadata
            .child("copyright")
            .map(|e| e.text())
            .unwrap_or_default();
        puzzle.notes = metadata
            .child("description")
            .map(|e| e.text())
            .unwrap_or_default();
    }

    let grid = crossword.require_child("grid")?;
    let width = parse_number(grid.attr("width").unwrap_or_default())?;
    let height = parse_number(grid.attr("height").unwrap_or_default())?;
    if width == 0 || height == 0 {
        return Err(XwordError::Header("grid has zero size".to_string()));
    }
    puzzle.grid.set_size(width, height);

    for cell in grid.children_named("cell") {
        let col = parse_number(cell.attr("x").unwrap_or_default())?;
        let row = parse_number(cell.attr("y").unwrap_or_default())?;
        if col == 0 || row == 0 || !puzzle.grid.contains(col - 1, row - 1) {
            return Err(XwordError::InvalidGrid(format!(
                "<cell> at x={} y={} is outside the grid",
                col, row
            )));
        }
        let square = puzzle.grid.at_mut(col - 1, row - 1);
        match cell.attr("type") {
            Some("block") => square.set_solution("."),
            Some("void") => square.flags.set(SquareFlags::MISSING, true),
            _ => {
                if let Some(solution) = cell.attr("solution") {
                    square.set_solution(solution);
                }
                if let Some(state) = cell.attr("solve-state") {
                    square.set_text(state);
                }
                if let Some(number) = cell.attr("number") {
                    square.number = number.to_string();
                }
                if cell.attr("background-shape") == Some("circle") {
                    square.flags.set(SquareFlags::CIRCLE, true);
                }
                if let Some(color) = cell.attr("background-color") {
                    square.flags.set(SquareFlags::COLOR, true);
                    square.color = Some(color.to_string());
                }
            }
        }
    }

    let mut words: HashMap<String, Word> = HashMap::new();
    for word_el in crossword.children_named("word") {
        let id = word_el.attr("id").unwrap_or_default().to_string();
        words.insert(id, read_word(word_el, &puzzle)?);
    }

    for clues_el in crossword.children_named("clues") {
        let heading = clues_el
            .child("title")
            .map(|e| e.text())
            .unwrap_or_default()
            .trim()
            .to_string();
        for clue_el in clues_el.children_named("clue") {
            let word_id = clue_el.attr("word").unwrap_or_default();
            let word = words.get(word_id).cloned().ok_or_else(|| {
                XwordError::InvalidWord(format!("clue references unknown word {:?}", word_id))
            })?;
            let number = clue_el.attr("number").unwrap_or_default().to_string();
            let mut clue = Clue::new(number, clue_el.inner_markup());
            clue.word = word;
            puzzle.clues.entry(heading.clone()).push(clue);
        }
    }

    info!("loaded JPZ: {}x{}, {} words", width, height, words.len());
    Ok(puzzle)
}

/// A word is given either as x/y ranges (`x="1-5" y="3"`) or as
/// explicit `<cells>` children.
fn read_word(word_el: &XmlElement, puzzle: &Puzzle) -> Result<Word> {
    let mut positions = Vec::new();
    if word_el.attr("x").is_some() {
        let (x0, x1) = parse_range(word_el.attr("x").unwrap_or_default())?;
        let (y0, y1) = parse_range(word_el.attr("y").unwrap_or_default())?;
        for y in y0..=y1 {
            for x in x0..=x1 {
                positions.push((x, y));
            }
        }
    }
    for cells in word_el.children_named("cells") {
        let (x0, x1) = parse_range(cells.attr("x").unwrap_or_default())?;
        let (y0, y1) = parse_range(cells.attr("y").unwrap_or_default())?;
        for y in y0..=y1 {
            for x in x0..=x1 {
                positions.push((x, y));
            }
        }
    }
    let positions: Vec<(usize, usize)> = positions
        .into_iter()
        .map(|(x, y)| {
            if x == 0 || y == 0 || !puzzle.grid.contains(x - 1, y - 1) {
                Err(XwordError::InvalidWord(format!(
                    "word cell x={} y={} is outside the grid",
                    x, y
                )))
            } else {
                Ok((x - 1, y - 1))
            }
        })
        .collect::<Result<_>>()?;
    if positions.is_empty() {
        return Err(XwordError::InvalidWord(
            "word with no cells".to_string(),
        ));
    }
    Ok(Word::from_positions(positions))
}

/// Writes a JPZ file: one crossword-compiler document in a zip archive.
pub fn write(puzzle: &Puzzle) -> Result<Vec<u8>> {
    let grid = &puzzle.grid;
    if grid.is_scrambled() {
        return Err(XwordError::Conversion(
            "scrambled grids cannot be saved as JPZ".to_string(),
        ));
    }
    if grid.is_diagramless() {
        return Err(XwordError::Conversion(
            "diagramless grids cannot be saved as JPZ".to_string(),
        ));
    }
    let (width, height) = (grid.width(), grid.height());
    if width == 0 || height == 0 {
        return Err(XwordError::Conversion("grid has zero size".to_string()));
    }

    let mut metadata = XmlElement::new("metadata");
    for (name, value) in [
        ("title", &puzzle.title),
        ("creator", &puzzle.author),
        ("copyright", &puzzle.copyright),
        ("description", &puzzle.notes),
    ] {
        metadata.add_child(XmlElement::new(name).with_text(value.clone()));
    }

    let mut grid_el = XmlElement::new("grid")
        .with_attr("width", width.to_string())
        .with_attr("height", height.to_string());
    for square in grid.iter() {
        let mut cell = XmlElement::new("cell")
            .with_attr("x", (square.col + 1).to_string())
            .with_attr("y", (square.row + 1).to_string());
        if square.is_black() {
            cell.set_attr("type", "block");
        } else if square.is_missing() {
            cell.set_attr("type", "void");
        } else {
            if square.has_solution() {
                cell.set_attr("solution", square.solution());
            }
            if !square.is_blank() {
                cell.set_attr("solve-state", square.text());
            }
            if square.has_number() {
                cell.set_attr("number", square.number.clone());
            }
            if square.is_circled() {
                cell.set_attr("background-shape", "circle");
            }
            if let Some(color) = &square.color {
                cell.set_attr("background-color", color.clone());
            }
        }
        grid_el.add_child(cell);
    }

    let mut crossword = XmlElement::new("crossword").with_child(grid_el);
    let mut clues_by_heading = Vec::new();
    let mut next_word_id = 1u32;
    for (heading, list) in puzzle.clues.iter() {
        let mut clues_el =
            XmlElement::new("clues").with_child(XmlElement::new("title").with_text(heading.clone()));
        for clue in list {
            if clue.word.is_empty() {
                return Err(XwordError::Conversion(format!(
                    "{} clue {} has no word",
                    heading, clue.number
                )));
            }
            let id = next_word_id.to_string();
            next_word_id += 1;
            let mut word_el = XmlElement::new("word").with_attr("id", id.clone());
            for (col, row) in clue.word.iter() {
                word_el.add_child(
                    XmlElement::new("cells")
                        .with_attr("x", (col + 1).to_string())
                        .with_attr("y", (row + 1).to_string()),
                );
            }
            crossword.add_child(word_el);
            let mut clue_el = XmlElement::new("clue")
                .with_attr("word", id)
                .with_attr("number", clue.number.clone());
            clue_el.add_markup(clue.text.clone());
            clues_el.add_child(clue_el);
        }
        clues_by_heading.push(clues_el);
    }
    for clues_el in clues_by_heading {
        crossword.add_child(clues_el);
    }

    let document = XmlElement::new("crossword-compiler-applet")
        .with_attr("xmlns", APPLET_NS)
        .with_child(
            XmlElement::new("rectangular-puzzle")
                .with_attr("xmlns", PUZZLE_NS)
                .with_child(metadata)
                .with_child(crossword),
        );
    let xml = document.to_document_bytes();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("puzzle.xml", SimpleFileOptions::default())
        .map_err(zip_error)?;
    writer.write_all(&xml)?;
    let cursor = writer.finish().map_err(zip_error)?;
    info!("wrote JPZ: {}x{}", width, height);
    Ok(cursor.into_inner())
}

fn parse_number(text: &str) -> Result<usize> {
    text.trim()
        .parse()
        .map_err(|_| XwordError::Header(format!("expected a number, found {:?}", text)))
}

/// Parses `"3"` or `"3-7"` into an inclusive range.
fn parse_range(text: &str) -> Result<(usize, usize)> {
    match text.split_once('-') {
        Some((start, end)) => Ok((parse_number(start)?, parse_number(end)?)),
        None => {
            let value = parse_number(text)?;
            Ok((value, value))
        }
    }
}

fn zip_error(error: zip::result::ZipError) -> XwordError {
    XwordError::Conversion(format!("zip container error: {}", error))
}
