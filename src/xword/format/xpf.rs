//! The XPF (XML) mapper. Load and save.
//!
//! XPF uses 1-based Row/Col coordinates and per-row grid strings:
//! `.` is a block, `~` a missing cell, space a blank. Clue text is read
//! as inner markup so embedded formatting survives.

use log::{debug, info};

use crate::xword::error::{Result, XwordError};
use crate::xword::model::{
    Clue, Direction, FormatData, Puzzle, Square, SquareFlags, Word, ACROSS, DOWN,
};
use crate::xword::tree::xml::XmlElement;

const BLOCK_CHAR: char = '.';
const MISSING_CHAR: char = '~';

/// Children of `<Puzzle>` this mapper consumes; everything else is
/// retained verbatim for re-save.
const KNOWN_CHILDREN: &[&str] = &[
    "Title",
    "Author",
    "Copyright",
    "Notepad",
    "Size",
    "Grid",
    "Circles",
    "RebusEntries",
    "Shades",
    "Clues",
    "UserGrid",
    "SquareFlags",
    "User",
    "Timer",
];

/// Reads an XPF document.
pub fn read(data: &[u8]) -> Result<Puzzle> {
    let root = match XmlElement::parse(data) {
        Ok(root) if root.name == "Puzzles" => root,
        _ => return Err(XwordError::WrongFormat("XPF")),
    };
    let doc = root
        .child("Puzzle")
        .ok_or(XwordError::WrongFormat("XPF"))?;

    let size = doc.require_child("Size")?;
    let height = parse_number(&size.require_child("Rows")?.text())?;
    let width = parse_number(&size.require_child("Cols")?.text())?;
    if width == 0 || height == 0 {
        return Err(XwordError::Header("grid has zero size".to_string()));
    }

    let mut puzzle = Puzzle::new();
    puzzle.grid.set_size(width, height);
    puzzle.title = doc.child("Title").map(|e| e.text()).unwrap_or_default();
    puzzle.author = doc.child("Author").map(|e| e.text()).unwrap_or_default();
    puzzle.copyright = doc.child("Copyright").map(|e| e.text()).unwrap_or_default();
    puzzle.notes = doc.child("Notepad").map(|e| e.text()).unwrap_or_default();

    let grid = doc.require_child("Grid")?;
    let rows: Vec<&XmlElement> = grid.children_named("Row").collect();
    if rows.len() != height {
        return Err(XwordError::InvalidGrid(format!(
            "expected {} <Row> elements, found {}",
            height,
            rows.len()
        )));
    }
    // A row string shorter than the declared width is not fatal (the
    // remaining squares load as blanks) but the damage is recorded.
    let mut warning = None;
    for (row, row_el) in rows.into_iter().enumerate() {
        let mut cols = 0;
        for (col, ch) in row_el.text().chars().enumerate() {
            if col >= width {
                break;
            }
            cols += 1;
            let square = puzzle.grid.at_mut(col, row);
            match ch {
                BLOCK_CHAR => square.set_solution("."),
                MISSING_CHAR => square.flags.set(SquareFlags::MISSING, true),
                ' ' => {}
                _ => square.set_solution(&ch.to_string()),
            }
        }
        if cols < width {
            warning.get_or_insert(XwordError::InvalidGrid(format!(
                "row {} has {} cells, expected {}",
                row + 1,
                cols,
                width
            )));
        }
    }
    puzzle.warning = warning;

    if let Some(circles) = doc.child("Circles") {
        for circle in circles.children_named("Circle") {
            let (col, row) = element_pos(circle, &puzzle)?;
            puzzle
                .grid
                .at_mut(col, row)
                .flags
                .set(SquareFlags::CIRCLE, true);
        }
    }

    if let Some(entries) = doc.child("RebusEntries") {
        for rebus in entries.children_named("Rebus") {
            let (col, row) = element_pos(rebus, &puzzle)?;
            let plain = rebus
                .attr("Short")
                .and_then(|s| s.bytes().next())
                .map(|b| b.to_ascii_uppercase());
            let long = rebus.text();
            let square = puzzle.grid.at_mut(col, row);
            let plain = plain.unwrap_or_else(|| square.plain_solution());
            square.set_solution_rebus(&long, plain);
        }
    }

    if let Some(shades) = doc.child("Shades") {
        for shade in shades.children_named("Shade") {
            let (col, row) = element_pos(shade, &puzzle)?;
            let square = puzzle.grid.at_mut(col, row);
            square.flags.set(SquareFlags::COLOR, true);
            square.color = Some(shade.text());
        }
    }

    let clues = doc.require_child("Clues")?;
    for clue_el in clues.children_named("Clue") {
        let (col, row) = element_pos(clue_el, &puzzle)?;
        let number = clue_el.attr("Num").unwrap_or_default().to_string();
        let dir = clue_el.attr("Dir").unwrap_or_default();
        let heading = match dir {
            "Across" => ACROSS,
            "Down" => DOWN,
            other => {
                return Err(XwordError::InvalidClues(format!(
                    "unknown clue direction {:?}",
                    other
                )))
            }
        };
        let mut clue = Clue::new(number.clone(), clue_el.inner_markup());
        clue.word = walk_word(
            &puzzle,
            (col, row),
            if heading == ACROSS {
                Direction::Across
            } else {
                Direction::Down
            },
        )?;
        puzzle.clues.entry(heading).push(clue);
        let square = puzzle.grid.at_mut(col, row);
        square.number = number;
        square.set_has_clue(heading == ACROSS, true);
    }

    // User progress lives either directly under <Puzzle> or inside a
    // <User> wrapper, depending on the writer.
    let user = doc.child("User");
    let user_grid = doc
        .child("UserGrid")
        .or_else(|| user.and_then(|u| u.child("Grid")));
    if let Some(grid_el) = user_grid {
        for (row, row_el) in grid_el.children_named("Row").enumerate().take(height) {
            for (col, ch) in row_el.text().chars().enumerate().take(width) {
                if ch != ' ' && ch != BLOCK_CHAR && ch != MISSING_CHAR {
                    puzzle.grid.at_mut(col, row).set_text(&ch.to_string());
                }
            }
        }
    }
    let user_flags = doc
        .child("SquareFlags")
        .or_else(|| user.and_then(|u| u.child("Flags")));
    if let Some(flags_el) = user_flags {
        for flag in flags_el.children_named("Flag") {
            let (col, row) = element_pos(flag, &puzzle)?;
            let value: u16 = flag.text().trim().parse().unwrap_or(0);
            let square = puzzle.grid.at_mut(col, row);
            square.flags = SquareFlags(square.flags.0 | value);
        }
    }

    if let Some(timer) = doc.child("Timer") {
        puzzle.time = timer
            .attr("Seconds")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        puzzle.timer_running = timer.attr("Running") == Some("true");
    }

    let extras: Vec<XmlElement> = doc
        .elements()
        .filter(|e| !KNOWN_CHILDREN.contains(&e.name.as_str()))
        .cloned()
        .collect();
    if !extras.is_empty() {
        debug!("retaining {} unrecognized XPF elements", extras.len());
    }
    puzzle.format_data = Some(FormatData::Xpf { extras });
    info!("loaded XPF: {}x{}", width, height);
    Ok(puzzle)
}

/// Writes an XPF document.
pub fn write(puzzle: &Puzzle) -> Result<Vec<u8>> {
    let grid = &puzzle.grid;
    let (width, height) = (grid.width(), grid.height());
    if width == 0 || height == 0 {
        return Err(XwordError::Conversion("grid has zero size".to_string()));
    }

    let mut doc = XmlElement::new("Puzzle");
    for (name, value) in [
        ("Title", &puzzle.title),
        ("Author", &puzzle.author),
        ("Copyright", &puzzle.copyright),
        ("Notepad", &puzzle.notes),
    ] {
        if !value.is_empty() {
            doc.add_child(XmlElement::new(name).with_text(value.clone()));
        }
    }

    doc.add_child(
        XmlElement::new("Size")
            .with_child(XmlElement::new("Rows").with_text(height.to_string()))
            .with_child(XmlElement::new("Cols").with_text(width.to_string())),
    );

    let mut grid_el = XmlElement::new("Grid");
    let mut user_rows = Vec::with_capacity(height);
    for row in 0..height {
        let mut solution_row = String::with_capacity(width);
        let mut user_row = String::with_capacity(width);
        for col in 0..width {
            let square = grid.at(col, row);
            solution_row.push(if square.is_black() {
                BLOCK_CHAR
            } else if square.is_missing() {
                MISSING_CHAR
            } else if square.plain_solution() == 0 {
                ' '
            } else {
                square.plain_solution() as char
            });
            user_row.push(if square.is_black() {
                BLOCK_CHAR
            } else if square.is_missing() {
                MISSING_CHAR
            } else if square.plain_text() == 0 {
                ' '
            } else {
                square.plain_text() as char
            });
        }
        grid_el.add_child(XmlElement::new("Row").with_text(solution_row));
        user_rows.push(user_row);
    }
    doc.add_child(grid_el);

    let mut circles = XmlElement::new("Circles");
    let mut rebus_entries = XmlElement::new("RebusEntries");
    let mut shades = XmlElement::new("Shades");
    let mut flags = XmlElement::new("SquareFlags");
    for square in grid.iter() {
        if square.is_circled() {
            circles.add_child(positioned(XmlElement::new("Circle"), square));
        }
        if square.is_solution_rebus() {
            rebus_entries.add_child(
                positioned(XmlElement::new("Rebus"), square)
                    .with_attr("Short", (square.plain_solution() as char).to_string())
                    .with_text(square.solution().to_string()),
            );
        }
        if let Some(color) = &square.color {
            shades.add_child(positioned(XmlElement::new("Shade"), square).with_text(color.clone()));
        }
        // Circles, shades and `~` cells are encoded structurally above.
        let extra_flags =
            square.flags.0 & !(SquareFlags::CIRCLE | SquareFlags::COLOR | SquareFlags::MISSING);
        if extra_flags != 0 {
            flags.add_child(
                positioned(XmlElement::new("Flag"), square).with_text(extra_flags.to_string()),
            );
        }
    }
    for section in [circles, rebus_entries, shades] {
        if !section.children.is_empty() {
            doc.add_child(section);
        }
    }

    let mut clues = XmlElement::new("Clues");
    for (heading, list) in puzzle.clues.iter() {
        if heading.as_str() != ACROSS && heading.as_str() != DOWN {
            return Err(XwordError::Conversion(format!(
                "clue heading \"{}\" has no XPF representation",
                heading
            )));
        }
        for clue in list {
            let (col, row) = clue.word.first().ok_or_else(|| {
                XwordError::Conversion(format!(
                    "{} clue {} has no word",
                    heading, clue.number
                ))
            })?;
            let mut clue_el = XmlElement::new("Clue")
                .with_attr("Row", (row + 1).to_string())
                .with_attr("Col", (col + 1).to_string())
                .with_attr("Num", clue.number.clone())
                .with_attr("Dir", heading.clone());
            // Clue text is inner markup; it goes back out unescaped.
            clue_el.add_markup(clue.text.clone());
            clues.add_child(clue_el);
        }
    }
    doc.add_child(clues);

    if grid.iter().any(|s| !s.is_blank()) {
        let mut user_grid = XmlElement::new("UserGrid");
        for row in user_rows {
            user_grid.add_child(XmlElement::new("Row").with_text(row));
        }
        doc.add_child(user_grid);
    }
    if !flags.children.is_empty() {
        doc.add_child(flags);
    }

    if puzzle.time != 0 || puzzle.timer_running {
        doc.add_child(
            XmlElement::new("Timer")
                .with_attr("Seconds", puzzle.time.to_string())
                .with_attr("Running", if puzzle.timer_running { "true" } else { "false" }),
        );
    }

    if let Some(FormatData::Xpf { extras }) = &puzzle.format_data {
        for extra in extras {
            doc.add_child(extra.clone());
        }
    }

    let root = XmlElement::new("Puzzles")
        .with_attr("Version", "1.0")
        .with_child(doc);
    info!("wrote XPF: {}x{}", width, height);
    Ok(root.to_document_bytes())
}

/// Reads 1-based `Row`/`Col` attributes into 0-based coordinates.
fn element_pos(element: &XmlElement, puzzle: &Puzzle) -> Result<(usize, usize)> {
    let row = parse_number(element.attr("Row").unwrap_or_default())?;
    let col = parse_number(element.attr("Col").unwrap_or_default())?;
    if row == 0 || col == 0 || !puzzle.grid.contains(col - 1, row - 1) {
        return Err(XwordError::InvalidGrid(format!(
            "<{}> at Row={} Col={} is outside the grid",
            element.name, row, col
        )));
    }
    Ok((col - 1, row - 1))
}

fn parse_number(text: &str) -> Result<usize> {
    text.trim()
        .parse()
        .map_err(|_| XwordError::Header(format!("expected a number, found {:?}", text)))
}

fn walk_word(puzzle: &Puzzle, start: (usize, usize), dir: Direction) -> Result<Word> {
    let grid = &puzzle.grid;
    let mut end = start;
    loop {
        let next = match dir {
            Direction::Across => (end.0 + 1, end.1),
            Direction::Down => (end.0, end.1 + 1),
        };
        if !grid.contains(next.0, next.1) || !grid.at(next.0, next.1).is_white() {
            break;
        }
        end = next;
    }
    Word::straight(start, end)
}

fn positioned(element: XmlElement, square: &Square) -> XmlElement {
    element
        .with_attr("Row", (square.row + 1).to_string())
        .with_attr("Col", (square.col + 1).to_string())
}
