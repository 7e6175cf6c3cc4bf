use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use xword_codec::xword::format::{ipuz, jpz, xpf};
use xword_codec::xword::model::FormatData;
use xword_codec::{Puzzle, SquareFlags, XwordError};

const SAMPLE_IPUZ: &str = r##"{
    "version": "http://ipuz.org/v2",
    "kind": ["http://ipuz.org/crossword#1"],
    "title": "Corner",
    "author": "A. Setter",
    "dimensions": {"width": 3, "height": 3},
    "puzzle": [
        [1, 0, 2],
        [0, "#", 0],
        [{"cell": 3, "style": {"shapebg": "circle"}}, 0, 0]
    ],
    "solution": [
        ["A", "B", "C"],
        ["D", "#", "E"],
        ["F", "G", "H"]
    ],
    "clues": {
        "Across": [[1, "First row"], [3, "Last row"]],
        "Down": [[1, "Left column"], {"number": 2, "clue": "Right column", "enumeration": "3"}]
    },
    "explanation": "kept for later"
}"##;

fn sample_puzzle() -> Puzzle {
    let mut puzzle = Puzzle::new();
    puzzle.title = "Sample".to_string();
    puzzle.author = "A. Setter".to_string();
    puzzle.grid.set_size(3, 3);
    for (row, line) in ["ABC", "D#E", "FGH"].iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            let square = puzzle.grid.at_mut(col, row);
            if ch == '#' {
                square.set_solution(".");
            } else {
                square.set_solution(&ch.to_string());
            }
        }
    }
    let flat: Vec<String> = ["first row", "left column", "right column", "last row"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    puzzle.set_all_clues(&flat).unwrap();
    puzzle.generate_words().unwrap();
    puzzle
}

// ---------------------------------------------------------------------
// ipuz

#[test]
fn ipuz_documents_load() {
    let puzzle = ipuz::read(SAMPLE_IPUZ.as_bytes()).unwrap();
    assert_eq!(puzzle.title, "Corner");
    assert_eq!(puzzle.grid.width(), 3);
    assert!(puzzle.grid.at(1, 1).is_black());
    assert_eq!(puzzle.grid.at(0, 0).solution(), "A");
    assert_eq!(puzzle.grid.at(0, 0).number, "1");
    assert_eq!(puzzle.grid.at(0, 2).number, "3");
    assert!(puzzle.grid.at(0, 2).is_circled());

    let down = puzzle.clues.down().unwrap();
    assert_eq!(down[1].number, "2");
    assert_eq!(down[1].text, "Right column (3)");
}

#[test]
fn ipuz_unconsumed_members_are_retained() {
    let puzzle = ipuz::read(SAMPLE_IPUZ.as_bytes()).unwrap();
    match &puzzle.format_data {
        Some(FormatData::Ipuz { leftovers }) => {
            assert!(leftovers.iter().any(|(key, _)| key == "explanation"));
            assert!(!leftovers.iter().any(|(key, _)| key == "title"));
        }
        other => panic!("unexpected format data: {:?}", other),
    }
}

#[test]
fn ipuz_custom_block_sentinel() {
    let doc = r##"{
        "version": "http://ipuz.org/v2",
        "kind": ["http://ipuz.org/crossword#1"],
        "dimensions": {"width": 2, "height": 1},
        "puzzle": [[1, "X"]],
        "block": "X"
    }"##;
    let puzzle = ipuz::read(doc.as_bytes()).unwrap();
    assert!(puzzle.grid.at(1, 0).is_black());
    assert!(!puzzle.grid.at(0, 0).is_black());
}

#[test]
fn ipuz_diagramless_kind_sets_the_grid_type() {
    let doc = r##"{
        "version": "http://ipuz.org/v2",
        "kind": ["http://ipuz.org/crossword/diagramless#1"],
        "dimensions": {"width": 3, "height": 3}
    }"##;
    let puzzle = ipuz::read(doc.as_bytes()).unwrap();
    assert!(puzzle.grid.is_diagramless());
}

#[test]
fn ipuz_rejects_documents_without_kind() {
    let err = ipuz::read(br#"{"version": "http://ipuz.org/v2"}"#).unwrap_err();
    assert!(err.is_wrong_format());
}

#[test]
fn ipuz_rejects_unsupported_kinds() {
    let doc = r##"{
        "version": "http://ipuz.org/v2",
        "kind": ["http://ipuz.org/sudoku#1"],
        "dimensions": {"width": 9, "height": 9}
    }"##;
    let err = ipuz::read(doc.as_bytes()).unwrap_err();
    assert!(matches!(err, XwordError::UnsupportedVersion(_)));
}

// ---------------------------------------------------------------------
// XPF

#[test]
fn xpf_round_trips_the_model() {
    let mut puzzle = sample_puzzle();
    puzzle.grid.at_mut(0, 0).flags.set(SquareFlags::CIRCLE, true);
    puzzle.grid.at_mut(2, 2).set_solution_rebus("HOTEL", b'H');
    puzzle.grid.at_mut(0, 2).color = Some("gray".to_string());
    puzzle.grid.at_mut(0, 2).flags.set(SquareFlags::COLOR, true);
    puzzle.grid.at_mut(0, 0).set_text("A");
    puzzle.time = 42;
    puzzle.timer_running = true;

    let data = xpf::write(&puzzle).unwrap();
    let loaded = xpf::read(&data).unwrap();
    assert_eq!(loaded.title, "Sample");
    assert!(loaded.grid.at(1, 1).is_black());
    assert!(loaded.grid.at(0, 0).is_circled());
    assert_eq!(loaded.grid.at(2, 2).solution(), "HOTEL");
    assert_eq!(loaded.grid.at(2, 2).plain_solution(), b'H');
    assert_eq!(loaded.grid.at(0, 2).color.as_deref(), Some("gray"));
    assert_eq!(loaded.grid.at(0, 0).text(), "A");
    assert_eq!(loaded.time, 42);
    assert!(loaded.timer_running);
    assert_eq!(loaded.clues.across().unwrap()[0].text, "first row");
    assert_eq!(loaded.clues.down().unwrap()[1].word.len(), 3);
}

#[test]
fn xpf_preserves_clue_markup() {
    let mut puzzle = sample_puzzle();
    puzzle.clues.get_mut("Across").unwrap()[0].text = "See <i>13-Across</i>".to_string();
    let loaded = xpf::read(&xpf::write(&puzzle).unwrap()).unwrap();
    assert_eq!(
        loaded.clues.across().unwrap()[0].text,
        "See <i>13-Across</i>"
    );
}

#[test]
fn xpf_retains_unrecognized_elements() {
    let doc = br#"<?xml version="1.0" encoding="UTF-8"?>
<Puzzles Version="1.0">
  <Puzzle>
    <Title>Tiny</Title>
    <Size><Rows>1</Rows><Cols>3</Cols></Size>
    <Grid><Row>CAT</Row></Grid>
    <Clues><Clue Row="1" Col="1" Num="1" Dir="Across">Feline</Clue></Clues>
    <Mystery kind="extension">opaque</Mystery>
  </Puzzle>
</Puzzles>"#;
    let puzzle = xpf::read(doc).unwrap();
    match &puzzle.format_data {
        Some(FormatData::Xpf { extras }) => {
            assert_eq!(extras.len(), 1);
            assert_eq!(extras[0].name, "Mystery");
        }
        other => panic!("unexpected format data: {:?}", other),
    }
    // And they come back out on save.
    let rewritten = xpf::write(&puzzle).unwrap();
    assert!(String::from_utf8_lossy(&rewritten).contains("<Mystery"));
}

#[test]
fn xpf_rejects_grids_with_missing_rows() {
    let doc = br#"<?xml version="1.0" encoding="UTF-8"?>
<Puzzles Version="1.0">
  <Puzzle>
    <Size><Rows>2</Rows><Cols>3</Cols></Size>
    <Grid><Row>CAT</Row></Grid>
    <Clues></Clues>
  </Puzzle>
</Puzzles>"#;
    let err = xpf::read(doc).unwrap_err();
    assert!(matches!(err, XwordError::InvalidGrid(_)));
}

#[test]
fn xpf_short_rows_load_with_a_warning() {
    let doc = br#"<?xml version="1.0" encoding="UTF-8"?>
<Puzzles Version="1.0">
  <Puzzle>
    <Size><Rows>1</Rows><Cols>3</Cols></Size>
    <Grid><Row>CA</Row></Grid>
    <Clues></Clues>
  </Puzzle>
</Puzzles>"#;
    let puzzle = xpf::read(doc).unwrap();
    assert!(matches!(puzzle.warning, Some(XwordError::InvalidGrid(_))));
    assert_eq!(puzzle.grid.at(1, 0).solution(), "A");
    assert!(!puzzle.grid.at(2, 0).has_solution());
}

#[test]
fn xpf_rejects_other_xml_documents() {
    let err = xpf::read(b"<notes><note>hi</note></notes>").unwrap_err();
    assert!(err.is_wrong_format());
}

// ---------------------------------------------------------------------
// JPZ

#[test]
fn jpz_round_trips_the_model() {
    let mut puzzle = sample_puzzle();
    puzzle.notes = "zip-wrapped".to_string();
    puzzle.grid.at_mut(0, 0).flags.set(SquareFlags::CIRCLE, true);

    let data = jpz::write(&puzzle).unwrap();
    let loaded = jpz::read(&data).unwrap();
    assert_eq!(loaded.title, "Sample");
    assert_eq!(loaded.notes, "zip-wrapped");
    assert!(loaded.grid.at(1, 1).is_black());
    assert!(loaded.grid.at(0, 0).is_circled());
    assert_eq!(loaded.clues.across().unwrap()[1].text, "last row");
    // Words come from the file, not the numbering algorithm.
    assert_eq!(loaded.clues.down().unwrap()[0].word.len(), 3);
}

#[test]
fn jpz_skips_unrelated_archive_entries() {
    let data = jpz::write(&sample_puzzle()).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(&data[..])).unwrap();
    let mut xml = Vec::new();
    archive.by_index(0).unwrap().read_to_end(&mut xml).unwrap();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("README.txt", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"not a puzzle").unwrap();
    writer
        .start_file("puzzle.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(&xml).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let loaded = jpz::read(&bytes).unwrap();
    assert_eq!(loaded.title, "Sample");
}

#[test]
fn jpz_accepts_bare_unzipped_documents() {
    let data = jpz::write(&sample_puzzle()).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(&data[..])).unwrap();
    let mut xml = Vec::new();
    archive.by_index(0).unwrap().read_to_end(&mut xml).unwrap();

    let loaded = jpz::read(&xml).unwrap();
    assert_eq!(loaded.author, "A. Setter");
}

#[test]
fn jpz_rejects_scrambled_puzzles_on_write() {
    let mut puzzle = Puzzle::new();
    puzzle.grid.set_size(4, 4);
    for (row, line) in ["ABCD", "EFGH", "IJKL", "MNOP"].iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            puzzle.grid.at_mut(col, row).set_solution(&ch.to_string());
        }
    }
    assert!(xword_codec::xword::scramble::scramble(
        &mut puzzle.grid,
        1234,
        &mut rand::rng()
    ));
    assert!(jpz::write(&puzzle).is_err());
}
