use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use xword_codec::{can_load, can_save, load, save, Handler, Puzzle, XwordError};

fn sample_puzzle() -> Puzzle {
    let mut puzzle = Puzzle::new();
    puzzle.title = "Facade".to_string();
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

fn temp_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

#[test]
fn extension_dispatch_round_trips_every_writable_format() {
    let dir = tempfile::tempdir().unwrap();
    let puzzle = sample_puzzle();

    for name in ["facade.puz", "facade.xpf", "facade.jpz"] {
        let path = temp_path(&dir, name);
        save(&puzzle, &path, None).unwrap();
        let loaded = load(&path, None).unwrap();
        assert_eq!(loaded.title, "Facade", "{}", name);
        assert_eq!(loaded.clues.len(), 4, "{}", name);
        assert!(loaded.clues.across().unwrap().iter().all(|c| !c.word.is_empty()));
        loaded.test_ok().unwrap();
    }
}

#[test]
fn handler_hint_overrides_the_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "actually-binary.xml");
    save(&sample_puzzle(), &path, Some(Handler::Puz)).unwrap();

    // Hinted load goes straight to the right codec.
    let loaded = load(&path, Some(Handler::Puz)).unwrap();
    assert_eq!(loaded.title, "Facade");
    // A hint is exclusive: the wrong codec fails outright.
    assert!(load(&path, Some(Handler::Jpz)).is_err());
}

#[test]
fn fallback_probing_recovers_misnamed_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "misnamed.xpf");
    save(&sample_puzzle(), &path, Some(Handler::Puz)).unwrap();

    // The XPF handler rejects the bytes and probing finds the real codec.
    let loaded = load(&path, None).unwrap();
    assert_eq!(loaded.title, "Facade");
}

#[test]
fn unknown_extensions_still_probe_all_handlers() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "downloaded.tmp");
    save(&sample_puzzle(), &path, Some(Handler::Jpz)).unwrap();

    let loaded = load(&path, None).unwrap();
    assert_eq!(loaded.author, "A. Setter");
}

#[test]
fn garbage_with_known_extension_reports_that_handlers_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "garbage.puz");
    fs::write(&path, b"this is not a puzzle in any format").unwrap();

    // The extension-matched handler's error wins over the fallbacks'.
    let err = load(&path, None).unwrap_err();
    assert!(err.is_wrong_format(), "unexpected error: {:?}", err);
}

#[test]
fn garbage_without_a_handler_is_missing_handler() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "garbage.txt");
    fs::write(&path, b"this is not a puzzle in any format").unwrap();

    let err = load(&path, None).unwrap_err();
    assert!(matches!(err, XwordError::MissingHandler(ext) if ext == "txt"));
}

#[test]
fn ipuz_files_load_but_do_not_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "corner.ipuz");
    fs::write(
        &path,
        r##"{
            "version": "http://ipuz.org/v2",
            "kind": ["http://ipuz.org/crossword#1"],
            "dimensions": {"width": 3, "height": 3},
            "puzzle": [[1, 0, 2], [0, "#", 0], [3, 0, 0]],
            "solution": [["A", "B", "C"], ["D", "#", "E"], ["F", "G", "H"]],
            "clues": {
                "Across": [[1, "First row"], [3, "Last row"]],
                "Down": [[1, "Left column"], [2, "Right column"]]
            }
        }"##,
    )
    .unwrap();

    let loaded = load(&path, None).unwrap();
    assert_eq!(loaded.grid.at(0, 0).solution(), "A");
    // Words were derived from the file's own numbering during load.
    assert_eq!(loaded.clues.down().unwrap()[1].word.len(), 3);

    assert!(save(&loaded, &path, None).is_err());
    assert!(save(&loaded, temp_path(&dir, "copy.puz").as_path(), None).is_ok());
}

#[test]
fn non_standard_clue_headings_load_without_words() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "zones.ipuz");
    fs::write(
        &path,
        r##"{
            "version": "http://ipuz.org/v2",
            "kind": ["http://ipuz.org/crossword#1"],
            "dimensions": {"width": 3, "height": 3},
            "puzzle": [[1, 0, 2], [0, "#", 0], [3, 0, 0]],
            "solution": [["A", "B", "C"], ["D", "#", "E"], ["F", "G", "H"]],
            "clues": {
                "Across": [[1, "First row"], [3, "Last row"]],
                "Down": [[1, "Left column"], [2, "Right column"]],
                "Zones": [[1, "The whole perimeter"]]
            }
        }"##,
    )
    .unwrap();

    let loaded = load(&path, None).unwrap();
    // Across/Down words are derived; the extra heading has none to derive.
    assert!(loaded.clues.across().unwrap().iter().all(|c| !c.word.is_empty()));
    let zones = loaded.clues.get("Zones").unwrap();
    assert_eq!(zones[0].text, "The whole perimeter");
    assert!(zones[0].word.is_empty());
    loaded.test_ok().unwrap();
}

#[test]
fn capability_queries_match_the_handler_table() {
    for ext in ["puz", "PUZ", "ipuz", "xpf", "xml", "jpz"] {
        assert!(can_load(ext), "{}", ext);
    }
    assert!(can_save("puz"));
    assert!(can_save("jpz"));
    assert!(!can_save("ipuz"));
    assert!(!can_load("docx"));
    assert!(!can_save("docx"));
}

#[test]
fn missing_files_surface_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = load(temp_path(&dir, "nope.puz"), None).unwrap_err();
    assert!(matches!(err, XwordError::Io(_)));
}

#[test]
fn damaged_but_loadable_files_carry_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir, "damaged.puz");
    save(&sample_puzzle(), &path, None).unwrap();

    let mut data = fs::read(&path).unwrap();
    data[0x34] = b'Z'; // corrupt one solution byte
    fs::write(&path, &data).unwrap();

    let loaded = load(&path, None).unwrap();
    assert!(loaded.warning.is_some());
    assert!(loaded.warning.as_ref().unwrap().is_recoverable());
}
