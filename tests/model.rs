use xword_codec::xword::checksum::cksum_region;
use xword_codec::{Direction, Grid, Puzzle, Word};

/// Builds a puzzle grid from row strings; `#` is a block, letters are
/// solution letters.
fn puzzle_from_rows(rows: &[&str]) -> Puzzle {
    let mut puzzle = Puzzle::new();
    puzzle.grid.set_size(rows[0].len(), rows.len());
    for (row, line) in rows.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            let square = puzzle.grid.at_mut(col, row);
            if ch == '#' {
                square.set_solution(".");
            } else {
                square.set_solution(&ch.to_string());
            }
        }
    }
    puzzle
}

#[test]
fn numbering_assigns_sequential_numbers_to_word_starts() {
    let mut puzzle = puzzle_from_rows(&["ABC", "D#E", "FGH"]);
    puzzle.number_grid();

    // (0,0) starts both runs, (2,0) a down run, (0,2) an across run.
    assert_eq!(puzzle.grid.at(0, 0).number, "1");
    assert_eq!(puzzle.grid.at(2, 0).number, "2");
    assert_eq!(puzzle.grid.at(0, 2).number, "3");
    assert!(puzzle.grid.at(0, 0).has_clue(true));
    assert!(puzzle.grid.at(0, 0).has_clue(false));
    assert!(!puzzle.grid.at(2, 0).has_clue(true));
    assert!(puzzle.grid.at(2, 0).has_clue(false));

    // Mid-run and short-run squares get no number.
    assert_eq!(puzzle.grid.at(1, 0).number, "");
    assert_eq!(puzzle.grid.at(0, 1).number, "");
    assert_eq!(puzzle.grid.at(2, 2).number, "");
}

#[test]
fn set_all_clues_splits_flat_list_across_before_down() {
    let mut puzzle = puzzle_from_rows(&["ABC", "D#E", "FGH"]);
    let flat: Vec<String> = ["first row", "left column", "right column", "last row"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    puzzle.set_all_clues(&flat).unwrap();

    let across = puzzle.clues.across().unwrap();
    let down = puzzle.clues.down().unwrap();
    assert_eq!(across.len(), 2);
    assert_eq!(down.len(), 2);
    assert_eq!((across[0].number.as_str(), across[0].text.as_str()), ("1", "first row"));
    assert_eq!((across[1].number.as_str(), across[1].text.as_str()), ("3", "last row"));
    assert_eq!((down[0].number.as_str(), down[0].text.as_str()), ("1", "left column"));
    assert_eq!((down[1].number.as_str(), down[1].text.as_str()), ("2", "right column"));
}

#[test]
fn set_all_clues_rejects_wrong_counts() {
    let mut puzzle = puzzle_from_rows(&["ABC", "D#E", "FGH"]);
    let too_few: Vec<String> = vec!["only one".to_string()];
    assert!(puzzle.set_all_clues(&too_few).is_err());

    let too_many: Vec<String> = (0..7).map(|i| format!("clue {}", i)).collect();
    assert!(puzzle.set_all_clues(&too_many).is_err());
}

#[test]
fn generate_words_walks_to_run_ends() {
    let mut puzzle = puzzle_from_rows(&["ABC", "D#E", "FGH"]);
    let flat: Vec<String> = (0..4).map(|i| format!("clue {}", i)).collect();
    puzzle.set_all_clues(&flat).unwrap();
    puzzle.generate_words().unwrap();

    let across = puzzle.clues.across().unwrap();
    assert_eq!(across[0].word.len(), 3);
    assert_eq!(across[0].word.first(), Some((0, 0)));
    assert_eq!(across[0].word.last(), Some((2, 0)));
    assert_eq!(across[0].word.direction(), Some(Direction::Across));

    let down = puzzle.clues.down().unwrap();
    assert_eq!(down[1].word.first(), Some((2, 0)));
    assert_eq!(down[1].word.last(), Some((2, 2)));
    assert_eq!(down[1].word.direction(), Some(Direction::Down));

    puzzle.test_ok().unwrap();
}

#[test]
fn generate_words_respects_file_assigned_numbers() {
    // Non-algorithmic numbering, as a variety format might assign it.
    let mut puzzle = puzzle_from_rows(&["ABC", "D#E", "FGH"]);
    puzzle.grid.at_mut(0, 0).number = "10".to_string();
    puzzle
        .clues
        .entry("Across")
        .push(xword_codec::Clue::new("10", "first row"));
    puzzle.generate_words().unwrap();

    let across = puzzle.clues.across().unwrap();
    assert_eq!(across[0].word.first(), Some((0, 0)));
    assert_eq!(across[0].word.len(), 3);
    assert!(!puzzle.uses_number_algorithm());
}

#[test]
fn uses_number_algorithm_detects_standard_numbering() {
    let mut puzzle = puzzle_from_rows(&["ABC", "D#E", "FGH"]);
    let flat: Vec<String> = (0..4).map(|i| format!("clue {}", i)).collect();
    puzzle.set_all_clues(&flat).unwrap();
    assert!(puzzle.uses_number_algorithm());

    puzzle.clues.get_mut("Across").unwrap()[1].number = "99".to_string();
    assert!(!puzzle.uses_number_algorithm());
}

#[test]
fn number_clues_renumbers_existing_lists_in_lock_step() {
    let mut puzzle = puzzle_from_rows(&["ABC", "D#E", "FGH"]);
    for (heading, count) in [("Across", 2), ("Down", 2)] {
        let list = puzzle.clues.entry(heading);
        for i in 0..count {
            list.push(xword_codec::Clue::new("?", format!("{} {}", heading, i)));
        }
    }
    puzzle.number_clues().unwrap();
    assert_eq!(puzzle.clues.across().unwrap()[1].number, "3");
    assert_eq!(puzzle.clues.down().unwrap()[1].number, "2");

    // A list length that does not match the grid is an error.
    puzzle.clues.entry("Down").push(xword_codec::Clue::new("?", "extra"));
    assert!(puzzle.number_clues().is_err());
}

#[test]
fn straight_words_reject_diagonals() {
    let word = Word::straight((1, 2), (4, 2)).unwrap();
    assert_eq!(word.len(), 4);
    assert_eq!(word.direction(), Some(Direction::Across));

    assert!(Word::straight((0, 0), (2, 2)).is_err());
    // Backwards runs are not words either.
    assert!(Word::straight((3, 0), (1, 0)).is_err());
}

#[test]
fn test_ok_rejects_words_crossing_blocks() {
    let mut puzzle = puzzle_from_rows(&["ABC", "D#E", "FGH"]);
    puzzle.number_grid();
    let mut clue = xword_codec::Clue::new("1", "bad");
    clue.word = Word::straight((0, 1), (2, 1)).unwrap();
    puzzle.clues.entry("Across").push(clue);
    assert!(puzzle.test_ok().is_err());
}

/// Walks the whole grid from `(0, 0)` with `next_pos`, returning the
/// positions visited.
fn walk(grid: &Grid, dir: Direction) -> Vec<(usize, usize)> {
    let mut positions = vec![(0, 0)];
    while let Some((col, row)) = {
        let &(col, row) = positions.last().unwrap();
        grid.next_pos(col, row, dir)
    } {
        positions.push((col, row));
    }
    positions
}

#[test]
fn both_reading_orders_cover_the_grid() {
    let grid = Grid::new(3, 2);

    let across = walk(&grid, Direction::Across);
    assert_eq!(
        across,
        [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
    );
    let down = walk(&grid, Direction::Down);
    assert_eq!(
        down,
        [(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]
    );

    // prev_pos retraces each order exactly.
    for (dir, order) in [(Direction::Across, &across), (Direction::Down, &down)] {
        for pair in order.windows(2) {
            assert_eq!(grid.prev_pos(pair[1].0, pair[1].1, dir), Some(pair[0]));
        }
        let (col, row) = order[0];
        assert_eq!(grid.prev_pos(col, row, dir), None);
    }

    assert!(grid.is_first(0, 1, Direction::Across));
    assert!(!grid.is_first(1, 1, Direction::Across));
    assert!(grid.is_last(2, 0, Direction::Across));
    assert!(grid.is_first(2, 0, Direction::Down));
    assert!(grid.is_last(1, 1, Direction::Down));
    assert!(!grid.is_last(1, 0, Direction::Down));
}

#[test]
fn traversal_tracks_a_resize() {
    let mut grid = Grid::new(3, 2);
    grid.set_size(2, 3);

    assert_eq!(walk(&grid, Direction::Across).len(), 6);
    assert_eq!(
        walk(&grid, Direction::Across).last(),
        Some(&(1, 2))
    );
    assert_eq!(
        walk(&grid, Direction::Down),
        [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
    );
    assert!(grid.is_last(1, 0, Direction::Across));
    assert!(grid.is_last(0, 2, Direction::Down));
    grid.test_ok().unwrap();
}

#[test]
fn checksum_matches_known_values_and_chains() {
    assert_eq!(cksum_region(&[], 0), 0);
    assert_eq!(cksum_region(&[0x01], 0), 0x0001);
    // Low bit set rotates into the top before the add.
    assert_eq!(cksum_region(&[0x01, 0x00], 0), 0x8000);

    let data = b"ACROSS&DOWN";
    let whole = cksum_region(data, 0);
    let chained = cksum_region(&data[6..], cksum_region(&data[..6], 0));
    assert_eq!(whole, chained);

    // Order matters.
    let mut reversed = data.to_vec();
    reversed.reverse();
    assert_ne!(whole, cksum_region(&reversed, 0));
}

#[test]
fn clue_headings_preserve_insertion_order() {
    let mut puzzle = Puzzle::new();
    for heading in ["Honeycomb", "Across", "Down"] {
        puzzle.clues.entry(heading).push(xword_codec::Clue::new("1", heading));
    }
    let headings: Vec<&str> = puzzle.clues.iter().map(|(h, _)| h.as_str()).collect();
    assert_eq!(headings, ["Honeycomb", "Across", "Down"]);
    assert_eq!(puzzle.clues.len(), 3);
}
