use std::env;

use xword_codec::xword::model::FormatData;
use xword_codec::{load, Handler, Puzzle};

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <puzzle-file> [--format <puz|ipuz|xpf|jpz>]",
            args[0]
        );
        std::process::exit(1);
    }

    let path = &args[1];
    let mut handler: Option<Handler> = None;
    // Parse --format argument
    if let Some(format_idx) = args.iter().position(|arg| arg == "--format") {
        match args.get(format_idx + 1) {
            Some(name) => match Handler::for_extension(name) {
                Some(h) => handler = Some(h),
                None => {
                    eprintln!("ERROR: Unknown format {:?}", name);
                    std::process::exit(1);
                }
            },
            None => {
                eprintln!("ERROR: --format flag requires an argument.");
                std::process::exit(1);
            }
        }
    }

    println!("Reading puzzle file: {}", path);
    println!("{}", "=".repeat(60));

    match load(path, handler) {
        Ok(puzzle) => {
            println!("\n{}", "=".repeat(60));
            println!("SUCCESS! Loading completed.");
            println!("{}", "=".repeat(60));
            print_puzzle(&puzzle);
        }
        Err(e) => {
            eprintln!("\nERROR: Failed to read puzzle file");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}

fn print_puzzle(puzzle: &Puzzle) {
    println!("\nPuzzle Information:");
    println!("  Title: {}", puzzle.title);
    println!("  Author: {}", puzzle.author);
    println!("  Copyright: {}", puzzle.copyright);
    if !puzzle.notes.is_empty() {
        println!("  Notes: {}", puzzle.notes);
    }

    let grid = &puzzle.grid;
    println!("\nGrid:");
    println!("  Size: {}x{}", grid.width(), grid.height());
    println!(
        "  Black squares: {}",
        grid.iter().filter(|s| s.is_black()).count()
    );
    println!("  Scrambled: {}", grid.is_scrambled());
    println!("  Diagramless: {}", grid.is_diagramless());

    println!("\nClues:");
    for (heading, list) in puzzle.clues.iter() {
        println!("  {}: {} clues", heading, list.len());
    }

    if puzzle.time != 0 || puzzle.timer_running {
        println!(
            "\nTimer: {} seconds ({})",
            puzzle.time,
            if puzzle.timer_running {
                "running"
            } else {
                "stopped"
            }
        );
    }

    if let Some(FormatData::Puz { sections, .. }) = &puzzle.format_data {
        if !sections.is_empty() {
            println!("\nPreserved sections:");
            for (tag, body) in sections {
                println!("  [{}] {} bytes", tag, body.len());
            }
        }
    }

    match &puzzle.warning {
        Some(warning) => println!("\nWARNING: {}", warning),
        None => println!("\nFile loaded cleanly."),
    }
}
