//! The solution-scrambling cipher.
//!
//! Scrambling hides a grid's solution behind a 4-digit numeric key so a
//! file can be distributed without immediately revealing answers. The
//! cipher operates on the plain solution letters of all white squares
//! taken in down (column-major) reading order; rebus annotations are
//! untouched, only the plain projections are rewritten.

use log::{debug, trace};
use rand::Rng;

use crate::xword::checksum::cksum_region;
use crate::xword::model::{Grid, FLAG_SCRAMBLED};

const MIN_LETTERS: usize = 12;

/// Scrambles the grid's solution in place.
///
/// With `key == 0` a fresh four-digit key (first digit 1–9) is drawn
/// from `rng`; pass an explicit key for deterministic behavior.
///
/// Returns `false` without mutating the grid when the grid is already
/// scrambled, has no complete solution, has fewer than 12 white-square
/// letters, or contains a non-alphabetic solution byte. None of these
/// are errors; such puzzles are simply never scrambled.
///
/// On success the key and the checksum of the pre-scramble letters are
/// stored on the grid and the scrambled grid flag is set.
pub fn scramble(grid: &mut Grid, key: u16, rng: &mut impl Rng) -> bool {
    if grid.is_scrambled() {
        return false;
    }
    let positions = grid.white_positions_down();
    let mut letters = Vec::with_capacity(positions.len());
    for &(col, row) in &positions {
        letters.push(grid.at(col, row).plain_solution());
    }
    if letters.len() < MIN_LETTERS || !letters.iter().all(u8::is_ascii_uppercase) {
        return false;
    }

    let key = if key == 0 {
        rng.random_range(1000..=9999)
    } else {
        key
    };
    let cksum = cksum_region(&letters, 0);
    debug!("scrambling {} letters with key {}", letters.len(), key);

    let digits = key_digits(key);
    for &digit in &digits {
        shift(&mut letters, &digits);
        rotate_left(&mut letters, usize::from(digit));
        letters = interleave(&letters);
    }

    for (&(col, row), &letter) in positions.iter().zip(&letters) {
        grid.at_mut(col, row).set_plain_solution(letter);
    }
    grid.scramble_key = key;
    grid.scramble_cksum = cksum;
    grid.flags |= FLAG_SCRAMBLED;
    true
}

/// Unscrambles the grid's solution in place, the exact inverse of
/// [`scramble`].
///
/// Succeeds only when the checksum of the recovered letters matches the
/// grid's stored scramble checksum; a wrong key leaves the grid
/// untouched and returns `false`. On success the key and checksum are
/// cleared and the scrambled flag removed.
pub fn unscramble(grid: &mut Grid, key: u16) -> bool {
    if !grid.is_scrambled() || !(1000..=9999).contains(&key) {
        return false;
    }
    let positions = grid.white_positions_down();
    let mut letters = Vec::with_capacity(positions.len());
    for &(col, row) in &positions {
        letters.push(grid.at(col, row).plain_solution());
    }
    if letters.len() < MIN_LETTERS || !letters.iter().all(u8::is_ascii_uppercase) {
        return false;
    }

    let digits = key_digits(key);
    for &digit in digits.iter().rev() {
        letters = deinterleave(&letters);
        rotate_right(&mut letters, usize::from(digit));
        unshift(&mut letters, &digits);
    }

    if cksum_region(&letters, 0) != grid.scramble_cksum {
        trace!("key {} rejected: checksum mismatch", key);
        return false;
    }

    debug!("unscrambled {} letters with key {}", letters.len(), key);
    for (&(col, row), &letter) in positions.iter().zip(&letters) {
        grid.at_mut(col, row).set_plain_solution(letter);
    }
    grid.scramble_key = 0;
    grid.scramble_cksum = 0;
    grid.flags &= !FLAG_SCRAMBLED;
    true
}

/// Tries every key 1000–9999 in order; returns the first that
/// unscrambles the grid, or `0` when none does.
///
/// A diagnostic/recovery operation, not used on the normal load/save
/// path. Bounded, purely CPU-bound work.
pub fn brute_force_unscramble(grid: &mut Grid) -> u16 {
    for key in 1000..=9999u16 {
        if unscramble(grid, key) {
            return key;
        }
    }
    0
}

fn key_digits(key: u16) -> [u8; 4] {
    [
        (key / 1000 % 10) as u8,
        (key / 100 % 10) as u8,
        (key / 10 % 10) as u8,
        (key % 10) as u8,
    ]
}

/// Adds `digits[i % 4]` to the letter at position `i`, wrapping within
/// the uppercase alphabet.
fn shift(letters: &mut [u8], digits: &[u8; 4]) {
    for (i, letter) in letters.iter_mut().enumerate() {
        *letter = b'A' + (*letter - b'A' + digits[i % 4]) % 26;
    }
}

fn unshift(letters: &mut [u8], digits: &[u8; 4]) {
    for (i, letter) in letters.iter_mut().enumerate() {
        *letter = b'A' + (*letter - b'A' + 26 - digits[i % 4] % 26) % 26;
    }
}

fn rotate_left(letters: &mut [u8], n: usize) {
    if !letters.is_empty() {
        let n = n % letters.len();
        letters.rotate_left(n);
    }
}

fn rotate_right(letters: &mut [u8], n: usize) {
    if !letters.is_empty() {
        let n = n % letters.len();
        letters.rotate_right(n);
    }
}

/// Splits the sequence in half and interleaves, starting from the back
/// half: `b0 f0 b1 f1 …`, with the back half's leftover element (odd
/// lengths) appended.
fn interleave(letters: &[u8]) -> Vec<u8> {
    let mid = letters.len() / 2;
    let (front, back) = letters.split_at(mid);
    let mut out = Vec::with_capacity(letters.len());
    for i in 0..mid {
        out.push(back[i]);
        out.push(front[i]);
    }
    if letters.len() % 2 != 0 {
        out.push(back[mid]);
    }
    out
}

/// Inverse of [`interleave`]: odd positions are the front half, even
/// positions the back half.
fn deinterleave(letters: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(letters.len());
    out.extend(letters.iter().skip(1).step_by(2));
    out.extend(letters.iter().step_by(2));
    out
}
