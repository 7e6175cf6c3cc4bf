//! The legacy Across Lite binary codec (`.puz`).
//!
//! Fixed little-endian header, raw grid bytes, NUL-terminated
//! Windows-1252 strings, then optional tagged sections. Reserved header
//! fields and unrecognized sections are preserved byte-for-byte so a
//! round-trip through this codec is lossless even for files it does not
//! fully understand.
//!
//! Failure policy: a magic mismatch means "wrong format" (the caller
//! probes other codecs); anything broken before the clue data is fully
//! read is fatal; damage in the trailing sections is recorded on the
//! returned puzzle instead of failing the load.

use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::WINDOWS_1252;
use log::{debug, info};

use crate::xword::checksum::cksum_region;
use crate::xword::error::{Result, XwordError};
use crate::xword::model::{FormatData, Puzzle, ACROSS, DOWN};

const MAGIC: &[u8; 12] = b"ACROSS&DOWN\0";
const HEADER_LEN: usize = 0x34;

const OFF_MAGIC: usize = 0x02;
const OFF_CIB_CKSUM: usize = 0x0e;
const OFF_MASKED: usize = 0x10;
const OFF_VERSION: usize = 0x18;
const OFF_RESERVED_1C: usize = 0x1c;
const OFF_SCRAMBLE_CKSUM: usize = 0x1e;
const OFF_RESERVED_20: usize = 0x20;
const OFF_WIDTH: usize = 0x2c;
const OFF_HEIGHT: usize = 0x2d;
const OFF_NUM_CLUES: usize = 0x2e;
const OFF_TYPE: usize = 0x30;
const OFF_FLAG: usize = 0x32;

/// The CIB region: width, height, clue count, type and flag words.
const CIB_RANGE: std::ops::Range<usize> = 0x2c..0x34;

const MASK: &[u8; 8] = b"ICHEATED";

const SECTION_GRID_FLAGS: &str = "GEXT";
const SECTION_TIMER: &str = "LTIM";
const SECTION_USER_REBUS: &str = "RUSR";
const SECTION_REBUS_TABLE: &str = "RTBL";
const SECTION_REBUS_GRID: &str = "GRBS";

/// Reads a complete `.puz` file.
pub fn read(data: &[u8]) -> Result<Puzzle> {
    if data.len() < HEADER_LEN || &data[OFF_MAGIC..OFF_MAGIC + MAGIC.len()] != MAGIC {
        return Err(XwordError::WrongFormat("Across Lite"));
    }

    let overall_cksum = LittleEndian::read_u16(&data[0..]);
    let cib_cksum = LittleEndian::read_u16(&data[OFF_CIB_CKSUM..]);
    let masked: [u8; 8] = data[OFF_MASKED..OFF_MASKED + 8]
        .try_into()
        .map_err(|_| XwordError::Header("short header".to_string()))?;
    let version: [u8; 4] = data[OFF_VERSION..OFF_VERSION + 4]
        .try_into()
        .map_err(|_| XwordError::Header("short header".to_string()))?;
    let reserved_1c = LittleEndian::read_u16(&data[OFF_RESERVED_1C..]);
    let scramble_cksum = LittleEndian::read_u16(&data[OFF_SCRAMBLE_CKSUM..]);
    let reserved_20: [u8; 12] = data[OFF_RESERVED_20..OFF_RESERVED_20 + 12]
        .try_into()
        .map_err(|_| XwordError::Header("short header".to_string()))?;
    let width = data[OFF_WIDTH] as usize;
    let height = data[OFF_HEIGHT] as usize;
    let num_clues = LittleEndian::read_u16(&data[OFF_NUM_CLUES..]) as usize;
    let grid_type = LittleEndian::read_u16(&data[OFF_TYPE..]);
    let grid_flag = LittleEndian::read_u16(&data[OFF_FLAG..]);

    if width == 0 || height == 0 {
        return Err(XwordError::Header("grid has zero size".to_string()));
    }

    let mut cursor = Cursor {
        data,
        pos: HEADER_LEN,
    };
    let solution = cursor.take(width * height)?;
    let text = cursor.take(width * height)?;
    let title = cursor.take_string()?;
    let author = cursor.take_string()?;
    let copyright = cursor.take_string()?;
    let mut clue_bytes: Vec<Vec<u8>> = Vec::with_capacity(num_clues);
    for _ in 0..num_clues {
        clue_bytes.push(cursor.take_string()?.to_vec());
    }
    // Everything from here on is non-fatal: the clue data is complete.
    let mut warning = None;
    let notes = match cursor.take_string() {
        Ok(bytes) => bytes,
        Err(_) => {
            warning = Some(XwordError::Section {
                tag: "notes".to_string(),
                reason: "file truncated before the notes string".to_string(),
            });
            &[]
        }
    };

    let mut puzzle = Puzzle::new();
    puzzle.title = decode_1252(&title);
    puzzle.author = decode_1252(&author);
    puzzle.copyright = decode_1252(&copyright);
    puzzle.notes = decode_1252(notes);

    puzzle.grid.set_size(width, height);
    puzzle.grid.kind = grid_type;
    puzzle.grid.flags = grid_flag;
    puzzle.grid.scramble_cksum = scramble_cksum;
    for (i, &byte) in solution.iter().enumerate() {
        let (col, row) = (i % width, i / width);
        let square = puzzle.grid.at_mut(col, row);
        if byte != b'-' && byte != 0 {
            square.set_solution(&decode_1252(&[byte]));
        }
    }
    for (i, &byte) in text.iter().enumerate() {
        let (col, row) = (i % width, i / width);
        if byte != b'-' && byte != b'.' && byte != 0 {
            puzzle.grid.at_mut(col, row).set_text(&decode_1252(&[byte]));
        }
    }

    let clue_texts: Vec<String> = clue_bytes.iter().map(|c| decode_1252(c)).collect();
    puzzle.set_all_clues(&clue_texts)?;

    // Verify checksums under the declared version rule, then under the
    // neighboring minor version: files written with a notepad sometimes
    // carry the wrong minor version, changing whether the notes are part
    // of the checksum.
    let declared = notes_in_cksum(&version);
    let regions = CksumRegions {
        cib: &data[CIB_RANGE],
        solution,
        text,
        title: &title,
        author: &author,
        copyright: &copyright,
        clues: &clue_bytes,
        notes,
    };
    if !regions.verify(declared, overall_cksum, cib_cksum, &masked)
        && !regions.verify(!declared, overall_cksum, cib_cksum, &masked)
    {
        debug!("primary checksum mismatch under both version interpretations");
        warning.get_or_insert(XwordError::ChecksumMismatch {
            expected: overall_cksum,
            actual: regions.overall(declared),
        });
    }

    let mut unknown_sections = Vec::new();
    if let Some(section_warning) =
        read_sections(&mut cursor, &mut puzzle, &mut unknown_sections)
    {
        warning.get_or_insert(section_warning);
    }

    puzzle.warning = warning;
    puzzle.format_data = Some(FormatData::Puz {
        version,
        reserved_1c,
        reserved_20,
        sections: unknown_sections,
    });
    info!(
        "loaded .puz: {}x{}, {} clues, scrambled={}",
        width,
        height,
        num_clues,
        puzzle.grid.is_scrambled()
    );
    Ok(puzzle)
}

/// Writes a complete `.puz` file.
pub fn write(puzzle: &Puzzle) -> Result<Vec<u8>> {
    let grid = &puzzle.grid;
    let (width, height) = (grid.width(), grid.height());
    if width == 0 || height == 0 {
        return Err(XwordError::Conversion("grid has zero size".to_string()));
    }
    if width > 255 || height > 255 {
        return Err(XwordError::Conversion(format!(
            "{}x{} grid exceeds the format's one-byte dimensions",
            width, height
        )));
    }
    for (heading, _) in puzzle.clues.iter() {
        if heading.as_str() != ACROSS && heading.as_str() != DOWN {
            return Err(XwordError::Conversion(format!(
                "clue heading \"{}\" has no .puz representation",
                heading
            )));
        }
    }

    let (version, reserved_1c, reserved_20, unknown_sections) = match &puzzle.format_data {
        Some(FormatData::Puz {
            version,
            reserved_1c,
            reserved_20,
            sections,
        }) => (*version, *reserved_1c, *reserved_20, sections.as_slice()),
        _ => (*b"1.3\0", 0, [0u8; 12], &[] as &[(String, Vec<u8>)]),
    };

    let mut solution = Vec::with_capacity(width * height);
    let mut text = Vec::with_capacity(width * height);
    for square in grid.iter() {
        if square.is_black() {
            solution.push(b'.');
            text.push(b'.');
        } else {
            solution.push(plain_or(square.plain_solution(), b'-'));
            text.push(plain_or(square.plain_text(), b'-'));
        }
    }

    let title = encode_1252(&puzzle.title);
    let author = encode_1252(&puzzle.author);
    let copyright = encode_1252(&puzzle.copyright);
    let notes = encode_1252(&puzzle.notes);
    let clue_bytes = flat_clue_bytes(puzzle)?;
    let num_clues = clue_bytes.len();

    let mut cib = [0u8; 8];
    cib[0] = width as u8;
    cib[1] = height as u8;
    LittleEndian::write_u16(&mut cib[2..], num_clues as u16);
    LittleEndian::write_u16(&mut cib[4..], grid.kind);
    LittleEndian::write_u16(&mut cib[6..], grid.flags);

    let regions = CksumRegions {
        cib: &cib,
        solution: &solution,
        text: &text,
        title: &title,
        author: &author,
        copyright: &copyright,
        clues: &clue_bytes,
        notes: &notes,
    };
    let include_notes = notes_in_cksum(&version);

    let mut header = vec![0u8; HEADER_LEN];
    LittleEndian::write_u16(&mut header[0..], regions.overall(include_notes));
    header[OFF_MAGIC..OFF_MAGIC + MAGIC.len()].copy_from_slice(MAGIC);
    LittleEndian::write_u16(&mut header[OFF_CIB_CKSUM..], cksum_region(&cib, 0));
    header[OFF_MASKED..OFF_MASKED + 8].copy_from_slice(&regions.masked(include_notes));
    header[OFF_VERSION..OFF_VERSION + 4].copy_from_slice(&version);
    LittleEndian::write_u16(&mut header[OFF_RESERVED_1C..], reserved_1c);
    LittleEndian::write_u16(&mut header[OFF_SCRAMBLE_CKSUM..], grid.scramble_cksum);
    header[OFF_RESERVED_20..OFF_RESERVED_20 + 12].copy_from_slice(&reserved_20);
    header[CIB_RANGE].copy_from_slice(&cib);

    let mut out = header;
    out.extend_from_slice(&solution);
    out.extend_from_slice(&text);
    for string in [&title, &author, &copyright] {
        out.extend_from_slice(string);
        out.push(0);
    }
    for clue in &clue_bytes {
        out.extend_from_slice(clue);
        out.push(0);
    }
    out.extend_from_slice(&notes);
    out.push(0);

    write_sections(&mut out, puzzle, unknown_sections);
    info!("wrote .puz: {}x{}, {} clues", width, height, num_clues);
    Ok(out)
}

// ---------------------------------------------------------------------
// Checksums

struct CksumRegions<'a> {
    cib: &'a [u8],
    solution: &'a [u8],
    text: &'a [u8],
    title: &'a [u8],
    author: &'a [u8],
    copyright: &'a [u8],
    clues: &'a [Vec<u8>],
    notes: &'a [u8],
}

impl CksumRegions<'_> {
    /// Checksum over the string regions only, seeded with `seed`.
    ///
    /// Title, author, copyright and (under the 1.3 rule) notes include
    /// their NUL terminator when non-empty; clues never do.
    fn strings(&self, include_notes: bool, seed: u16) -> u16 {
        let mut cksum = seed;
        for region in [self.title, self.author, self.copyright] {
            if !region.is_empty() {
                cksum = cksum_region(region, cksum);
                cksum = cksum_region(&[0], cksum);
            }
        }
        for clue in self.clues {
            cksum = cksum_region(clue, cksum);
        }
        if include_notes && !self.notes.is_empty() {
            cksum = cksum_region(self.notes, cksum);
            cksum = cksum_region(&[0], cksum);
        }
        cksum
    }

    /// The primary checksum, chained cib → solution → text → strings.
    fn overall(&self, include_notes: bool) -> u16 {
        let mut cksum = cksum_region(self.cib, 0);
        cksum = cksum_region(self.solution, cksum);
        cksum = cksum_region(self.text, cksum);
        self.strings(include_notes, cksum)
    }

    /// The 8 masked bytes: checksum halves XORed against "ICHEATED".
    fn masked(&self, include_notes: bool) -> [u8; 8] {
        let cib = cksum_region(self.cib, 0);
        let solution = cksum_region(self.solution, 0);
        let text = cksum_region(self.text, 0);
        let strings = self.strings(include_notes, 0);
        let sums = [cib, solution, text, strings];
        let mut out = [0u8; 8];
        for (i, sum) in sums.iter().enumerate() {
            out[i] = MASK[i] ^ (sum & 0xff) as u8;
            out[i + 4] = MASK[i + 4] ^ (sum >> 8) as u8;
        }
        out
    }

    fn verify(
        &self,
        include_notes: bool,
        overall_cksum: u16,
        cib_cksum: u16,
        masked: &[u8; 8],
    ) -> bool {
        cksum_region(self.cib, 0) == cib_cksum
            && self.overall(include_notes) == overall_cksum
            && self.masked(include_notes) == *masked
    }
}

/// Whether this version includes the notes in its checksums.
///
/// True from 1.3 on; the load path also probes the other interpretation
/// because files in the wild get the minor version wrong.
fn notes_in_cksum(version: &[u8; 4]) -> bool {
    let major = (version[0] as char).to_digit(10).unwrap_or(1);
    let minor = (version[2] as char).to_digit(10).unwrap_or(0);
    (major, minor) >= (1, 3)
}

// ---------------------------------------------------------------------
// Sections

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(XwordError::Header(format!(
                "truncated at offset {} (need {} bytes)",
                self.pos, n
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Bytes up to the next NUL (consumed), or to end of data.
    fn take_string(&mut self) -> Result<&'a [u8]> {
        if self.remaining() == 0 {
            return Err(XwordError::Header(format!(
                "truncated at offset {} (expected string)",
                self.pos
            )));
        }
        let rest = &self.data[self.pos..];
        match rest.iter().position(|&b| b == 0) {
            Some(end) => {
                self.pos += end + 1;
                Ok(&rest[..end])
            }
            None => {
                self.pos = self.data.len();
                Ok(rest)
            }
        }
    }
}

/// Parses all trailing sections. Damage here is never fatal: the first
/// problem is returned as a warning, a truncation drops the rest of the
/// stream, and everything already applied stays applied.
fn read_sections(
    cursor: &mut Cursor<'_>,
    puzzle: &mut Puzzle,
    unknown: &mut Vec<(String, Vec<u8>)>,
) -> Option<XwordError> {
    let mut warning = None;
    let mut rebus_grid: Option<Vec<u8>> = None;
    let mut rebus_table: Option<Vec<(u8, String)>> = None;

    while cursor.remaining() > 0 {
        // A lone trailing NUL or stray padding shorter than a section
        // header is ignored.
        if cursor.remaining() < 8 {
            break;
        }
        let tag_bytes = match cursor.take(4) {
            Ok(b) => b,
            Err(_) => break,
        };
        let tag = String::from_utf8_lossy(tag_bytes).into_owned();
        let length = match cursor.take(2) {
            Ok(b) => LittleEndian::read_u16(b) as usize,
            Err(_) => break,
        };
        let expected_cksum = match cursor.take(2) {
            Ok(b) => LittleEndian::read_u16(b),
            Err(_) => break,
        };
        let body = match cursor.take(length + 1) {
            Ok(b) => &b[..length],
            Err(_) => {
                warning.get_or_insert(XwordError::Section {
                    tag,
                    reason: "section truncated".to_string(),
                });
                break;
            }
        };
        let actual_cksum = cksum_region(body, 0);
        if actual_cksum != expected_cksum {
            warning.get_or_insert(XwordError::Section {
                tag,
                reason: format!(
                    "checksum mismatch: expected {:#06x}, got {:#06x}",
                    expected_cksum, actual_cksum
                ),
            });
            continue;
        }

        match tag.as_str() {
            SECTION_GRID_FLAGS => apply_gext(puzzle, body),
            SECTION_TIMER => {
                if let Some(err) = apply_ltim(puzzle, body) {
                    warning.get_or_insert(err);
                }
            }
            SECTION_USER_REBUS => apply_rusr(puzzle, body),
            SECTION_REBUS_GRID => rebus_grid = Some(body.to_vec()),
            SECTION_REBUS_TABLE => match parse_rebus_table(body) {
                Ok(table) => rebus_table = Some(table),
                Err(err) => {
                    warning.get_or_insert(err);
                }
            },
            _ => {
                debug!("preserving unrecognized section [{}]", tag);
                unknown.push((tag, body.to_vec()));
            }
        }
    }

    if let (Some(indexes), Some(table)) = (rebus_grid, rebus_table) {
        apply_rebus(puzzle, &indexes, &table);
    }
    warning
}

fn apply_gext(puzzle: &mut Puzzle, body: &[u8]) {
    for (square, &byte) in puzzle.grid.iter_mut().zip(body) {
        square.flags = square.flags.from_gext_byte(byte);
    }
}

fn apply_ltim(puzzle: &mut Puzzle, body: &[u8]) -> Option<XwordError> {
    let text = String::from_utf8_lossy(body);
    let (seconds, running) = match text.trim_end_matches('\0').split_once(',') {
        Some(parts) => parts,
        None => {
            return Some(XwordError::Section {
                tag: SECTION_TIMER.to_string(),
                reason: format!("malformed timer value {:?}", text),
            })
        }
    };
    match seconds.trim().parse() {
        Ok(seconds) => {
            puzzle.time = seconds;
            puzzle.timer_running = running.trim() != "0";
            None
        }
        Err(_) => Some(XwordError::Section {
            tag: SECTION_TIMER.to_string(),
            reason: format!("malformed timer value {:?}", text),
        }),
    }
}

fn apply_rusr(puzzle: &mut Puzzle, body: &[u8]) {
    let mut cursor = Cursor { data: body, pos: 0 };
    let mut entries = Vec::new();
    while cursor.remaining() > 0 {
        match cursor.take_string() {
            Ok(bytes) => entries.push(decode_1252(bytes)),
            Err(_) => break,
        }
    }
    for (square, entry) in puzzle.grid.iter_mut().zip(entries) {
        if !entry.is_empty() {
            let plain = square.plain_text();
            square.set_text_rebus(&entry, plain);
        }
    }
}

/// Parses an RTBL body: `" 1:FIRST; 2:SECOND;"`.
fn parse_rebus_table(body: &[u8]) -> std::result::Result<Vec<(u8, String)>, XwordError> {
    let text = decode_1252(body);
    let mut table = Vec::new();
    for entry in text.split(';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (key, value) = entry.split_once(':').ok_or_else(|| XwordError::Section {
            tag: SECTION_REBUS_TABLE.to_string(),
            reason: format!("malformed table entry {:?}", entry),
        })?;
        let key = key.trim().parse().map_err(|_| XwordError::Section {
            tag: SECTION_REBUS_TABLE.to_string(),
            reason: format!("malformed table key {:?}", key),
        })?;
        table.push((key, value.to_string()));
    }
    Ok(table)
}

/// Applies GRBS indexes against the RTBL table. A stored byte of 0 or 1
/// means no rebus; otherwise the table key is the byte minus one.
fn apply_rebus(puzzle: &mut Puzzle, indexes: &[u8], table: &[(u8, String)]) {
    for (square, &index) in puzzle.grid.iter_mut().zip(indexes) {
        if index <= 1 {
            continue;
        }
        let key = index - 1;
        if let Some((_, value)) = table.iter().find(|(k, _)| *k == key) {
            let plain = square.plain_solution();
            square.set_solution_rebus(value, plain);
        }
    }
}

fn write_sections(out: &mut Vec<u8>, puzzle: &Puzzle, unknown: &[(String, Vec<u8>)]) {
    let grid = &puzzle.grid;

    // GRBS + RTBL, keyed from 1 so stored indexes start at 2.
    let mut table: Vec<String> = Vec::new();
    let mut indexes = vec![0u8; grid.width() * grid.height()];
    for (i, square) in grid.iter().enumerate() {
        if !square.is_solution_rebus() {
            continue;
        }
        let solution = square.solution().to_string();
        let key = match table.iter().position(|s| *s == solution) {
            Some(pos) => pos + 1,
            None => {
                table.push(solution);
                table.len()
            }
        };
        indexes[i] = key as u8 + 1;
    }
    if !table.is_empty() {
        write_section(out, SECTION_REBUS_GRID, &indexes);
        let mut body = String::new();
        for (key, value) in table.iter().enumerate() {
            body.push_str(&format!("{:2}:{};", key + 1, value));
        }
        write_section(out, SECTION_REBUS_TABLE, &encode_1252(&body));
    }

    if puzzle.time != 0 || puzzle.timer_running {
        let body = format!(
            "{},{}",
            puzzle.time,
            if puzzle.timer_running { 1 } else { 0 }
        );
        write_section(out, SECTION_TIMER, body.as_bytes());
    }

    let gext: Vec<u8> = grid.iter().map(|s| s.flags.gext_byte()).collect();
    if gext.iter().any(|&b| b != 0) {
        write_section(out, SECTION_GRID_FLAGS, &gext);
    }

    if grid.iter().any(|s| s.is_text_rebus()) {
        let mut body = Vec::new();
        for square in grid.iter() {
            if square.is_text_rebus() {
                body.extend_from_slice(&encode_1252(square.text()));
            }
            body.push(0);
        }
        write_section(out, SECTION_USER_REBUS, &body);
    }

    for (tag, body) in unknown {
        write_section(out, tag, body);
    }
}

fn write_section(out: &mut Vec<u8>, tag: &str, body: &[u8]) {
    out.extend_from_slice(tag.as_bytes());
    let mut word = [0u8; 2];
    LittleEndian::write_u16(&mut word, body.len() as u16);
    out.extend_from_slice(&word);
    LittleEndian::write_u16(&mut word, cksum_region(body, 0));
    out.extend_from_slice(&word);
    out.extend_from_slice(body);
    out.push(0);
}

// ---------------------------------------------------------------------
// Helpers

/// Clue byte strings in grid-scan order, across before down per square.
fn flat_clue_bytes(puzzle: &Puzzle) -> Result<Vec<Vec<u8>>> {
    let across = number_to_text(puzzle, ACROSS);
    let down = number_to_text(puzzle, DOWN);
    let mut out = Vec::new();
    for square in puzzle.grid.iter() {
        if !square.has_number() {
            continue;
        }
        if let Some(text) = across.iter().find(|(n, _)| *n == square.number) {
            out.push(encode_1252(&text.1));
        }
        if let Some(text) = down.iter().find(|(n, _)| *n == square.number) {
            out.push(encode_1252(&text.1));
        }
    }
    let supplied = puzzle.clues.len();
    if out.len() != supplied {
        return Err(XwordError::InvalidClues(format!(
            "{} clues supplied but {} match numbered squares",
            supplied,
            out.len()
        )));
    }
    Ok(out)
}

fn number_to_text(puzzle: &Puzzle, heading: &str) -> Vec<(String, String)> {
    puzzle
        .clues
        .get(heading)
        .map(|list| {
            list.iter()
                .map(|clue| (clue.number.clone(), clue.text.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn plain_or(byte: u8, default: u8) -> u8 {
    if byte == 0 {
        default
    } else {
        byte
    }
}

fn decode_1252(bytes: &[u8]) -> String {
    WINDOWS_1252.decode(bytes).0.into_owned()
}

fn encode_1252(text: &str) -> Vec<u8> {
    WINDOWS_1252.encode(text).0.into_owned()
}
