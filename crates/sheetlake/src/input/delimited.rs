//! Delimited (CSV/TSV) reading with delimiter detection.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{Result, SheetlakeError};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Bytes read from the start of a file to detect its delimiter.
const SAMPLE_BYTES: u64 = 64 * 1024;

/// Non-blank lines considered when detecting the delimiter. Exports often
/// carry a preamble, so this looks further than the first couple of lines.
const SAMPLE_LINES: usize = 20;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Read raw rows from a delimited file without treating any row as a header.
///
/// Reads stop after `limit` records, so previews of very large files only
/// touch the leading part of the file. Invalid UTF-8 is decoded lossily.
pub fn read_delimited_rows(path: &Path, limit: Option<usize>) -> Result<Vec<Vec<String>>> {
    let sample = read_sample(path)?;
    let delimiter = detect_delimiter(strip_bom(&sample));

    let file = File::open(path).map_err(|e| SheetlakeError::io(path, e))?;
    let mut reader = BufReader::new(file);
    skip_bom(&mut reader).map_err(|e| SheetlakeError::io(path, e))?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.byte_records() {
        if limit.is_some_and(|max| rows.len() >= max) {
            break;
        }
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        );
    }

    Ok(rows)
}

fn read_sample(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| SheetlakeError::io(path, e))?;
    let mut sample = Vec::new();
    file.take(SAMPLE_BYTES)
        .read_to_end(&mut sample)
        .map_err(|e| SheetlakeError::io(path, e))?;
    Ok(sample)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

fn skip_bom<R: BufRead>(reader: &mut R) -> std::io::Result<()> {
    if reader.fill_buf()?.starts_with(UTF8_BOM) {
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}

/// Detect the delimiter from a leading sample.
///
/// For each candidate, lines are grouped by how many times the delimiter
/// occurs; the candidate whose most common non-zero count is shared by the
/// most lines wins. Preamble lines without any delimiter do not disqualify a
/// candidate. Falls back to comma.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SAMPLE_LINES)
        .collect();

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let mut frequency: HashMap<usize, usize> = HashMap::new();
        for line in &lines {
            let count = count_delimiter_in_line(line, delim);
            if count > 0 {
                *frequency.entry(count).or_default() += 1;
            }
        }

        let Some((&count, &agreeing)) = frequency
            .iter()
            .max_by_key(|&(&count, &agreeing)| (agreeing, count))
        else {
            continue;
        };

        // Tab gets a slight bonus as it's less common in actual data
        let score = agreeing * 1000 + count * 10 + usize::from(delim == b'\t');

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    best_delimiter
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
