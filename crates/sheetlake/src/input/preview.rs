//! Bounded previews of tabular files.

use std::path::Path;

use super::cell::{CellValue, PreviewMatrix};
use super::delimited::read_delimited_rows;
use super::workbook::read_first_sheet;
use crate::error::{Result, SheetlakeError};

/// Workbook extensions readable by the spreadsheet reader.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Delimited-text extensions.
const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv", "txt", "psv"];

/// Broad family of a tabular file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Spreadsheet workbook; first sheet is used.
    Workbook,
    /// Delimited text.
    Delimited,
}

impl FileKind {
    /// Classify a path by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Workbook)
        } else if DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
            Some(FileKind::Delimited)
        } else {
            None
        }
    }
}

/// The leading rows of one file.
#[derive(Debug, Clone)]
pub struct Preview {
    /// Sheet name for workbooks; file name for delimited files.
    pub sheet_name: String,
    /// At most `max_rows` rows.
    pub rows: PreviewMatrix,
}

/// Anything that can produce a bounded preview of a file.
///
/// An `Err` means the file is unreadable; the classifier records it and
/// moves on.
pub trait PreviewSource {
    fn preview(&self, path: &Path, max_rows: usize) -> Result<Preview>;
}

/// Preview source backed by the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilePreviewer;

impl FilePreviewer {
    pub fn new() -> Self {
        Self
    }
}

impl PreviewSource for FilePreviewer {
    fn preview(&self, path: &Path, max_rows: usize) -> Result<Preview> {
        match FileKind::from_path(path) {
            Some(FileKind::Workbook) => {
                let sheet = read_first_sheet(path, Some(max_rows))?;
                Ok(Preview {
                    sheet_name: sheet.sheet_name,
                    rows: sheet.rows,
                })
            }
            Some(FileKind::Delimited) => {
                let rows = read_delimited_rows(path, Some(max_rows))?
                    .into_iter()
                    .map(|row| row.iter().map(|field| CellValue::infer(field)).collect())
                    .collect();
                let sheet_name = path
                    .file_name()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(Preview { sheet_name, rows })
            }
            None => Err(SheetlakeError::UnsupportedFormat(path.display().to_string())),
        }
    }
}
