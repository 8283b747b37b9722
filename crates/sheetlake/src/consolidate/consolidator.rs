//! Rebuilds one table per `(label, schema_hash)` from the classified snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};

use crate::catalog::CatalogRow;
use crate::error::{Result, SheetlakeError};
use crate::fingerprint::{normalize_columns, AliasTable, SchemaHash};
use crate::input::{read_delimited_rows, read_first_sheet, DataTable, FileKind};

/// Metadata columns appended to every consolidated table.
pub const LABEL_COLUMN: &str = "label";
pub const SCHEMA_HASH_COLUMN: &str = "schema_hash";
pub const SOURCE_FILE_COLUMN: &str = "source_file";

/// Header row of a workbook recorded in the catalog for this schema and
/// original file name. Ties go to the newest modification time.
pub fn catalog_header_row(
    catalog: &[CatalogRow],
    schema_hash: &SchemaHash,
    original_filename: &str,
) -> Option<usize> {
    catalog
        .iter()
        .filter(|row| row.schema_hash.as_ref() == Some(schema_hash))
        .filter(|row| row.file_name() == Some(original_filename))
        .filter(|row| row.header_row_index.is_some())
        .max_by_key(|row| row.mtime)
        .and_then(|row| row.header_row_index)
}

/// Name of the file before it was prefixed with `{schema_hash}__`.
pub fn original_filename(classified_name: &str) -> &str {
    classified_name
        .split_once("__")
        .map(|(_, rest)| rest)
        .unwrap_or(classified_name)
}

/// Concatenates the classified files of one schema into a single table.
#[derive(Debug, Clone)]
pub struct Consolidator {
    classified_dir: PathBuf,
    catalog: Vec<CatalogRow>,
    aliases: AliasTable,
}

impl Consolidator {
    pub fn new(classified_dir: impl Into<PathBuf>, catalog: Vec<CatalogRow>, aliases: AliasTable) -> Self {
        Self {
            classified_dir: classified_dir.into(),
            catalog,
            aliases,
        }
    }

    pub fn catalog(&self) -> &[CatalogRow] {
        &self.catalog
    }

    /// Classified files for a schema, sorted by path.
    pub fn matching_files(&self, label: &str, schema_hash: &SchemaHash) -> Result<Vec<PathBuf>> {
        let label_dir = self.classified_dir.join(label);
        let pattern = Pattern::new(&format!("{}__*", Pattern::escape(schema_hash.as_str())))
            .map_err(|e| SheetlakeError::Config(format!("invalid schema hash pattern: {}", e)))?;

        if !label_dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&label_dir).map_err(|e| SheetlakeError::io(&label_dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SheetlakeError::io(&label_dir, e))?;
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| pattern.matches(name));
            if matches && path.is_file() && FileKind::from_path(&path).is_some() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Consolidate every classified file of `(label, schema_hash)`.
    ///
    /// Fails with `NotFound` when nothing matches. Columns are aligned by
    /// name across files and `label`, `schema_hash` and `source_file` are
    /// appended.
    pub fn consolidate(&self, label: &str, schema_hash: &SchemaHash) -> Result<DataTable> {
        let files = self.matching_files(label, schema_hash)?;
        if files.is_empty() {
            return Err(SheetlakeError::NotFound {
                label: label.to_string(),
                schema_hash: schema_hash.to_string(),
                dir: self.classified_dir.join(label),
            });
        }

        let mut tables = Vec::with_capacity(files.len());
        for path in &files {
            tables.push(self.read_classified_file(path, label, schema_hash)?);
        }
        Ok(DataTable::concat(tables))
    }

    fn read_classified_file(&self, path: &Path, label: &str, schema_hash: &SchemaHash) -> Result<DataTable> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let original = original_filename(name);

        let (header_row, rows) = match FileKind::from_path(path) {
            Some(FileKind::Workbook) => {
                let header_row = catalog_header_row(&self.catalog, schema_hash, original);
                if header_row.is_none() {
                    warn!(path = %path.display(), "no catalog match, using first row as header");
                }
                let sheet = read_first_sheet(path, None)?;
                let rows = sheet
                    .rows
                    .into_iter()
                    .map(|row| row.iter().map(|c| c.to_string()).collect())
                    .collect();
                (header_row.unwrap_or(0), rows)
            }
            Some(FileKind::Delimited) => (0, read_delimited_rows(path, None)?),
            None => return Err(SheetlakeError::UnsupportedFormat(path.display().to_string())),
        };

        let mut table = rows_to_table(rows, header_row, &self.aliases);
        debug!(
            path = %path.display(),
            header_row,
            rows = table.row_count(),
            columns = table.column_count(),
            "read classified file"
        );

        table.push_constant_column(LABEL_COLUMN, label);
        table.push_constant_column(SCHEMA_HASH_COLUMN, schema_hash.as_str());
        table.push_constant_column(SOURCE_FILE_COLUMN, original);
        Ok(table)
    }
}

/// Build a table using `rows[header_row]` as header. Rows before the header
/// and fully blank rows after it are dropped.
fn rows_to_table(rows: Vec<Vec<String>>, header_row: usize, aliases: &AliasTable) -> DataTable {
    let mut rows = rows.into_iter().skip(header_row);
    let Some(raw_headers) = rows.next() else {
        return DataTable::default();
    };

    let data: Vec<Vec<String>> = rows
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();

    let width = data
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(raw_headers.len());
    let mut raw_headers = raw_headers;
    raw_headers.resize(width, String::new());

    DataTable::new(normalize_columns(&raw_headers, aliases), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FileStatus;
    use chrono::{TimeZone, Utc};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn catalog_row(path: &str, hash: &SchemaHash, header: usize, day: u32) -> CatalogRow {
        CatalogRow {
            run_ts: "ts".to_string(),
            path: PathBuf::from(path),
            size: 0,
            mtime: Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap(),
            sheet_name: None,
            status: FileStatus::Ok,
            error_message: None,
            header_row_index: Some(header),
            header_confidence: 0.9,
            raw_headers: Vec::new(),
            normalized_headers: Vec::new(),
            schema_key: None,
            schema_hash: Some(hash.clone()),
            schema_id: None,
            label: Some("visits".to_string()),
        }
    }

    #[test]
    fn test_original_filename() {
        assert_eq!(original_filename("ab12__report__v2.xlsx"), "report__v2.xlsx");
        assert_eq!(original_filename("plain.csv"), "plain.csv");
    }

    #[test]
    fn test_catalog_header_row_newest_wins() {
        let hash = SchemaHash::new("ab12cd34ef56");
        let other = SchemaHash::new("000000000000");
        let catalog = vec![
            catalog_row("/lake/2024/report.xlsx", &hash, 2, 1),
            catalog_row("/lake/2025/report.xlsx", &hash, 4, 9),
            catalog_row("/lake/other/report.xlsx", &other, 7, 20),
        ];

        assert_eq!(catalog_header_row(&catalog, &hash, "report.xlsx"), Some(4));
        assert_eq!(catalog_header_row(&catalog, &hash, "missing.xlsx"), None);
    }

    #[test]
    fn test_rows_to_table_skips_preamble_and_blank_rows() {
        let rows = vec![
            strings(&["Visits export"]),
            strings(&["Client Name", "", "Hours"]),
            strings(&["alice", "x", "3"]),
            strings(&["", "", ""]),
            strings(&["bob", "", "4", "extra"]),
        ];
        let table = rows_to_table(rows, 1, &AliasTable::new());

        assert_eq!(
            table.headers,
            vec!["client_name", "unnamed_2", "hours", "unnamed_4"]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get(1, 3), Some("extra"));
    }

    #[test]
    fn test_rows_to_table_header_past_end() {
        let table = rows_to_table(vec![strings(&["a"])], 5, &AliasTable::new());
        assert_eq!(table, DataTable::default());
    }
}
