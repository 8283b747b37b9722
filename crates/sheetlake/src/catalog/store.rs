//! CSV persistence for run tables.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::rows::{CatalogRow, ManifestRow, SchemaRegistryRow};
use crate::error::{Result, SheetlakeError};

pub const CATALOG_FILE: &str = "file_catalog.csv";
pub const SCHEMA_REGISTRY_FILE: &str = "schema_registry.csv";
pub const MANIFEST_FILE: &str = "classification_manifest.csv";

pub const CATALOG_COLUMNS: &[&str] = &[
    "run_ts",
    "path",
    "size",
    "mtime",
    "sheet_name",
    "status",
    "error_message",
    "header_row_index",
    "header_confidence",
    "raw_headers",
    "normalized_headers",
    "schema_key",
    "schema_hash",
    "schema_id",
    "label",
];

pub const SCHEMA_REGISTRY_COLUMNS: &[&str] = &[
    "run_ts",
    "schema_id",
    "schema_key",
    "schema_hash",
    "canonical_headers",
    "file_count",
    "example_files",
];

pub const MANIFEST_COLUMNS: &[&str] = &[
    "run_ts",
    "src_path",
    "dst_path",
    "src_status",
    "copy_status",
    "error_message",
    "schema_id",
    "schema_key",
    "schema_hash",
    "label",
];

/// Locations of the run tables inside the staging directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub catalog: PathBuf,
    pub schema_registry: PathBuf,
    pub manifest: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(staging_dir: impl AsRef<Path>) -> Self {
        let dir = staging_dir.as_ref();
        Self {
            catalog: dir.join(CATALOG_FILE),
            schema_registry: dir.join(SCHEMA_REGISTRY_FILE),
            manifest: dir.join(MANIFEST_FILE),
        }
    }
}

pub fn write_catalog(path: impl AsRef<Path>, rows: &[CatalogRow]) -> Result<()> {
    write_rows(path.as_ref(), CATALOG_COLUMNS, rows)
}

pub fn read_catalog(path: impl AsRef<Path>) -> Result<Vec<CatalogRow>> {
    read_rows(path.as_ref())
}

pub fn write_schema_registry(path: impl AsRef<Path>, rows: &[SchemaRegistryRow]) -> Result<()> {
    write_rows(path.as_ref(), SCHEMA_REGISTRY_COLUMNS, rows)
}

pub fn read_schema_registry(path: impl AsRef<Path>) -> Result<Vec<SchemaRegistryRow>> {
    read_rows(path.as_ref())
}

pub fn write_manifest(path: impl AsRef<Path>, rows: &[ManifestRow]) -> Result<()> {
    write_rows(path.as_ref(), MANIFEST_COLUMNS, rows)
}

pub fn read_manifest(path: impl AsRef<Path>) -> Result<Vec<ManifestRow>> {
    read_rows(path.as_ref())
}

/// An empty table still gets its header line.
fn write_rows<T: Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SheetlakeError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| SheetlakeError::io(path, e))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    if rows.is_empty() {
        writer.write_record(columns)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| SheetlakeError::io(path, e))?;
    Ok(())
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| SheetlakeError::io(path, e))?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::rows::{CopyStatus, FileStatus};
    use crate::fingerprint::{assign_schema_ids, SchemaIdentity};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_catalog() -> Vec<CatalogRow> {
        let identity = SchemaIdentity::from_headers(&["amount", "name"]);
        let ids = assign_schema_ids([&identity]);
        let mtime = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();
        vec![
            CatalogRow {
                run_ts: "2026-01-01T00:00:00Z".to_string(),
                path: PathBuf::from("/lake/a.csv"),
                size: 42,
                mtime,
                sheet_name: Some("a.csv".to_string()),
                status: FileStatus::Ok,
                error_message: None,
                header_row_index: Some(2),
                header_confidence: 0.875,
                raw_headers: vec!["Name".to_string(), "Amount, USD".to_string()],
                normalized_headers: vec!["name".to_string(), "amount_usd".to_string()],
                schema_key: Some(identity.key.clone()),
                schema_hash: Some(identity.hash.clone()),
                schema_id: Some(ids[&identity.key].clone()),
                label: Some("payments".to_string()),
            },
            CatalogRow {
                run_ts: "2026-01-01T00:00:00Z".to_string(),
                path: PathBuf::from("/lake/broken.xlsx"),
                size: 0,
                mtime,
                sheet_name: None,
                status: FileStatus::Unreadable,
                error_message: Some("Workbook error: bad zip".to_string()),
                header_row_index: None,
                header_confidence: 0.0,
                raw_headers: Vec::new(),
                normalized_headers: Vec::new(),
                schema_key: None,
                schema_hash: None,
                schema_id: None,
                label: None,
            },
        ]
    }

    #[test]
    fn test_catalog_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("staging").join(CATALOG_FILE);
        let rows = sample_catalog();

        write_catalog(&path, &rows).unwrap();
        assert_eq!(read_catalog(&path).unwrap(), rows);
    }

    #[test]
    fn test_header_matches_column_contract() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CATALOG_FILE);
        write_catalog(&path, &sample_catalog()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, CATALOG_COLUMNS);
    }

    #[test]
    fn test_list_columns_are_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CATALOG_FILE);
        write_catalog(&path, &sample_catalog()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let first = reader.records().next().unwrap().unwrap();
        assert_eq!(&first[9], r#"["Name","Amount, USD"]"#);
    }

    #[test]
    fn test_empty_manifest_has_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        write_manifest(&path, &[]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), MANIFEST_COLUMNS.join(","));
        assert!(read_manifest(&path).unwrap().is_empty());
    }

    #[test]
    fn test_manifest_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let rows = vec![ManifestRow {
            run_ts: "ts".to_string(),
            src_path: PathBuf::from("/lake/a.csv"),
            dst_path: None,
            src_status: FileStatus::LowConfidence,
            copy_status: CopyStatus::SkippedDryRun,
            error_message: None,
            schema_id: None,
            schema_key: None,
            schema_hash: None,
            label: None,
        }];
        write_manifest(&path, &rows).unwrap();
        assert_eq!(read_manifest(&path).unwrap(), rows);
    }
}
