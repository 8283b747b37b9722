//! Row types of the three run tables.
//!
//! Column names and order are the compatibility contract with downstream
//! readers; field order below is the column order on disk.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::fingerprint::{SchemaHash, SchemaId, SchemaKey};

/// Maximum exemplar paths kept per schema.
pub const MAX_EXAMPLE_FILES: usize = 5;

/// Outcome of previewing and detecting one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Ok,
    /// The preview could not be read.
    Unreadable,
    /// No header row cleared the confidence floor.
    LowConfidence,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Ok => "ok",
            FileStatus::Unreadable => "unreadable",
            FileStatus::LowConfidence => "low_confidence",
        }
    }
}

/// Outcome of copying one file into the snapshot or quarantine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStatus {
    Copied,
    SkippedExists,
    Error,
    SkippedDryRun,
}

impl CopyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Copied => "copied",
            CopyStatus::SkippedExists => "skipped_exists",
            CopyStatus::Error => "error",
            CopyStatus::SkippedDryRun => "skipped_dry_run",
        }
    }
}

/// One row per discovered file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub run_ts: String,
    pub path: PathBuf,
    pub size: u64,
    pub mtime: DateTime<Utc>,
    pub sheet_name: Option<String>,
    pub status: FileStatus,
    pub error_message: Option<String>,
    pub header_row_index: Option<usize>,
    pub header_confidence: f64,
    #[serde(serialize_with = "to_json_list", deserialize_with = "from_json_list")]
    pub raw_headers: Vec<String>,
    #[serde(serialize_with = "to_json_list", deserialize_with = "from_json_list")]
    pub normalized_headers: Vec<String>,
    pub schema_key: Option<SchemaKey>,
    pub schema_hash: Option<SchemaHash>,
    pub schema_id: Option<SchemaId>,
    pub label: Option<String>,
}

impl CatalogRow {
    pub fn is_ok(&self) -> bool {
        self.status == FileStatus::Ok
    }

    /// Final path component of the source file.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// One row per distinct schema seen in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistryRow {
    pub run_ts: String,
    pub schema_id: SchemaId,
    pub schema_key: SchemaKey,
    pub schema_hash: SchemaHash,
    #[serde(serialize_with = "to_json_list", deserialize_with = "from_json_list")]
    pub canonical_headers: Vec<String>,
    pub file_count: usize,
    #[serde(serialize_with = "to_json_list", deserialize_with = "from_json_list")]
    pub example_files: Vec<String>,
}

impl SchemaRegistryRow {
    /// Aggregate the `ok` catalog rows by schema, ordered by schema id.
    ///
    /// Exemplars are the first [`MAX_EXAMPLE_FILES`] paths in catalog order.
    pub fn aggregate(run_ts: &str, catalog: &[CatalogRow]) -> Vec<SchemaRegistryRow> {
        let mut by_id: BTreeMap<&SchemaId, SchemaRegistryRow> = BTreeMap::new();

        for row in catalog.iter().filter(|r| r.is_ok()) {
            let (Some(id), Some(key), Some(hash)) = (&row.schema_id, &row.schema_key, &row.schema_hash)
            else {
                continue;
            };
            let entry = by_id.entry(id).or_insert_with(|| SchemaRegistryRow {
                run_ts: run_ts.to_string(),
                schema_id: id.clone(),
                schema_key: key.clone(),
                schema_hash: hash.clone(),
                canonical_headers: key.tokens(),
                file_count: 0,
                example_files: Vec::new(),
            });
            entry.file_count += 1;
            if entry.example_files.len() < MAX_EXAMPLE_FILES {
                entry.example_files.push(row.path.display().to_string());
            }
        }

        by_id.into_values().collect()
    }
}

/// One row per file per run, recording where it was copied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRow {
    pub run_ts: String,
    pub src_path: PathBuf,
    /// Empty for dry runs.
    pub dst_path: Option<PathBuf>,
    pub src_status: FileStatus,
    pub copy_status: CopyStatus,
    pub error_message: Option<String>,
    pub schema_id: Option<SchemaId>,
    pub schema_key: Option<SchemaKey>,
    pub schema_hash: Option<SchemaHash>,
    pub label: Option<String>,
}

fn to_json_list<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    let encoded = serde_json::to_string(values).map_err(S::Error::custom)?;
    serializer.serialize_str(&encoded)
}

fn from_json_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    if encoded.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&encoded).map_err(D::Error::custom)
}
