//! Copies classified files into per-label snapshot directories.
//!
//! Layout:
//!
//! ```text
//! classified/{label}/{schema_hash}__{original_filename}
//! quarantine/{original_filename}
//! ```
//!
//! Each real run wipes and recreates the directory of every label it touches,
//! so a touched label reflects only the current run. Labels not seen this run
//! keep their previous contents. Quarantine is never wiped.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use filetime::{set_file_mtime, FileTime};
use tracing::{info, warn};

use crate::catalog::{CatalogRow, CopyStatus, ManifestRow};
use crate::error::{Result, SheetlakeError};

/// Output of copying one file.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyOutcome {
    pub status: CopyStatus,
    pub error_message: Option<String>,
}

/// Writes the classified snapshot and quarantine.
#[derive(Debug, Clone)]
pub struct SnapshotMaterializer {
    classified_dir: PathBuf,
    quarantine_dir: PathBuf,
    overwrite: bool,
}

impl SnapshotMaterializer {
    pub fn new(
        classified_dir: impl Into<PathBuf>,
        quarantine_dir: impl Into<PathBuf>,
        overwrite: bool,
    ) -> Self {
        Self {
            classified_dir: classified_dir.into(),
            quarantine_dir: quarantine_dir.into(),
            overwrite,
        }
    }

    pub fn classified_dir(&self) -> &Path {
        &self.classified_dir
    }

    pub fn quarantine_dir(&self) -> &Path {
        &self.quarantine_dir
    }

    /// Directory holding a label's snapshot.
    pub fn label_dir(&self, label: &str) -> PathBuf {
        self.classified_dir.join(label)
    }

    /// Labels of this run's `ok` rows.
    pub fn touched_labels(catalog: &[CatalogRow]) -> BTreeSet<String> {
        catalog
            .iter()
            .filter(|row| row.is_ok())
            .filter_map(|row| row.label.clone())
            .collect()
    }

    /// Where a catalog row's file is copied to.
    ///
    /// `None` when the row has no usable file name.
    pub fn destination(&self, row: &CatalogRow) -> Option<PathBuf> {
        let file_name = row.file_name()?;
        if !row.is_ok() {
            return Some(self.quarantine_dir.join(file_name));
        }
        let label = row.label.as_deref()?;
        let hash = row.schema_hash.as_ref()?;
        Some(self.label_dir(label).join(format!("{}__{}", hash, file_name)))
    }

    /// Wipe and recreate each touched label directory, and make sure the
    /// quarantine exists. Failing here aborts the run.
    pub fn prepare(&self, labels: &BTreeSet<String>) -> Result<()> {
        for label in labels {
            let dir = self.label_dir(label);
            if dir.exists() {
                fs::remove_dir_all(&dir).map_err(|e| SheetlakeError::io(&dir, e))?;
            }
            fs::create_dir_all(&dir).map_err(|e| SheetlakeError::io(&dir, e))?;
        }
        fs::create_dir_all(&self.quarantine_dir)
            .map_err(|e| SheetlakeError::io(&self.quarantine_dir, e))?;
        Ok(())
    }

    /// Copy one file, keeping its modification time. Failures are captured
    /// in the outcome rather than returned.
    pub fn copy_file(&self, src: &Path, dst: &Path) -> CopyOutcome {
        if dst.exists() && !self.overwrite {
            return CopyOutcome {
                status: CopyStatus::SkippedExists,
                error_message: None,
            };
        }

        match copy_preserving_mtime(src, dst) {
            Ok(()) => CopyOutcome {
                status: CopyStatus::Copied,
                error_message: None,
            },
            Err(e) => {
                warn!(src = %src.display(), dst = %dst.display(), error = %e, "copy failed");
                CopyOutcome {
                    status: CopyStatus::Error,
                    error_message: Some(e.to_string()),
                }
            }
        }
    }

    /// Produce one manifest row per catalog row.
    ///
    /// Dry runs touch nothing on disk and record `skipped_dry_run` with no
    /// destination. Real runs prepare touched labels first; only that step
    /// can fail.
    pub fn materialize(
        &self,
        catalog: &[CatalogRow],
        run_ts: &str,
        dry_run: bool,
    ) -> Result<Vec<ManifestRow>> {
        if dry_run {
            info!(files = catalog.len(), "dry run, no files copied");
            return Ok(catalog
                .iter()
                .map(|row| manifest_row(row, run_ts, None, CopyStatus::SkippedDryRun, None))
                .collect());
        }

        let labels = Self::touched_labels(catalog);
        self.prepare(&labels)?;
        info!(labels = labels.len(), "snapshot directories reset");

        let manifest = catalog
            .iter()
            .map(|row| match self.destination(row) {
                Some(dst) => {
                    let outcome = self.copy_file(&row.path, &dst);
                    manifest_row(row, run_ts, Some(dst), outcome.status, outcome.error_message)
                }
                None => manifest_row(
                    row,
                    run_ts,
                    None,
                    CopyStatus::Error,
                    Some(format!("no destination for '{}'", row.path.display())),
                ),
            })
            .collect();
        Ok(manifest)
    }
}

fn copy_preserving_mtime(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| SheetlakeError::io(parent, e))?;
    }
    fs::copy(src, dst).map_err(|e| SheetlakeError::io(src, e))?;
    let metadata = fs::metadata(src).map_err(|e| SheetlakeError::io(src, e))?;
    set_file_mtime(dst, FileTime::from_last_modification_time(&metadata))
        .map_err(|e| SheetlakeError::io(dst, e))?;
    Ok(())
}

fn manifest_row(
    row: &CatalogRow,
    run_ts: &str,
    dst_path: Option<PathBuf>,
    copy_status: CopyStatus,
    error_message: Option<String>,
) -> ManifestRow {
    ManifestRow {
        run_ts: run_ts.to_string(),
        src_path: row.path.clone(),
        dst_path,
        src_status: row.status,
        copy_status,
        error_message,
        schema_id: row.schema_id.clone(),
        schema_key: row.schema_key.clone(),
        schema_hash: row.schema_hash.clone(),
        label: row.label.clone(),
    }
}
