//! Recursive discovery of candidate files in the lake.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SheetlakeError};

/// A file found by the scanner. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: DateTime<Utc>,
}

/// Normalize an extension allow-list to lower-case entries with a leading dot.
pub fn normalize_extensions(extensions: &[String]) -> HashSet<String> {
    extensions
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(|e| {
            let lower = e.to_lowercase();
            if lower.starts_with('.') {
                lower
            } else {
                format!(".{}", lower)
            }
        })
        .collect()
}

/// Recursively scan `root` for files whose extension is in the allow-list.
///
/// Returns files sorted by lower-cased path. Entries whose metadata cannot be
/// read are skipped.
pub fn scan_files(root: impl AsRef<Path>, extensions: &[String]) -> Result<Vec<DiscoveredFile>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(SheetlakeError::Config(format!(
            "input_root not found or not a directory: {}",
            root.display()
        )));
    }

    let allowed = normalize_extensions(extensions);
    let mut files = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !allowed.contains(&format!(".{}", ext.to_lowercase())) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping file without metadata");
                continue;
            }
        };

        let mtime = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH));

        files.push(DiscoveredFile {
            path: path.to_path_buf(),
            size: metadata.len(),
            mtime,
        });
    }

    files.sort_by_key(|f| f.path.to_string_lossy().to_lowercase());
    Ok(files)
}
