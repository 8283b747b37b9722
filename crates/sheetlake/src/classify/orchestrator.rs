//! Per-file classification and run-level aggregation.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogRow, FileStatus, SchemaRegistryRow};
use crate::error::Result;
use crate::fingerprint::{
    assign_schema_ids, detect_header_row, normalize_headers, AliasTable, HeaderDetection,
    NormalizedHeaders, SchemaHash, SchemaIdentity,
};
use crate::input::{DiscoveredFile, FilePreviewer, PreviewSource};
use crate::labeling::{LabelRegistry, UnknownSchemas};

/// Detection knobs for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierSettings {
    /// Rows previewed per file.
    pub header_search_rows: usize,
    /// Confidence floor for accepting a header row.
    pub min_header_confidence: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            header_search_rows: 200,
            min_header_confidence: 0.60,
        }
    }
}

/// Everything learned about one readable file.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub sheet_name: String,
    pub preview_rows: usize,
    pub detection: HeaderDetection,
    /// Present when a header row was accepted.
    pub headers: Option<NormalizedHeaders>,
    /// Present when the accepted header row has at least one usable name.
    pub identity: Option<SchemaIdentity>,
    pub label: Option<String>,
}

impl Inspection {
    pub fn status(&self) -> FileStatus {
        if self.identity.is_some() {
            FileStatus::Ok
        } else {
            FileStatus::LowConfidence
        }
    }
}

/// Per-status file counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub ok: usize,
    pub unreadable: usize,
    pub low_confidence: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: FileStatus) {
        match status {
            FileStatus::Ok => self.ok += 1,
            FileStatus::Unreadable => self.unreadable += 1,
            FileStatus::LowConfidence => self.low_confidence += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.unreadable + self.low_confidence
    }
}

/// Output of classifying a file set.
#[derive(Debug, Clone)]
pub struct Classification {
    pub run_ts: String,
    /// One row per input file, in input order.
    pub catalog: Vec<CatalogRow>,
    /// One row per distinct schema, ordered by schema id.
    pub schema_registry: Vec<SchemaRegistryRow>,
    /// Unlabeled schema hashes, once each, in first-seen order.
    pub unknown_schemas: Vec<SchemaHash>,
    pub status_counts: StatusCounts,
}

/// Turns discovered files into catalog rows.
///
/// Alias and label tables are injected and never mutated.
pub struct Classifier<P: PreviewSource = FilePreviewer> {
    previewer: P,
    aliases: AliasTable,
    labels: LabelRegistry,
    settings: ClassifierSettings,
}

impl Classifier<FilePreviewer> {
    /// A classifier reading from the filesystem.
    pub fn with_file_previewer(
        aliases: AliasTable,
        labels: LabelRegistry,
        settings: ClassifierSettings,
    ) -> Self {
        Self::new(FilePreviewer::new(), aliases, labels, settings)
    }
}

impl<P: PreviewSource> Classifier<P> {
    pub fn new(
        previewer: P,
        aliases: AliasTable,
        labels: LabelRegistry,
        settings: ClassifierSettings,
    ) -> Self {
        Self {
            previewer,
            aliases,
            labels,
            settings,
        }
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    /// Preview, detect, normalize and label one file.
    ///
    /// An `Err` means the preview failed and the file is unreadable.
    pub fn inspect(&self, path: &Path) -> Result<Inspection> {
        let preview = self
            .previewer
            .preview(path, self.settings.header_search_rows)?;
        let detection = detect_header_row(&preview.rows, self.settings.min_header_confidence);

        let headers = detection
            .is_confident()
            .then(|| normalize_headers(&detection.raw_headers, &self.aliases));
        let identity = headers
            .as_ref()
            .filter(|h| !h.normalized_headers.is_empty())
            .map(|h| SchemaIdentity::from_headers(&h.normalized_headers));
        let label = identity
            .as_ref()
            .map(|id| self.labels.label_for(&id.hash).to_string());

        Ok(Inspection {
            sheet_name: preview.sheet_name,
            preview_rows: preview.rows.len(),
            detection,
            headers,
            identity,
            label,
        })
    }

    /// Classify every file and aggregate the run tables.
    ///
    /// Per-file failures are recorded in the catalog; this never fails.
    pub fn classify(&self, files: &[DiscoveredFile], run_ts: &str) -> Classification {
        info!(files = files.len(), "classifying files");

        let outcomes: Vec<(CatalogRow, Option<SchemaIdentity>)> = files
            .iter()
            .map(|file| self.classify_file(file, run_ts))
            .collect();

        let ids = assign_schema_ids(outcomes.iter().filter_map(|(_, identity)| identity.as_ref()));

        let mut status_counts = StatusCounts::default();
        let mut unknown = UnknownSchemas::new();
        let mut catalog = Vec::with_capacity(outcomes.len());

        for (mut row, identity) in outcomes {
            status_counts.record(row.status);
            if let Some(identity) = identity {
                row.schema_id = ids.get(&identity.key).cloned();
                if !self.labels.contains(&identity.hash) {
                    unknown.record(&identity.hash, &identity.key);
                }
            }
            catalog.push(row);
        }

        let schema_registry = SchemaRegistryRow::aggregate(run_ts, &catalog);
        info!(
            files = status_counts.total(),
            ok = status_counts.ok,
            unreadable = status_counts.unreadable,
            low_confidence = status_counts.low_confidence,
            schemas = schema_registry.len(),
            unknown_schemas = unknown.len(),
            "classification complete"
        );

        Classification {
            run_ts: run_ts.to_string(),
            catalog,
            schema_registry,
            unknown_schemas: unknown.into_vec(),
            status_counts,
        }
    }

    fn classify_file(
        &self,
        file: &DiscoveredFile,
        run_ts: &str,
    ) -> (CatalogRow, Option<SchemaIdentity>) {
        let mut row = CatalogRow {
            run_ts: run_ts.to_string(),
            path: file.path.clone(),
            size: file.size,
            mtime: file.mtime,
            sheet_name: None,
            status: FileStatus::Unreadable,
            error_message: None,
            header_row_index: None,
            header_confidence: 0.0,
            raw_headers: Vec::new(),
            normalized_headers: Vec::new(),
            schema_key: None,
            schema_hash: None,
            schema_id: None,
            label: None,
        };

        let inspection = match self.inspect(&file.path) {
            Ok(inspection) => inspection,
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "unreadable file");
                row.error_message = Some(e.to_string());
                return (row, None);
            }
        };

        let detection = &inspection.detection;
        debug!(
            path = %file.path.display(),
            header_row_index = ?detection.header_row_index,
            confidence = detection.confidence,
            density = detection.breakdown.nonempty_density,
            text = detection.breakdown.text_ratio,
            short = detection.breakdown.short_ratio,
            unique = detection.breakdown.unique_ratio,
            follow = detection.breakdown.follow_score,
            "header detection"
        );

        row.sheet_name = Some(inspection.sheet_name.clone());
        row.header_confidence = detection.confidence;
        row.raw_headers = detection.raw_headers.clone();
        row.status = inspection.status();

        let (Some(headers), Some(identity)) = (inspection.headers, inspection.identity) else {
            let reason = match detection.header_row_index {
                Some(idx) => format!("header row {} has no usable column names", idx),
                None => format!(
                    "header confidence {:.3} below {:.3}",
                    detection.confidence, self.settings.min_header_confidence
                ),
            };
            warn!(path = %file.path.display(), reason = %reason, "low confidence header");
            row.error_message = Some(reason);
            return (row, None);
        };

        row.header_row_index = detection.header_row_index;
        row.normalized_headers = headers.normalized_headers;
        row.schema_key = Some(identity.key.clone());
        row.schema_hash = Some(identity.hash.clone());
        row.label = inspection.label;
        (row, Some(identity))
    }
}
