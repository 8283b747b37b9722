//! Writes one processed table per labeled schema.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use super::consolidator::Consolidator;
use super::transform::TableTransform;
use crate::catalog::CatalogRow;
use crate::error::{Result, SheetlakeError};
use crate::fingerprint::SchemaHash;
use crate::input::DataTable;
use crate::labeling::UNKNOWN_SCHEMA_LABEL;

/// One schema to consolidate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkItem {
    pub label: String,
    pub schema_hash: SchemaHash,
}

/// Distinct labeled `(label, schema_hash)` pairs among `ok` rows, sorted by
/// label then hash. Unknown schemas are left out.
pub fn work_list(catalog: &[CatalogRow]) -> Vec<WorkItem> {
    catalog
        .iter()
        .filter(|row| row.is_ok())
        .filter_map(|row| {
            let label = row.label.as_deref()?;
            if label.is_empty() || label == UNKNOWN_SCHEMA_LABEL {
                return None;
            }
            Some(WorkItem {
                label: label.to_string(),
                schema_hash: row.schema_hash.clone()?,
            })
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Counters for a processing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessSummary {
    pub wrote: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outputs: Vec<PathBuf>,
}

/// Consolidates, transforms and writes every labeled schema.
pub struct ProcessedRunner {
    consolidator: Consolidator,
    transforms: Vec<Box<dyn TableTransform>>,
    processed_dir: PathBuf,
}

impl ProcessedRunner {
    pub fn new(
        consolidator: Consolidator,
        transforms: Vec<Box<dyn TableTransform>>,
        processed_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            consolidator,
            transforms,
            processed_dir: processed_dir.into(),
        }
    }

    /// Output path for a schema.
    pub fn output_path(&self, item: &WorkItem) -> PathBuf {
        self.processed_dir
            .join(format!("{}__{}.csv", item.label, item.schema_hash))
    }

    /// Process every work item. A missing schema is skipped; any other
    /// failure counts as failed. Neither stops the run.
    pub fn run(&self) -> ProcessSummary {
        let work = work_list(self.consolidator.catalog());
        let mut summary = ProcessSummary::default();

        if work.is_empty() {
            info!("no labeled schemas to process");
            return summary;
        }

        for item in &work {
            match self.process_item(item) {
                Ok((path, rows)) => {
                    info!(label = %item.label, schema_hash = %item.schema_hash, rows, path = %path.display(), "wrote processed table");
                    summary.wrote += 1;
                    summary.outputs.push(path);
                }
                Err(e @ SheetlakeError::NotFound { .. }) => {
                    warn!(label = %item.label, schema_hash = %item.schema_hash, reason = %e, "skipped schema");
                    summary.skipped += 1;
                }
                Err(e) => {
                    warn!(label = %item.label, schema_hash = %item.schema_hash, error = %e, "failed schema");
                    summary.failed += 1;
                }
            }
        }

        info!(
            wrote = summary.wrote,
            skipped = summary.skipped,
            failed = summary.failed,
            "processing complete"
        );
        summary
    }

    fn process_item(&self, item: &WorkItem) -> Result<(PathBuf, usize)> {
        let table = self
            .consolidator
            .consolidate(&item.label, &item.schema_hash)?;
        let table = self.apply_transforms(&item.label, table)?;

        let path = self.output_path(item);
        table.write_csv(&path)?;
        Ok((path, table.row_count()))
    }

    fn apply_transforms(&self, label: &str, mut table: DataTable) -> Result<DataTable> {
        for transform in self.transforms.iter().filter(|t| t.applies_to(label)) {
            table = transform.apply(label, table)?;
        }
        Ok(table)
    }
}
