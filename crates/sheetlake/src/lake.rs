//! Run-level entry points: classify a lake, process classified schemas.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::catalog::{
    read_catalog, write_catalog, write_manifest, write_schema_registry, ArtifactPaths, CopyStatus,
    ManifestRow,
};
use crate::classify::{Classifier, ClassifierSettings, Inspection, SnapshotMaterializer, StatusCounts};
use crate::config::LakeConfig;
use crate::consolidate::{build_transforms, Consolidator, ProcessSummary, ProcessedRunner};
use crate::error::{Result, SheetlakeError};
use crate::fingerprint::{AliasTable, SchemaHash};
use crate::input::scan_files;
use crate::labeling::LabelRegistry;

/// Per-copy-status counts from the manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CopyCounts {
    pub copied: usize,
    pub skipped_exists: usize,
    pub error: usize,
    pub skipped_dry_run: usize,
}

impl CopyCounts {
    pub fn from_manifest(manifest: &[ManifestRow]) -> Self {
        let mut counts = Self::default();
        for row in manifest {
            match row.copy_status {
                CopyStatus::Copied => counts.copied += 1,
                CopyStatus::SkippedExists => counts.skipped_exists += 1,
                CopyStatus::Error => counts.error += 1,
                CopyStatus::SkippedDryRun => counts.skipped_dry_run += 1,
            }
        }
        counts
    }
}

/// What a classification run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_ts: String,
    pub dry_run: bool,
    pub total_files: usize,
    pub distinct_schemas: usize,
    pub status_counts: StatusCounts,
    pub copy_counts: CopyCounts,
    /// Unlabeled hashes, once each, in first-seen order.
    pub unknown_schemas: Vec<SchemaHash>,
    #[serde(skip)]
    pub artifacts: ArtifactPaths,
}

/// A configured lake with its alias and label tables loaded.
#[derive(Debug, Clone)]
pub struct Sheetlake {
    config: LakeConfig,
    aliases: AliasTable,
    labels: LabelRegistry,
}

impl Sheetlake {
    /// Validate the configuration and load the alias and label tables.
    /// Any failure here is fatal for the run.
    pub fn new(config: LakeConfig) -> Result<Self> {
        config.validate()?;
        let aliases = AliasTable::load(&config.aliases_path)?;
        let labels = LabelRegistry::load(&config.labels_path)?;
        info!(aliases = aliases.len(), labels = labels.len(), "lookup tables loaded");
        Ok(Self::from_parts(config, aliases, labels))
    }

    /// Build from already loaded tables.
    pub fn from_parts(config: LakeConfig, aliases: AliasTable, labels: LabelRegistry) -> Self {
        Self {
            config,
            aliases,
            labels,
        }
    }

    pub fn config(&self) -> &LakeConfig {
        &self.config
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(self.config.staging_dir())
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::with_file_previewer(
            self.aliases.clone(),
            self.labels.clone(),
            ClassifierSettings {
                header_search_rows: self.config.excel.header_search_rows,
                min_header_confidence: self.config.header_detection.min_header_confidence,
            },
        )
    }

    pub fn materializer(&self) -> SnapshotMaterializer {
        SnapshotMaterializer::new(
            self.config.classified_dir(),
            self.config.quarantine_dir(),
            self.config.copy.overwrite,
        )
    }

    /// Scan, classify, write the run tables and materialize the snapshot.
    pub fn classify(&self) -> Result<RunSummary> {
        let run_ts = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let dry_run = self.config.copy.dry_run;
        info!(
            input_root = %self.config.input_root.display(),
            run_ts = %run_ts,
            dry_run,
            "starting classification run"
        );

        let files = scan_files(&self.config.input_root, &self.config.extensions)?;
        let classification = self.classifier().classify(&files, &run_ts);

        let artifacts = self.artifact_paths();
        write_catalog(&artifacts.catalog, &classification.catalog)?;
        write_schema_registry(&artifacts.schema_registry, &classification.schema_registry)?;

        let manifest = self
            .materializer()
            .materialize(&classification.catalog, &run_ts, dry_run)?;
        write_manifest(&artifacts.manifest, &manifest)?;

        let summary = RunSummary {
            run_ts,
            dry_run,
            total_files: classification.catalog.len(),
            distinct_schemas: classification.schema_registry.len(),
            status_counts: classification.status_counts,
            copy_counts: CopyCounts::from_manifest(&manifest),
            unknown_schemas: classification.unknown_schemas,
            artifacts,
        };
        info!(
            files = summary.total_files,
            schemas = summary.distinct_schemas,
            copied = summary.copy_counts.copied,
            copy_errors = summary.copy_counts.error,
            "classification run complete"
        );
        Ok(summary)
    }

    /// Consolidate every labeled schema from the last catalog into
    /// `processed/`.
    pub fn process(&self) -> Result<ProcessSummary> {
        let catalog_path = self.artifact_paths().catalog;
        if !catalog_path.is_file() {
            return Err(SheetlakeError::Config(format!(
                "catalog not found at {}; run classify first",
                catalog_path.display()
            )));
        }

        let catalog = read_catalog(&catalog_path)?;
        let transforms = build_transforms(&self.config.transforms)?;
        let consolidator = Consolidator::new(
            self.config.classified_dir(),
            catalog,
            self.aliases.clone(),
        );

        Ok(ProcessedRunner::new(consolidator, transforms, self.config.processed_dir()).run())
    }

    /// Header detection details for one file.
    pub fn inspect(&self, path: impl AsRef<Path>) -> Result<Inspection> {
        self.classifier().inspect(path.as_ref())
    }
}
