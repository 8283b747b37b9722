//! End-to-end tests for classification runs against a scratch lake.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

use sheetlake::catalog::{read_catalog, read_manifest, read_schema_registry};
use sheetlake::config::HeaderDetectionSettings;
use sheetlake::{
    CopyStatus, FileStatus, LakeConfig, SchemaHash, SchemaIdentity, Sheetlake, SheetlakeError,
    UNKNOWN_SCHEMA_LABEL,
};

/// Write a file, creating parent directories.
fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A lake with two reordered copies of one schema and one header-only file.
fn create_lake(root: &Path) {
    write(&root.join("lake/a.csv"), "Name,Amount\nalice,10\nbob,20\n");
    write(&root.join("lake/sub/b.csv"), "amount,NAME\n5,carol\n7,dave\n");
    write(&root.join("lake/c.csv"), "ID\n");
}

fn config(root: &Path) -> LakeConfig {
    LakeConfig {
        input_root: root.join("lake"),
        output_root: root.join("out"),
        aliases_path: root.join("config/header_aliases.yaml"),
        labels_path: root.join("config/schema_labels.yaml"),
        header_detection: HeaderDetectionSettings {
            min_header_confidence: 0.95,
        },
        ..LakeConfig::default()
    }
}

fn amount_name_hash() -> SchemaHash {
    SchemaIdentity::from_headers(&["amount", "name"]).hash
}

/// Relative path -> contents for every file under `dir`.
fn snapshot(dir: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap().to_path_buf();
            (rel, fs::read_to_string(e.path()).unwrap())
        })
        .collect()
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn test_end_to_end_classification() {
    let dir = TempDir::new().unwrap();
    create_lake(dir.path());

    let lake = Sheetlake::new(config(dir.path())).unwrap();
    let summary = lake.classify().unwrap();

    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.status_counts.ok, 2);
    assert_eq!(summary.status_counts.low_confidence, 1);
    assert_eq!(summary.distinct_schemas, 1);
    assert_eq!(summary.unknown_schemas, vec![amount_name_hash()]);

    let catalog = read_catalog(&summary.artifacts.catalog).unwrap();
    assert_eq!(catalog.len(), 3);
    let ok: Vec<_> = catalog.iter().filter(|r| r.status == FileStatus::Ok).collect();
    assert_eq!(ok.len(), 2);
    assert_eq!(ok[0].schema_hash, Some(amount_name_hash()));
    assert_eq!(ok[0].schema_hash, ok[1].schema_hash);
    assert_eq!(ok[0].label.as_deref(), Some(UNKNOWN_SCHEMA_LABEL));

    let low = catalog
        .iter()
        .find(|r| r.status == FileStatus::LowConfidence)
        .unwrap();
    assert!(low.path.ends_with("c.csv"));
    assert!(low.header_row_index.is_none());
    assert!(low.header_confidence < 0.95);

    let registry = read_schema_registry(&summary.artifacts.schema_registry).unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry[0].file_count, 2);
    assert_eq!(registry[0].canonical_headers, vec!["amount", "name"]);
    assert_eq!(Some(&registry[0].schema_id), ok[0].schema_id.as_ref());
}

#[test]
fn test_files_routed_to_snapshot_and_quarantine() {
    let dir = TempDir::new().unwrap();
    create_lake(dir.path());

    let lake = Sheetlake::new(config(dir.path())).unwrap();
    let summary = lake.classify().unwrap();
    assert_eq!(summary.copy_counts.copied, 3);

    let hash = amount_name_hash();
    let label_dir = dir.path().join("out/classified").join(UNKNOWN_SCHEMA_LABEL);
    assert!(label_dir.join(format!("{}__a.csv", hash)).is_file());
    assert!(label_dir.join(format!("{}__b.csv", hash)).is_file());
    assert!(dir.path().join("out/quarantine/c.csv").is_file());

    let manifest = read_manifest(&summary.artifacts.manifest).unwrap();
    assert_eq!(manifest.len(), 3);
    assert!(manifest.iter().all(|r| r.copy_status == CopyStatus::Copied));
    assert!(manifest.iter().all(|r| r.dst_path.is_some()));
}

#[test]
fn test_curated_label_used_as_directory() {
    let dir = TempDir::new().unwrap();
    create_lake(dir.path());
    write(
        &dir.path().join("config/schema_labels.yaml"),
        &format!("'{}': payments\n", amount_name_hash()),
    );

    let lake = Sheetlake::new(config(dir.path())).unwrap();
    let summary = lake.classify().unwrap();

    assert!(summary.unknown_schemas.is_empty());
    assert!(dir.path().join("out/classified/payments").is_dir());
    assert!(!dir.path().join("out/classified").join(UNKNOWN_SCHEMA_LABEL).exists());
}

#[test]
fn test_alias_merges_schemas() {
    let dir = TempDir::new().unwrap();
    create_lake(dir.path());
    write(
        &dir.path().join("lake/d.csv"),
        "Customer Name,Amt\nerin,1\nfrank,2\n",
    );
    write(
        &dir.path().join("config/header_aliases.yaml"),
        "customer_name: name\namt: amount\n",
    );

    let lake = Sheetlake::new(config(dir.path())).unwrap();
    let summary = lake.classify().unwrap();

    assert_eq!(summary.status_counts.ok, 3);
    assert_eq!(summary.distinct_schemas, 1);
}

// =============================================================================
// Snapshot semantics
// =============================================================================

#[test]
fn test_snapshot_is_idempotent() {
    let dir = TempDir::new().unwrap();
    create_lake(dir.path());
    let lake = Sheetlake::new(config(dir.path())).unwrap();
    let classified = dir.path().join("out/classified");

    lake.classify().unwrap();
    let first = snapshot(&classified);
    lake.classify().unwrap();
    let second = snapshot(&classified);

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[test]
fn test_touched_label_drops_stale_entries() {
    let dir = TempDir::new().unwrap();
    create_lake(dir.path());
    let lake = Sheetlake::new(config(dir.path())).unwrap();
    let label_dir = dir.path().join("out/classified").join(UNKNOWN_SCHEMA_LABEL);

    lake.classify().unwrap();
    assert_eq!(snapshot(&label_dir).len(), 2);

    fs::remove_file(dir.path().join("lake/sub/b.csv")).unwrap();
    lake.classify().unwrap();

    let after = snapshot(&label_dir);
    assert_eq!(after.len(), 1);
    assert!(after.contains_key(Path::new(&format!("{}__a.csv", amount_name_hash()))));
}

#[test]
fn test_untouched_label_keeps_prior_snapshot() {
    let dir = TempDir::new().unwrap();
    create_lake(dir.path());
    let old = dir.path().join("out/classified/archived/old.csv");
    write(&old, "x\n1\n");

    Sheetlake::new(config(dir.path())).unwrap().classify().unwrap();

    assert!(old.is_file());
}

#[test]
fn test_quarantine_is_not_wiped() {
    let dir = TempDir::new().unwrap();
    create_lake(dir.path());
    let earlier = dir.path().join("out/quarantine/earlier.csv");
    write(&earlier, "?\n");

    Sheetlake::new(config(dir.path())).unwrap().classify().unwrap();

    assert!(earlier.is_file());
}

#[test]
fn test_dry_run_copies_nothing() {
    let dir = TempDir::new().unwrap();
    create_lake(dir.path());
    let mut cfg = config(dir.path());
    cfg.copy.dry_run = true;

    let summary = Sheetlake::new(cfg).unwrap().classify().unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.copy_counts.skipped_dry_run, 3);
    assert!(!dir.path().join("out/classified").exists());
    assert!(summary.artifacts.catalog.is_file());

    let manifest = read_manifest(&summary.artifacts.manifest).unwrap();
    assert!(manifest.iter().all(|r| r.dst_path.is_none()));
    assert!(manifest
        .iter()
        .all(|r| r.copy_status == CopyStatus::SkippedDryRun));
}

// =============================================================================
// Fatal configuration errors
// =============================================================================

#[test]
fn test_malformed_alias_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    create_lake(dir.path());
    write(&dir.path().join("config/header_aliases.yaml"), "- a\n- b\n");

    let err = Sheetlake::new(config(dir.path())).unwrap_err();
    assert!(matches!(err, SheetlakeError::Config(_)));
}

#[test]
fn test_missing_input_root_is_fatal() {
    let dir = TempDir::new().unwrap();
    let lake = Sheetlake::new(config(dir.path())).unwrap();

    let err = lake.classify().unwrap_err();
    assert!(matches!(err, SheetlakeError::Config(_)));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_unreadable_file_recorded() {
    let dir = TempDir::new().unwrap();
    create_lake(dir.path());
    write(&dir.path().join("lake/broken.xlsx"), "not a zip archive");

    let summary = Sheetlake::new(config(dir.path())).unwrap().classify().unwrap();

    assert_eq!(summary.status_counts.unreadable, 1);
    let catalog = read_catalog(&summary.artifacts.catalog).unwrap();
    let broken = catalog
        .iter()
        .find(|r| r.status == FileStatus::Unreadable)
        .unwrap();
    assert!(broken.error_message.is_some());
    assert!(dir.path().join("out/quarantine/broken.xlsx").is_file());
}
