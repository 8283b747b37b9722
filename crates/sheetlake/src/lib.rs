//! Sheetlake: schema classification for lakes of spreadsheet exports.
//!
//! Messy workbook and CSV exports rarely agree on where their header row is
//! or what their columns are called. Sheetlake finds the header row of each
//! file, normalizes the column names, fingerprints the resulting column set
//! and sorts files into per-label snapshot directories. Files of the same
//! schema can then be consolidated into one table.
//!
//! # Core Principles
//!
//! - **Order-independent identity**: reordered columns are the same schema
//! - **Durable hashes**: curated labels key on `schema_hash`, never on the
//!   run-scoped `schema_id`
//! - **Nothing dropped silently**: unreadable and ambiguous files go to
//!   quarantine and stay in the catalog
//!
//! # Example
//!
//! ```no_run
//! use sheetlake::{LakeConfig, Sheetlake};
//!
//! let config = LakeConfig::load(None).unwrap();
//! let lake = Sheetlake::new(config).unwrap();
//! let summary = lake.classify().unwrap();
//!
//! println!("Files: {}", summary.total_files);
//! println!("Schemas: {}", summary.distinct_schemas);
//! ```

pub mod catalog;
pub mod classify;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod fingerprint;
pub mod input;
pub mod labeling;

mod lake;

pub use crate::lake::{CopyCounts, RunSummary, Sheetlake};
pub use catalog::{CatalogRow, CopyStatus, FileStatus, ManifestRow, SchemaRegistryRow};
pub use classify::{Classifier, ClassifierSettings, Inspection, SnapshotMaterializer};
pub use config::{ConfigOrigin, ConfigOverrides, LakeConfig};
pub use consolidate::{Consolidator, ProcessSummary};
pub use error::{Result, SheetlakeError};
pub use fingerprint::{AliasTable, SchemaHash, SchemaId, SchemaIdentity, SchemaKey};
pub use input::{DataTable, DiscoveredFile};
pub use labeling::{LabelRegistry, UNKNOWN_SCHEMA_LABEL};
