//! Consolidation of classified files into per-schema tables.

mod consolidator;
mod runner;
mod transform;

pub use consolidator::{
    catalog_header_row, original_filename, Consolidator, LABEL_COLUMN, SCHEMA_HASH_COLUMN,
    SOURCE_FILE_COLUMN,
};
pub use runner::{work_list, ProcessSummary, ProcessedRunner, WorkItem};
pub use transform::{build_transforms, RegexExtract, TableTransform};
