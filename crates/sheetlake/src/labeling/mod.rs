//! Schema labels: curated registry lookups and unknown-schema reporting.

mod registry;
mod unknown;

pub use registry::{LabelRegistry, UNKNOWN_SCHEMA_LABEL};
pub use unknown::UnknownSchemas;
