//! Run tables: the per-file catalog, the schema registry and the
//! classification manifest, plus their CSV persistence.

mod rows;
mod store;

pub use rows::{
    CatalogRow, CopyStatus, FileStatus, ManifestRow, SchemaRegistryRow, MAX_EXAMPLE_FILES,
};
pub use store::{
    read_catalog, read_manifest, read_schema_registry, write_catalog, write_manifest,
    write_schema_registry, ArtifactPaths, CATALOG_COLUMNS, CATALOG_FILE, MANIFEST_COLUMNS,
    MANIFEST_FILE, SCHEMA_REGISTRY_COLUMNS, SCHEMA_REGISTRY_FILE,
};
