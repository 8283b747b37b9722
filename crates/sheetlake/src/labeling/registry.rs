//! Curated `schema_hash -> label` registry.

use std::collections::HashMap;
use std::path::Path;

use crate::config::{load_string_mapping, MappingKeys};
use crate::error::{Result, SheetlakeError};
use crate::fingerprint::SchemaHash;

/// Label given to schemas absent from the registry.
pub const UNKNOWN_SCHEMA_LABEL: &str = "unknown_schema";

/// Read-only mapping from durable schema hashes to labels.
///
/// The engine never writes this; new hashes are reported for an operator to
/// curate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelRegistry {
    labels: HashMap<SchemaHash, String>,
}

impl LabelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(hash, label)` pairs. Hashes are trimmed and lower-cased,
    /// labels trimmed. Entries with a blank side are dropped.
    ///
    /// Labels become directory names, so a label containing a path separator
    /// or equal to `.`/`..` is rejected.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut labels = HashMap::new();
        for (hash, label) in pairs {
            let hash = SchemaHash::new(hash);
            let label = label.as_ref().trim();
            if hash.as_str().is_empty() || label.is_empty() {
                continue;
            }
            validate_label(label)?;
            labels.insert(hash, label.to_string());
        }
        Ok(Self { labels })
    }

    /// Load from a YAML mapping; a missing file is an empty registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let pairs = load_string_mapping(path.as_ref(), "schema labels", MappingKeys::String)?;
        Self::from_pairs(pairs)
    }

    /// The label for a hash, or [`UNKNOWN_SCHEMA_LABEL`].
    pub fn label_for(&self, hash: &SchemaHash) -> &str {
        self.labels
            .get(hash)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SCHEMA_LABEL)
    }

    pub fn contains(&self, hash: &SchemaHash) -> bool {
        self.labels.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn validate_label(label: &str) -> Result<()> {
    if label == "." || label == ".." || label.contains('/') || label.contains('\\') {
        return Err(SheetlakeError::Config(format!(
            "label '{}' is not a valid directory name",
            label
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_label_lookup_and_default() {
        let registry = LabelRegistry::from_pairs([(" ABCDEF123456 ", " visits ")]).unwrap();
        assert_eq!(registry.label_for(&SchemaHash::new("abcdef123456")), "visits");
        assert_eq!(
            registry.label_for(&SchemaHash::new("000000000000")),
            UNKNOWN_SCHEMA_LABEL
        );
    }

    #[test]
    fn test_blank_entries_dropped() {
        let registry = LabelRegistry::from_pairs([("", "x"), ("abc", "  ")]).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rejects_path_like_labels() {
        for bad in ["a/b", "..", "c\\d"] {
            let err = LabelRegistry::from_pairs([("abc", bad)]).unwrap_err();
            assert!(matches!(err, SheetlakeError::Config(_)), "{bad}");
        }
    }

    #[test]
    fn test_load_from_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ab12cd34ef56: payroll\n0123456789ab: visits").unwrap();
        let registry = LabelRegistry::load(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&SchemaHash::new("AB12CD34EF56")));
    }

    #[test]
    fn test_unquoted_numeric_hash_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "123456789012: visits").unwrap();
        let err = LabelRegistry::load(file.path()).unwrap_err();
        assert!(matches!(err, SheetlakeError::Config(_)));
    }

    #[test]
    fn test_quoted_numeric_hash_loads() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "'123456789012': visits").unwrap();
        let registry = LabelRegistry::load(file.path()).unwrap();
        assert_eq!(registry.label_for(&SchemaHash::new("123456789012")), "visits");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let registry = LabelRegistry::load("/definitely/not/here.yaml").unwrap();
        assert!(registry.is_empty());
    }
}
