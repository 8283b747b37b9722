//! Collects schema hashes that still need a curated label.

use indexmap::IndexSet;
use tracing::warn;

use crate::fingerprint::{SchemaHash, SchemaKey};

/// Distinct unlabeled schemas, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct UnknownSchemas {
    seen: IndexSet<SchemaHash>,
}

impl UnknownSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an unlabeled hash. Returns `true` and logs only the first time
    /// a given hash is seen.
    pub fn record(&mut self, hash: &SchemaHash, key: &SchemaKey) -> bool {
        if !self.seen.insert(hash.clone()) {
            return false;
        }
        warn!(schema_hash = %hash, schema_key = %key, "unknown schema, add it to the label registry");
        true
    }

    pub fn hashes(&self) -> impl Iterator<Item = &SchemaHash> {
        self.seen.iter()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn into_vec(self) -> Vec<SchemaHash> {
        self.seen.into_iter().collect()
    }
}
