//! Order-independent schema identity.
//!
//! Three identifiers exist and are deliberately distinct types:
//! - [`SchemaKey`]: the sorted, de-duplicated token set joined by `|`.
//! - [`SchemaHash`]: a 12-hex-character digest of the key. Durable across
//!   runs; curated labels are keyed by it.
//! - [`SchemaId`]: a run-scoped ordinal such as `schema_003__ab12cd34ef56`.
//!   Only valid within the run that produced it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Separator between tokens in a schema key.
pub const SCHEMA_KEY_SEPARATOR: &str = "|";

/// Hex characters kept from the digest.
pub const SCHEMA_HASH_LEN: usize = 12;

/// Canonical, order-independent description of a header set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaKey(String);

impl SchemaKey {
    /// Build the key for a set of normalized tokens.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let canonical: BTreeSet<&str> = tokens.iter().map(|t| t.as_ref()).collect();
        SchemaKey(canonical.into_iter().collect::<Vec<_>>().join(SCHEMA_KEY_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The sorted tokens the key was built from.
    pub fn tokens(&self) -> Vec<String> {
        if self.0.is_empty() {
            return Vec::new();
        }
        self.0.split(SCHEMA_KEY_SEPARATOR).map(str::to_string).collect()
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable digest of a [`SchemaKey`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaHash(String);

impl SchemaHash {
    /// First [`SCHEMA_HASH_LEN`] hex characters of SHA-256 over the key bytes.
    pub fn of(key: &SchemaKey) -> Self {
        let digest = Sha256::digest(key.as_str().as_bytes());
        let hex = format!("{:x}", digest);
        SchemaHash(hex[..SCHEMA_HASH_LEN].to_string())
    }

    /// Wrap an existing hash string, e.g. from a label registry or CLI flag.
    pub fn new(hash: impl AsRef<str>) -> Self {
        SchemaHash(hash.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Run-scoped, human-sortable schema identifier. Never persist it as a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaId(String);

impl SchemaId {
    fn new(ordinal: usize, hash: &SchemaHash) -> Self {
        SchemaId(format!("schema_{:03}__{}", ordinal, hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one file's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIdentity {
    pub key: SchemaKey,
    pub hash: SchemaHash,
    /// Sorted, distinct tokens.
    pub canonical_headers: Vec<String>,
}

impl SchemaIdentity {
    /// Identity of a normalized header list. Column order is irrelevant.
    pub fn from_headers<S: AsRef<str>>(normalized_headers: &[S]) -> Self {
        let key = SchemaKey::from_tokens(normalized_headers);
        let hash = SchemaHash::of(&key);
        let canonical_headers = key.tokens();
        Self {
            key,
            hash,
            canonical_headers,
        }
    }
}

/// Assign run-scoped ids: distinct keys sorted lexicographically receive
/// ordinals starting at 1, suffixed with their hash.
pub fn assign_schema_ids<'a, I>(identities: I) -> BTreeMap<SchemaKey, SchemaId>
where
    I: IntoIterator<Item = &'a SchemaIdentity>,
{
    let distinct: BTreeMap<&SchemaKey, &SchemaHash> = identities
        .into_iter()
        .map(|identity| (&identity.key, &identity.hash))
        .collect();

    distinct
        .into_iter()
        .enumerate()
        .map(|(idx, (key, hash))| (key.clone(), SchemaId::new(idx + 1, hash)))
        .collect()
}
