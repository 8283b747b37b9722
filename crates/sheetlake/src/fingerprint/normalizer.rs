//! Header canonicalization, alias resolution and per-file de-duplication.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::config::{load_string_mapping, MappingKeys};
use crate::error::Result;

static MULTI_UNDERSCORE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

/// Canonicalize one header string into `[a-z0-9_]*`.
///
/// Trims, folds accents away, lower-cases, turns whitespace, `-`, `/` and
/// `.` into `_`, drops every other character outside the canonical set,
/// collapses runs of `_` and trims them from both ends. Total and
/// idempotent; blank input yields an empty string.
pub fn normalize_header(header: &str) -> String {
    let folded: String = header
        .trim()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => Some(c),
            '-' | '/' | '.' => Some('_'),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();

    MULTI_UNDERSCORE
        .replace_all(&folded, "_")
        .trim_matches('_')
        .to_string()
}

/// Curated `normalized_source -> normalized_target` header aliases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs; both sides are normalized and blank entries dropped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let aliases = pairs
            .into_iter()
            .map(|(k, v)| (normalize_header(k.as_ref()), normalize_header(v.as_ref())))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect();
        Self { aliases }
    }

    /// Load from a YAML mapping. A missing file is an empty table; a
    /// document that is not a mapping is a configuration error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let pairs = load_string_mapping(path.as_ref(), "header aliases", MappingKeys::Scalar)?;
        Ok(Self::from_pairs(pairs))
    }

    /// The alias target for a normalized token, when it differs from it.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.aliases
            .get(token)
            .map(String::as_str)
            .filter(|target| *target != token)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Result of normalizing one file's raw headers.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedHeaders {
    /// Headers as detected.
    pub raw_headers: Vec<String>,
    /// Canonical, aliased, de-duplicated tokens in encounter order.
    pub normalized_headers: Vec<String>,
    /// Aliases that fired: source token -> target token.
    pub applied_aliases: IndexMap<String, String>,
}

/// Normalize raw headers, apply aliases and de-duplicate.
///
/// Tokens that normalize to nothing are discarded. Repeats are suffixed in
/// encounter order: `name`, `name__2`, `name__3`.
pub fn normalize_headers(raw_headers: &[String], aliases: &AliasTable) -> NormalizedHeaders {
    let mut applied_aliases = IndexMap::new();
    let mut tokens = Vec::with_capacity(raw_headers.len());

    for raw in raw_headers {
        let token = normalize_header(raw);
        if token.is_empty() {
            continue;
        }
        tokens.push(apply_alias(token, aliases, &mut applied_aliases));
    }

    NormalizedHeaders {
        raw_headers: raw_headers.to_vec(),
        normalized_headers: dedupe(tokens),
        applied_aliases,
    }
}

/// Positional variant used when rebuilding full tables: every column keeps a
/// name, blank headers becoming `unnamed_{n}` (1-based position).
pub fn normalize_columns(raw_headers: &[String], aliases: &AliasTable) -> Vec<String> {
    let mut ignored = IndexMap::new();
    let tokens = raw_headers
        .iter()
        .enumerate()
        .map(|(idx, raw)| {
            let token = normalize_header(raw);
            if token.is_empty() {
                format!("unnamed_{}", idx + 1)
            } else {
                apply_alias(token, aliases, &mut ignored)
            }
        })
        .collect();
    dedupe(tokens)
}

fn apply_alias(
    token: String,
    aliases: &AliasTable,
    applied: &mut IndexMap<String, String>,
) -> String {
    match aliases.resolve(&token) {
        Some(target) => {
            let target = target.to_string();
            applied.insert(token, target.clone());
            target
        }
        None => token,
    }
}

/// Canonical tokens never contain `__`, so suffixed names cannot collide
/// with bare ones.
fn dedupe(tokens: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    tokens
        .into_iter()
        .map(|token| {
            let count = counts.entry(token.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                token
            } else {
                format!("{}__{}", token, count)
            }
        })
        .collect()
}
