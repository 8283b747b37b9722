//! Schema fingerprinting: header detection, normalization and identity.

mod detector;
mod identity;
mod normalizer;

pub use detector::{
    detect_header_row, following_rows_coherence, nonempty_density, numeric_ratio, score_row,
    short_ratio, text_ratio, unique_ratio, HeaderDetection, ScoreBreakdown, FOLLOW_DEFAULT,
    FOLLOW_LOOKAHEAD, WEIGHT_FOLLOW_COHERENCE, WEIGHT_NONEMPTY_DENSITY, WEIGHT_SHORT_RATIO,
    WEIGHT_TEXT_RATIO, WEIGHT_UNIQUE_RATIO,
};
pub use identity::{
    assign_schema_ids, SchemaHash, SchemaId, SchemaIdentity, SchemaKey, SCHEMA_HASH_LEN,
    SCHEMA_KEY_SEPARATOR,
};
pub use normalizer::{
    normalize_columns, normalize_header, normalize_headers, AliasTable, NormalizedHeaders,
};
