//! Header row detection for messy exports.
//!
//! Exports from line-of-business systems frequently start with a title,
//! filter descriptions or blank rows before the real header. No single signal
//! finds the header reliably, so every candidate row is scored on several
//! independent signals and the weighted sum becomes the confidence. Below the
//! configured floor the file is left for manual review instead of guessed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::input::CellValue;

/// Weight of the share of non-empty cells in the row.
pub const WEIGHT_NONEMPTY_DENSITY: f64 = 0.22;
/// Weight of the share of text cells among non-empty cells.
pub const WEIGHT_TEXT_RATIO: f64 = 0.28;
/// Weight of the share of short strings among non-empty cells.
pub const WEIGHT_SHORT_RATIO: f64 = 0.18;
/// Weight of the share of distinct values among non-empty cells.
pub const WEIGHT_UNIQUE_RATIO: f64 = 0.20;
/// Weight of how data-like the rows below look.
pub const WEIGHT_FOLLOW_COHERENCE: f64 = 0.12;

/// Rows below a candidate considered by the coherence signal.
pub const FOLLOW_LOOKAHEAD: usize = 5;
/// Coherence assumed for the last row of a preview.
pub const FOLLOW_DEFAULT: f64 = 0.3;

const SHORT_MAX_CHARS: usize = 40;
const DENSITY_TOLERANCE: f64 = 0.6;
const DENSITY_SIMILARITY_WEIGHT: f64 = 0.55;
const MIXEDNESS_WEIGHT: f64 = 0.45;

/// Per-signal scores for one candidate row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub nonempty_density: f64,
    pub text_ratio: f64,
    pub short_ratio: f64,
    pub unique_ratio: f64,
    pub follow_score: f64,
    /// Weighted sum, clamped to [0, 1].
    pub score: f64,
}

/// Outcome of header detection for one preview.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderDetection {
    /// Zero-based physical row index; `None` sends the file to quarantine.
    pub header_row_index: Option<usize>,
    /// Confidence in [0, 1], reported even when below the floor.
    pub confidence: f64,
    /// Non-blank cells of the chosen row, in order.
    pub raw_headers: Vec<String>,
    /// Signals of the best-scoring row.
    pub breakdown: ScoreBreakdown,
}

impl HeaderDetection {
    /// True when a header row was accepted.
    pub fn is_confident(&self) -> bool {
        self.header_row_index.is_some()
    }
}

/// Choose the most header-like row of a preview.
///
/// Rows are scored in ascending order and the strict maximum wins, so ties go
/// to the earliest row. An empty preview or a best score under
/// `min_confidence` yields no index and no headers.
pub fn detect_header_row(rows: &[Vec<CellValue>], min_confidence: f64) -> HeaderDetection {
    let mut best: Option<(usize, ScoreBreakdown)> = None;

    for idx in 0..rows.len() {
        let breakdown = score_row(rows, idx);
        if best.is_none_or(|(_, b)| breakdown.score > b.score) {
            best = Some((idx, breakdown));
        }
    }

    let Some((best_idx, breakdown)) = best else {
        return HeaderDetection {
            header_row_index: None,
            confidence: 0.0,
            raw_headers: Vec::new(),
            breakdown: ScoreBreakdown::default(),
        };
    };

    let confidence = breakdown.score.clamp(0.0, 1.0);
    if confidence < min_confidence {
        return HeaderDetection {
            header_row_index: None,
            confidence,
            raw_headers: Vec::new(),
            breakdown,
        };
    }

    HeaderDetection {
        header_row_index: Some(best_idx),
        confidence,
        raw_headers: extract_raw_headers(&rows[best_idx]),
        breakdown,
    }
}

/// Score `rows[idx]` as a header candidate.
pub fn score_row(rows: &[Vec<CellValue>], idx: usize) -> ScoreBreakdown {
    let row = &rows[idx];
    let nonempty_density = nonempty_density(row);
    if nonempty_density == 0.0 {
        return ScoreBreakdown::default();
    }

    let text_ratio = text_ratio(row);
    let short_ratio = short_ratio(row);
    let unique_ratio = unique_ratio(row);
    let follow_score = following_rows_coherence(rows, idx);

    let score = WEIGHT_NONEMPTY_DENSITY * nonempty_density
        + WEIGHT_TEXT_RATIO * text_ratio
        + WEIGHT_SHORT_RATIO * short_ratio
        + WEIGHT_UNIQUE_RATIO * unique_ratio
        + WEIGHT_FOLLOW_COHERENCE * follow_score;

    ScoreBreakdown {
        nonempty_density,
        text_ratio,
        short_ratio,
        unique_ratio,
        follow_score,
        score: score.clamp(0.0, 1.0),
    }
}

/// Share of non-empty cells in the row; 0 for a row without cells.
pub fn nonempty_density(row: &[CellValue]) -> f64 {
    if row.is_empty() {
        return 0.0;
    }
    let filled = row.iter().filter(|c| !c.is_empty()).count();
    filled as f64 / row.len() as f64
}

/// Share of text cells among the non-empty cells.
pub fn text_ratio(row: &[CellValue]) -> f64 {
    share_of_nonempty(row, CellValue::is_text)
}

/// Share of numeric cells among the non-empty cells.
pub fn numeric_ratio(row: &[CellValue]) -> f64 {
    share_of_nonempty(row, CellValue::is_numeric)
}

/// Share of strings between 1 and 40 characters among the non-empty cells.
pub fn short_ratio(row: &[CellValue]) -> f64 {
    share_of_nonempty(row, |cell| {
        cell.as_text()
            .is_some_and(|s| (1..=SHORT_MAX_CHARS).contains(&s.chars().count()))
    })
}

/// Share of distinct values (trimmed, lower-cased) among the non-empty cells.
pub fn unique_ratio(row: &[CellValue]) -> f64 {
    let values: Vec<String> = row
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if values.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<&str> = values.iter().map(String::as_str).collect();
    distinct.len() as f64 / values.len() as f64
}

/// How data-like the rows after `idx` look.
///
/// Each of the next [`FOLLOW_LOOKAHEAD`] rows contributes
/// `0.55 * density_similarity + 0.45 * mixedness`, where mixedness rewards
/// numbers and penalises rows made only of labels. The last row of a preview
/// gets [`FOLLOW_DEFAULT`].
pub fn following_rows_coherence(rows: &[Vec<CellValue>], idx: usize) -> f64 {
    let following = &rows[(idx + 1).min(rows.len())..];
    let following = &following[..following.len().min(FOLLOW_LOOKAHEAD)];
    if following.is_empty() {
        return FOLLOW_DEFAULT;
    }

    let header_density = nonempty_density(&rows[idx]);

    let total: f64 = following
        .iter()
        .map(|row| {
            let density = nonempty_density(row);
            let density_similarity =
                1.0 - ((density - header_density).abs() / DENSITY_TOLERANCE).min(1.0);
            let mixedness = (numeric_ratio(row) + 0.5 * (1.0 - text_ratio(row))).min(1.0);
            DENSITY_SIMILARITY_WEIGHT * density_similarity + MIXEDNESS_WEIGHT * mixedness
        })
        .sum();

    total / following.len() as f64
}

fn share_of_nonempty(row: &[CellValue], predicate: impl Fn(&CellValue) -> bool) -> f64 {
    let nonempty: Vec<&CellValue> = row.iter().filter(|c| !c.is_empty()).collect();
    if nonempty.is_empty() {
        return 0.0;
    }
    let matching = nonempty.iter().filter(|c| predicate(c)).count();
    matching as f64 / nonempty.len() as f64
}

fn extract_raw_headers(row: &[CellValue]) -> Vec<String> {
    row.iter()
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> CellValue {
        CellValue::text(s)
    }

    fn row(cells: &[CellValue]) -> Vec<CellValue> {
        cells.to_vec()
    }

    #[test]
    fn test_empty_matrix() {
        let result = detect_header_row(&[], 0.5);
        assert_eq!(result.header_row_index, None);
        assert_eq!(result.confidence, 0.0);
        assert!(result.raw_headers.is_empty());
    }

    #[test]
    fn test_simple_header_first_row() {
        let rows = vec![
            row(&[t("Name"), t("Amount")]),
            row(&[t("alice"), CellValue::Int(10)]),
            row(&[t("bob"), CellValue::Int(20)]),
        ];
        let result = detect_header_row(&rows, 0.6);
        assert_eq!(result.header_row_index, Some(0));
        assert_eq!(result.raw_headers, vec!["Name", "Amount"]);
        assert!((result.confidence - 0.9865).abs() < 1e-9);
    }

    #[test]
    fn test_header_after_preamble() {
        let rows = vec![
            row(&[t("Visits report - all branches"), CellValue::Empty, CellValue::Empty, CellValue::Empty]),
            row(&[t("Printed: 2024-03-01"), CellValue::Empty, CellValue::Empty, CellValue::Empty]),
            row(&[CellValue::Empty, CellValue::Empty, CellValue::Empty, CellValue::Empty]),
            row(&[t("Client"), t("Location"), t("Visit Date"), t("Hours")]),
            row(&[t("A. Smith"), CellValue::Int(149), CellValue::Temporal("2024-02-01".into()), CellValue::Float(2.5)]),
            row(&[t("B. Jones"), CellValue::Int(203), CellValue::Temporal("2024-02-02".into()), CellValue::Float(1.0)]),
            row(&[t("C. Brown"), CellValue::Int(363), CellValue::Temporal("2024-02-03".into()), CellValue::Float(4.0)]),
        ];
        let result = detect_header_row(&rows, 0.6);
        assert_eq!(result.header_row_index, Some(3));
        assert_eq!(result.raw_headers, vec!["Client", "Location", "Visit Date", "Hours"]);
    }

    #[test]
    fn test_below_floor_reports_confidence_without_headers() {
        let rows = vec![row(&[t("ID")])];
        let result = detect_header_row(&rows, 0.95);
        assert_eq!(result.header_row_index, None);
        assert!(result.raw_headers.is_empty());
        // 0.88 from the row itself plus the default coherence share
        assert!((result.confidence - 0.916).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_first_row() {
        let rows = vec![row(&[t("a"), t("b")]), row(&[t("a"), t("b")])];
        let result = detect_header_row(&rows, 0.0);
        assert_eq!(result.header_row_index, Some(0));
    }

    #[test]
    fn test_all_blank_rows_score_zero() {
        let rows = vec![row(&[CellValue::Empty]), Vec::new()];
        let result = detect_header_row(&rows, 0.1);
        assert_eq!(result.header_row_index, None);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_sub_scores() {
        let r = row(&[t("Name"), CellValue::Int(3), CellValue::Empty, t("name")]);
        assert!((nonempty_density(&r) - 0.75).abs() < 1e-12);
        assert!((text_ratio(&r) - 2.0 / 3.0).abs() < 1e-12);
        assert!((numeric_ratio(&r) - 1.0 / 3.0).abs() < 1e-12);
        assert!((short_ratio(&r) - 2.0 / 3.0).abs() < 1e-12);
        assert!((unique_ratio(&r) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_short_ratio_ignores_long_labels() {
        let long = "x".repeat(41);
        let r = row(&[t(&long), t("ok")]);
        assert!((short_ratio(&r) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_coherence_default_for_last_row() {
        let rows = vec![row(&[t("a")])];
        assert_eq!(following_rows_coherence(&rows, 0), FOLLOW_DEFAULT);
    }

    #[test]
    fn test_coherence_prefers_numeric_followers() {
        let numeric = vec![row(&[t("a"), t("b")]), row(&[CellValue::Int(1), CellValue::Int(2)])];
        let labels = vec![row(&[t("a"), t("b")]), row(&[t("x"), t("y")])];
        assert!((following_rows_coherence(&numeric, 0) - 1.0).abs() < 1e-12);
        assert!((following_rows_coherence(&labels, 0) - 0.55).abs() < 1e-12);
    }
}
