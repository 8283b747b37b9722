//! Typed cell values as seen by header detection.

use std::fmt;

/// A preview: leading rows of a file, each an ordered list of typed cells.
pub type PreviewMatrix = Vec<Vec<CellValue>>;

/// A single cell read from a spreadsheet or delimited file.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing or whitespace-only cell.
    Empty,
    /// Non-blank text, stored trimmed.
    Text(String),
    /// Whole number.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Boolean cell.
    Bool(bool),
    /// Date, time or duration, kept in its rendered form.
    Temporal(String),
}

impl CellValue {
    /// Build a text cell; blank input becomes `Empty`.
    pub fn text(value: impl AsRef<str>) -> Self {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    /// Type a raw delimited field: integers and finite floats become numeric
    /// cells, blanks become `Empty`, anything else stays text.
    pub fn infer(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }
        // Rust accepts "inf" and "NaN" as floats; a spreadsheet export does not mean them as numbers.
        if trimmed.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() {
                    return CellValue::Float(f);
                }
            }
        }
        CellValue::Text(trimmed.to_string())
    }

    /// Returns true for missing cells.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Returns true for string cells.
    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }

    /// Returns true for integer or float cells. Booleans are not numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Int(_) | CellValue::Float(_))
    }

    /// The text payload, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) | CellValue::Temporal(s) => write!(f, "{}", s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(x) => write!(f, "{}", x),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}
