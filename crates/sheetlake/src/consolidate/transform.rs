//! Label-specific transforms applied to consolidated tables.

use indexmap::IndexMap;
use regex::Regex;

use crate::config::TransformSpec;
use crate::error::{Result, SheetlakeError};
use crate::fingerprint::normalize_header;
use crate::input::DataTable;

/// A rewrite of a consolidated table for some set of labels.
pub trait TableTransform {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn applies_to(&self, label: &str) -> bool;

    fn apply(&self, label: &str, table: DataTable) -> Result<DataTable>;
}

/// Pulls a code out of a text column with a regex and maps it through
/// lookup tables.
///
/// The target and lookup columns always exist afterwards. When no source
/// column is present, existing target columns are kept and missing ones are
/// added empty.
#[derive(Debug, Clone)]
pub struct RegexExtract {
    label_prefix: String,
    source_columns: Vec<String>,
    pattern: Regex,
    target: String,
    lookups: IndexMap<String, IndexMap<String, String>>,
    require_source: bool,
}

impl RegexExtract {
    /// Column names are normalized so they match consolidated headers. The
    /// pattern must have at least one capture group.
    pub fn new(
        label_prefix: impl Into<String>,
        source_columns: &[String],
        pattern: &str,
        target: &str,
        lookups: IndexMap<String, IndexMap<String, String>>,
        require_source: bool,
    ) -> Result<Self> {
        let pattern = Regex::new(pattern)?;
        if pattern.captures_len() < 2 {
            return Err(SheetlakeError::Config(format!(
                "regex_extract pattern '{}' needs a capture group",
                pattern.as_str()
            )));
        }

        let target = normalize_header(target);
        if target.is_empty() {
            return Err(SheetlakeError::Config(
                "regex_extract target column name is empty".to_string(),
            ));
        }

        Ok(Self {
            label_prefix: label_prefix.into(),
            source_columns: source_columns.iter().map(|c| normalize_header(c)).collect(),
            pattern,
            target,
            lookups: lookups
                .into_iter()
                .map(|(column, table)| {
                    let table = table
                        .into_iter()
                        .map(|(code, value)| (code.trim().to_string(), value))
                        .collect();
                    (normalize_header(&column), table)
                })
                .collect(),
            require_source,
        })
    }

    fn source_index(&self, table: &DataTable) -> Option<usize> {
        self.source_columns
            .iter()
            .find_map(|column| table.column_index(column))
    }

    fn ensure_column(table: &mut DataTable, name: &str) {
        if table.column_index(name).is_none() {
            table.set_column(name, Vec::new());
        }
    }
}

impl TableTransform for RegexExtract {
    fn name(&self) -> &str {
        "regex_extract"
    }

    fn applies_to(&self, label: &str) -> bool {
        label.starts_with(&self.label_prefix)
    }

    fn apply(&self, label: &str, mut table: DataTable) -> Result<DataTable> {
        let Some(source) = self.source_index(&table) else {
            if self.require_source {
                return Err(SheetlakeError::Transform {
                    label: label.to_string(),
                    message: format!(
                        "none of the source columns {:?} present",
                        self.source_columns
                    ),
                });
            }
            Self::ensure_column(&mut table, &self.target);
            for column in self.lookups.keys() {
                Self::ensure_column(&mut table, column);
            }
            return Ok(table);
        };

        let codes: Vec<String> = table
            .column_values(source)
            .map(|value| {
                self.pattern
                    .captures(value)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default()
            })
            .collect();

        let mapped: Vec<(&String, Vec<String>)> = self
            .lookups
            .iter()
            .map(|(column, lookup)| {
                let values = codes
                    .iter()
                    .map(|code| lookup.get(code).cloned().unwrap_or_default())
                    .collect();
                (column, values)
            })
            .collect();

        table.set_column(&self.target, codes);
        for (column, values) in mapped {
            table.set_column(column, values);
        }
        Ok(table)
    }
}

/// Instantiate configured transforms.
pub fn build_transforms(specs: &[TransformSpec]) -> Result<Vec<Box<dyn TableTransform>>> {
    specs
        .iter()
        .map(|spec| match spec {
            TransformSpec::RegexExtract {
                label_prefix,
                source_columns,
                pattern,
                target,
                lookups,
                require_source,
            } => RegexExtract::new(
                label_prefix.as_str(),
                source_columns,
                pattern,
                target,
                lookups.clone(),
                *require_source,
            )
            .map(|t| Box::new(t) as Box<dyn TableTransform>),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch_lookup() -> IndexMap<String, IndexMap<String, String>> {
        let mut names = IndexMap::new();
        names.insert("149".to_string(), "Green Bay".to_string());
        names.insert("203".to_string(), "Appleton".to_string());
        let mut lookups = IndexMap::new();
        lookups.insert("Branch Name".to_string(), names);
        lookups
    }

    fn transform(require_source: bool) -> RegexExtract {
        RegexExtract::new(
            "visits",
            &["Location".to_string(), "office".to_string()],
            r"(\d{3})",
            "branch",
            branch_lookup(),
            require_source,
        )
        .unwrap()
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> DataTable {
        DataTable::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_extracts_and_maps() {
        let input = table(
            &["office", "hours"],
            &[&["WI-149 Green Bay", "3"], &["203 Appleton", "4"], &["none", "5"]],
        );
        let out = transform(false).apply("visits_2024", input).unwrap();

        let branch = out.column_index("branch").unwrap();
        let name = out.column_index("branch_name").unwrap();
        assert_eq!(out.column_values(branch).collect::<Vec<_>>(), vec!["149", "203", ""]);
        assert_eq!(
            out.column_values(name).collect::<Vec<_>>(),
            vec!["Green Bay", "Appleton", ""]
        );
    }

    #[test]
    fn test_missing_source_adds_empty_columns() {
        let input = table(&["hours"], &[&["3"]]);
        let out = transform(false).apply("visits", input).unwrap();
        assert_eq!(out.headers, vec!["hours", "branch", "branch_name"]);
        assert_eq!(out.get(0, 1), Some(""));
    }

    #[test]
    fn test_missing_source_fails_when_required() {
        let input = table(&["hours"], &[&["3"]]);
        let err = transform(true).apply("visits", input).unwrap_err();
        assert!(matches!(err, SheetlakeError::Transform { .. }));
    }

    #[test]
    fn test_applies_by_prefix() {
        let t = transform(false);
        assert!(t.applies_to("visits_weekly"));
        assert!(!t.applies_to("payroll"));
    }

    #[test]
    fn test_pattern_needs_capture_group() {
        let err = RegexExtract::new("x", &[], r"\d+", "t", IndexMap::new(), false).unwrap_err();
        assert!(matches!(err, SheetlakeError::Config(_)));
    }
}
