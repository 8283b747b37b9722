//! In-memory string tables produced by consolidation.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Result, SheetlakeError};

/// Represents tabular data with named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data as strings (row-major order). Every row has `headers.len()` cells.
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Create a table, padding or truncating rows to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(|s| s.as_str()).unwrap_or(""))
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Set a column from per-row values, adding it when absent.
    ///
    /// `values` shorter than the table leave the remaining cells empty.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        let index = match self.column_index(name) {
            Some(i) => i,
            None => {
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.push(String::new());
                }
                self.headers.len() - 1
            }
        };
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row[index] = values.next().unwrap_or_default();
        }
    }

    /// Append a column holding the same value in every row.
    pub fn push_constant_column(&mut self, name: &str, value: &str) {
        let values = vec![value.to_string(); self.rows.len()];
        self.set_column(name, values);
    }

    /// Concatenate tables row-wise, aligning columns by name.
    ///
    /// The result carries the union of all columns in first-seen order;
    /// cells for columns a table lacks are empty.
    pub fn concat(tables: Vec<DataTable>) -> DataTable {
        let mut positions: IndexMap<String, usize> = IndexMap::new();
        for table in &tables {
            for header in &table.headers {
                let next = positions.len();
                positions.entry(header.clone()).or_insert(next);
            }
        }

        let width = positions.len();
        let mut rows = Vec::new();
        for table in tables {
            let mapping: Vec<usize> = table.headers.iter().map(|h| positions[h]).collect();
            for row in table.rows {
                let mut out = vec![String::new(); width];
                for (value, &target) in row.into_iter().zip(&mapping) {
                    out[target] = value;
                }
                rows.push(out);
            }
        }

        DataTable {
            headers: positions.into_keys().collect(),
            rows,
        }
    }

    /// Write the table as CSV, creating parent directories.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SheetlakeError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| SheetlakeError::io(path, e))?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(|e| SheetlakeError::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> DataTable {
        DataTable::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_new_pads_rows() {
        let t = table(&["a", "b"], &[&["1"], &["1", "2", "3"]]);
        assert_eq!(t.rows[0], vec!["1", ""]);
        assert_eq!(t.rows[1], vec!["1", "2"]);
    }

    #[test]
    fn test_concat_aligns_by_name() {
        let a = table(&["name", "amount"], &[&["x", "1"]]);
        let b = table(&["amount", "name", "extra"], &[&["2", "y", "z"]]);
        let merged = DataTable::concat(vec![a, b]);

        assert_eq!(merged.headers, vec!["name", "amount", "extra"]);
        assert_eq!(merged.rows[0], vec!["x", "1", ""]);
        assert_eq!(merged.rows[1], vec!["y", "2", "z"]);
    }

    #[test]
    fn test_set_and_constant_columns() {
        let mut t = table(&["a"], &[&["1"], &["2"]]);
        t.push_constant_column("label", "sales");
        t.set_column("a", vec!["9".into()]);

        assert_eq!(t.headers, vec!["a", "label"]);
        assert_eq!(t.get(0, 0), Some("9"));
        assert_eq!(t.get(1, 0), Some(""));
        assert_eq!(t.column_values(1).collect::<Vec<_>>(), vec!["sales", "sales"]);
    }
}
