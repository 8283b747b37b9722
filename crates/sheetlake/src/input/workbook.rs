//! Spreadsheet reading via calamine.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::cell::CellValue;
use crate::error::{Result, SheetlakeError};

/// Rows of the first worksheet of a workbook.
#[derive(Debug, Clone)]
pub struct SheetRows {
    /// Name of the sheet that was read.
    pub sheet_name: String,
    /// Physical rows, starting at the first row of the sheet.
    pub rows: Vec<Vec<CellValue>>,
}

/// Read the first worksheet, returning at most `limit` rows.
///
/// Row indices are physical: when the sheet's used range starts below row 1,
/// the blank leading rows are materialized as empty rows so that an index
/// found in a preview addresses the same row in a later full read.
pub fn read_first_sheet(path: &Path, limit: Option<usize>) -> Result<SheetRows> {
    let mut workbook = open_workbook_auto(path).map_err(|e| SheetlakeError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let sheet_name = workbook.sheet_names().first().cloned().unwrap_or_default();

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetlakeError::Workbook {
            path: path.to_path_buf(),
            message: "workbook contains no worksheets".to_string(),
        })?
        .map_err(|e| SheetlakeError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let max_rows = limit.unwrap_or(usize::MAX);
    let leading_blank = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    let mut rows: Vec<Vec<CellValue>> = std::iter::repeat_with(Vec::new)
        .take(leading_blank.min(max_rows))
        .collect();

    for row in range.rows() {
        if rows.len() >= max_rows {
            break;
        }
        rows.push(row.iter().map(cell_value).collect());
    }

    Ok(SheetRows { sheet_name, rows })
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::text(s),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Temporal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_mapping() {
        assert_eq!(cell_value(&Data::Empty), CellValue::Empty);
        assert_eq!(cell_value(&Data::String("  ".into())), CellValue::Empty);
        assert_eq!(
            cell_value(&Data::String(" Name ".into())),
            CellValue::Text("Name".into())
        );
        assert_eq!(cell_value(&Data::Int(3)), CellValue::Int(3));
        assert_eq!(cell_value(&Data::Float(1.5)), CellValue::Float(1.5));
        assert_eq!(cell_value(&Data::Bool(true)), CellValue::Bool(true));
        assert!(matches!(
            cell_value(&Data::DateTimeIso("2024-01-01".into())),
            CellValue::Temporal(_)
        ));
    }

    fn workbook_starting_at_row_three() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Export").unwrap();
        sheet.write_string(3, 0, "Client").unwrap();
        sheet.write_string(3, 1, "Hours").unwrap();
        sheet.write_string(4, 0, "ann").unwrap();
        sheet.write_number(4, 1, 2.5).unwrap();
        workbook.save(dir.path().join("book.xlsx")).unwrap();
        dir
    }

    #[test]
    fn test_leading_blank_rows_are_materialized() {
        let dir = workbook_starting_at_row_three();
        let sheet = read_first_sheet(&dir.path().join("book.xlsx"), None).unwrap();

        assert_eq!(sheet.sheet_name, "Export");
        assert_eq!(sheet.rows.len(), 5);
        assert!(sheet.rows[..3].iter().all(|row| row.is_empty()));
        assert_eq!(
            sheet.rows[3],
            vec![CellValue::Text("Client".into()), CellValue::Text("Hours".into())]
        );
        assert_eq!(
            sheet.rows[4],
            vec![CellValue::Text("ann".into()), CellValue::Float(2.5)]
        );
    }

    #[test]
    fn test_limit_counts_leading_blank_rows() {
        let dir = workbook_starting_at_row_three();
        let path = dir.path().join("book.xlsx");

        assert_eq!(read_first_sheet(&path, Some(2)).unwrap().rows.len(), 2);
        let sheet = read_first_sheet(&path, Some(4)).unwrap();
        assert_eq!(sheet.rows.len(), 4);
        assert_eq!(sheet.rows[3][0], CellValue::Text("Client".into()));
    }

    #[test]
    fn test_unreadable_workbook() {
        let err = read_first_sheet(Path::new("/nonexistent/book.xlsx"), Some(10)).unwrap_err();
        assert!(matches!(err, SheetlakeError::Workbook { .. }));
    }
}
