//! Input handling: previews of tabular files, full-table reads and lake scanning.

mod cell;
mod delimited;
mod preview;
mod scanner;
mod table;
mod workbook;

pub use cell::{CellValue, PreviewMatrix};
pub use delimited::read_delimited_rows;
pub use preview::{FileKind, FilePreviewer, Preview, PreviewSource};
pub use scanner::{normalize_extensions, scan_files, DiscoveredFile};
pub use table::DataTable;
pub use workbook::{read_first_sheet, SheetRows};
