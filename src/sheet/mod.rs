//! Spreadsheet capability
//!
//! The form, the reserve log and the ECO log are all xlsx workbooks. Validation
//! code only sees the [`Spreadsheet`] trait and the [`Sheet`] grid it hands out;
//! [`xlsx_book::XlsxWorkbook`] does the reading and writing.

pub mod layout;
mod styles;
pub mod xlsx_book;

use std::path::{Path, PathBuf};

use thiserror::Error;
use umya_spreadsheet::helper::coordinate::{
    coordinate_from_index, index_from_coordinate, string_from_column_index,
};

pub use layout::{ColumnLayout, ColumnRole};
pub use xlsx_book::XlsxWorkbook;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Not a workbook: {} (expected an .xlsx file)", path.display())]
    NotAWorkbook { path: PathBuf },

    #[error("Workbook {} has no {expected} tab", path.display())]
    MissingSheet { expected: String, path: PathBuf },

    #[error("Invalid cell address '{0}'")]
    InvalidAddress(String),

    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: &'static str },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: umya_spreadsheet::XlsxError,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: umya_spreadsheet::XlsxError,
    },

    #[error("Failed to read cell formatting from {}: {message}", path.display())]
    Styles { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The value held by a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Blank,
    Text(String),
    Number(f64),
}

/// A cell value plus the indent level of its alignment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub indent: u32,
}

impl Cell {
    pub fn text_value(value: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(value.into()),
            indent: 0,
        }
    }

    pub fn number(value: f64) -> Self {
        Self {
            value: CellValue::Number(value),
            indent: 0,
        }
    }

    pub fn indented(mut self, indent: u32) -> Self {
        self.indent = indent;
        self
    }

    /// Trimmed text of the cell, `None` when blank
    ///
    /// Whole numbers print without a fraction so a numeric revision `1` or an
    /// ECO number `12345` reads the same as if it had been typed as text.
    pub fn text(&self) -> Option<String> {
        match &self.value {
            CellValue::Blank => None,
            CellValue::Text(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            CellValue::Number(number) => Some(format_number(*number)),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text().is_none()
    }
}

fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

/// Column name of a zero-based index (0 -> `A`, 26 -> `AA`)
pub fn column_letters(index: usize) -> String {
    string_from_column_index(&(index as u32 + 1))
}

/// Address of a zero-based column and one-based row (`(0, 44)` -> `A44`)
pub fn address(column: usize, row: u32) -> String {
    coordinate_from_index(&(column as u32 + 1), &row)
}

/// Split an address like `A44` into a zero-based column and one-based row
pub fn parse_address(address: &str) -> Result<(usize, u32), SheetError> {
    let invalid = || SheetError::InvalidAddress(address.to_string());
    let trimmed = address.trim();

    let split = trimmed
        .find(|c: char| !c.is_ascii_uppercase())
        .unwrap_or(trimmed.len());
    let (letters, digits) = trimmed.split_at(split);
    if !(1..=3).contains(&letters.len())
        || digits.is_empty()
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    match index_from_coordinate(trimmed) {
        (Some(column), Some(row), _, _) if column > 0 && row > 0 => {
            Ok((column as usize - 1, row))
        }
        _ => Err(invalid()),
    }
}

/// One tab of a workbook, read into memory
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of the last populated row
    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn cell(&self, column: usize, row: u32) -> Option<&Cell> {
        let row = usize::try_from(row).ok()?.checked_sub(1)?;
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    /// Look up a cell by address; out-of-range and malformed addresses read as blank
    pub fn get(&self, address: &str) -> Option<&Cell> {
        let (column, row) = parse_address(address).ok()?;
        self.cell(column, row)
    }

    pub fn text(&self, address: &str) -> Option<String> {
        self.get(address).and_then(Cell::text)
    }

    pub fn text_at(&self, column: usize, row: u32) -> Option<String> {
        self.cell(column, row).and_then(Cell::text)
    }

    /// Store a cell, growing the grid as needed
    pub fn set_cell(&mut self, column: usize, row: u32, cell: Cell) {
        let row = row.max(1) as usize - 1;
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }

        let cells = &mut self.rows[row];
        if cells.len() <= column {
            cells.resize_with(column + 1, Cell::default);
        }
        cells[column] = cell;
    }

    /// Store text at an address; blank text clears the cell
    pub fn set_text(&mut self, address: &str, value: &str) -> Result<(), SheetError> {
        let (column, row) = parse_address(address)?;
        let cell = if value.trim().is_empty() {
            Cell::default()
        } else {
            Cell::text_value(value)
        };
        self.set_cell(column, row, cell);
        Ok(())
    }
}

/// A workbook of named sheets
pub trait Spreadsheet {
    /// Where the workbook lives
    fn path(&self) -> &Path;

    fn sheet_names(&self) -> Vec<String>;

    fn sheet(&self, name: &str) -> Option<&Sheet>;

    /// Replace the text of one cell, leaving every other cell as it was
    fn set_text(&mut self, sheet: &str, address: &str, value: &str) -> Result<(), SheetError>;

    /// Write the workbook back to `path`
    fn save(&self) -> Result<(), SheetError>;
}

/// The first of `candidates` present in `book`
pub fn find_sheet<'b, S: Spreadsheet + ?Sized>(
    book: &'b S,
    candidates: &[&str],
) -> Result<&'b Sheet, SheetError> {
    candidates
        .iter()
        .find_map(|name| book.sheet(name))
        .ok_or_else(|| SheetError::MissingSheet {
            expected: candidates.join(" or "),
            path: book.path().to_path_buf(),
        })
}
