//! xlsx workbook backend
//!
//! Values come from `umya-spreadsheet`; indent levels come from the package's
//! cell formats. Edits go to both the loaded workbook and the in-memory sheet,
//! so `save` rewrites only what was set and leaves every other cell as typed.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use umya_spreadsheet::{CellRawValue, Worksheet};

use super::styles::{self, CellIndents};
use super::{address, parse_address, Cell, CellValue, Sheet, SheetError, Spreadsheet};

#[derive(Debug)]
pub struct XlsxWorkbook {
    path: PathBuf,
    book: umya_spreadsheet::Spreadsheet,
    sheets: IndexMap<String, Sheet>,
}

impl XlsxWorkbook {
    /// An empty workbook that will be written to `path` on `save`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            book: umya_spreadsheet::new_file_empty_worksheet(),
            sheets: IndexMap::new(),
        }
    }

    /// Read every tab of an xlsx workbook
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(SheetError::NotAWorkbook { path });
        }

        let book = umya_spreadsheet::reader::xlsx::read(&path).map_err(|source| {
            SheetError::Read {
                path: path.clone(),
                source,
            }
        })?;
        let indents = styles::read_indents(&path)?;

        let sheets = book
            .get_sheet_collection()
            .iter()
            .map(|worksheet| {
                let name = worksheet.get_name().to_string();
                let sheet = read_sheet(worksheet, indents.get(&name));
                (name, sheet)
            })
            .collect();

        Ok(Self { path, book, sheets })
    }

    /// Add or replace a tab with the values of `sheet`
    pub fn insert_sheet(&mut self, sheet: Sheet) -> Result<(), SheetError> {
        let name = sheet.name().to_string();
        if self.book.get_sheet_by_name(&name).is_some() {
            self.book
                .remove_sheet_by_name(&name)
                .map_err(|reason| SheetError::InvalidSheetName {
                    name: name.clone(),
                    reason,
                })?;
        }
        let worksheet = self
            .book
            .new_sheet(name.clone())
            .map_err(|reason| SheetError::InvalidSheetName {
                name: name.clone(),
                reason,
            })?;

        for (r, cells) in sheet.rows().iter().enumerate() {
            for (c, cell) in cells.iter().enumerate() {
                let target = worksheet.get_cell_mut(address(c, r as u32 + 1));
                match &cell.value {
                    CellValue::Blank => {}
                    CellValue::Text(text) => {
                        target.set_value_string(text.clone());
                    }
                    CellValue::Number(number) => {
                        target.set_value_number(*number);
                    }
                }
            }
        }

        self.sheets.insert(name, sheet);
        Ok(())
    }

    fn missing_sheet(&self, name: &str) -> SheetError {
        SheetError::MissingSheet {
            expected: name.to_string(),
            path: self.path.clone(),
        }
    }
}

fn read_sheet(worksheet: &Worksheet, indents: Option<&CellIndents>) -> Sheet {
    let mut sheet = Sheet::new(worksheet.get_name());

    for cell in worksheet.get_cell_collection() {
        let value = match cell.get_raw_value() {
            CellRawValue::Empty => continue,
            CellRawValue::Numeric(number) => CellValue::Number(*number),
            _ => CellValue::Text(cell.get_value().into_owned()),
        };

        let coordinate = cell.get_coordinate();
        let (column, row) = (*coordinate.get_col_num(), *coordinate.get_row_num());
        let indent = indents
            .and_then(|cells| cells.get(&(column, row)))
            .copied()
            .unwrap_or(0);

        sheet.set_cell(column as usize - 1, row, Cell { value, indent });
    }

    sheet
}

impl Spreadsheet for XlsxWorkbook {
    fn path(&self) -> &Path {
        &self.path
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    fn set_text(&mut self, sheet: &str, address: &str, value: &str) -> Result<(), SheetError> {
        let (column, row) = parse_address(address)?;
        let missing = self.missing_sheet(sheet);
        let (Some(snapshot), Some(worksheet)) = (
            self.sheets.get_mut(sheet),
            self.book.get_sheet_by_name_mut(sheet),
        ) else {
            return Err(missing);
        };

        worksheet
            .get_cell_mut(address.trim())
            .set_value_string(value);

        let indent = snapshot.cell(column, row).map(|c| c.indent).unwrap_or(0);
        snapshot.set_cell(column, row, Cell::text_value(value).indented(indent));
        Ok(())
    }

    fn save(&self) -> Result<(), SheetError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        umya_spreadsheet::writer::xlsx::write(&self.book, &self.path).map_err(|source| {
            SheetError::Write {
                path: self.path.clone(),
                source,
            }
        })
    }
}
