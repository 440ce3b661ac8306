//! ECO log - the register of change orders and their primary parts

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::eco::classifier::IntroducedItem;
use crate::sheet::{address, find_sheet, CellValue, SheetError, Spreadsheet};

pub const ECO_LOG_SHEET: &str = "ALL ECO's";

/// Rows above this are headings
pub const FIRST_RECORD_ROW: u32 = 4;

const ECO_COLUMN: usize = 0;
const DATE_COLUMN: usize = 1;
const INITIATOR_COLUMN: usize = 2;
const PRIMARY_PART_COLUMN: usize = 3;
const PROJECT_COLUMN: usize = 4;

#[derive(Debug, Error)]
pub enum EcoLogError {
    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("ECO {0} is not in the ECO log")]
    UnknownEco(String),
}

/// One change order in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcoRecord {
    pub eco: String,
    pub row: u32,
    pub date_assigned: String,
    pub initiator: Option<String>,
    pub primary_part: Option<String>,
    pub project_data: Option<String>,
}

/// The ECO log workbook and its records
#[derive(Debug)]
pub struct EcoLog<S: Spreadsheet> {
    book: S,
    records: IndexMap<String, EcoRecord>,
}

impl<S: Spreadsheet> EcoLog<S> {
    pub fn load(book: S) -> Result<Self, EcoLogError> {
        let sheet = find_sheet(&book, &[ECO_LOG_SHEET])?;
        let mut records = IndexMap::new();

        for row in FIRST_RECORD_ROW..=sheet.row_count() {
            let Some(date_assigned) = sheet.text_at(DATE_COLUMN, row) else {
                continue;
            };
            // numeric ECO numbers are stored as floats
            let eco = match sheet.cell(ECO_COLUMN, row).map(|c| &c.value) {
                Some(CellValue::Number(n)) => format!("{}", n.round() as i64),
                _ => match sheet.text_at(ECO_COLUMN, row) {
                    Some(text) => text,
                    None => continue,
                },
            };

            records.insert(
                eco.clone(),
                EcoRecord {
                    eco,
                    row,
                    date_assigned,
                    initiator: sheet.text_at(INITIATOR_COLUMN, row),
                    primary_part: sheet.text_at(PRIMARY_PART_COLUMN, row),
                    project_data: sheet.text_at(PROJECT_COLUMN, row),
                },
            );
        }

        Ok(Self { book, records })
    }

    pub fn lookup(&self, eco: &str) -> Option<&EcoRecord> {
        self.records.get(eco.trim())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the primary part of an ECO; call `save` to persist
    pub fn set_primary_part(&mut self, eco: &str, value: &str) -> Result<(), EcoLogError> {
        let record = self
            .records
            .get_mut(eco.trim())
            .ok_or_else(|| EcoLogError::UnknownEco(eco.trim().to_string()))?;
        self.book.set_text(
            ECO_LOG_SHEET,
            &address(PRIMARY_PART_COLUMN, record.row),
            value,
        )?;
        record.primary_part = Some(value.to_string());
        Ok(())
    }

    pub fn save(&self) -> Result<(), EcoLogError> {
        self.book.save()?;
        Ok(())
    }
}

/// Part-number prefixes that rank candidates for an ECO's primary part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartCategories {
    pub executable: Vec<String>,
    pub source: Vec<String>,
}

impl PartCategories {
    fn rank(&self, part: &str) -> u8 {
        if self.executable.iter().any(|p| part.starts_with(p.as_str())) {
            0
        } else if self.source.iter().any(|p| part.starts_with(p.as_str())) {
            1
        } else {
            2
        }
    }

    /// The introduced part best suited to be the primary part
    ///
    /// Executables beat source, source beats anything else; ties go to the
    /// part listed first on the form.
    pub fn primary_candidate<'i>(
        &self,
        introduced: &'i [IntroducedItem],
    ) -> Option<&'i IntroducedItem> {
        introduced.iter().min_by_key(|item| self.rank(&item.part))
    }
}

/// Check the log's primary part for `eco` against the introduced parts
///
/// Returns the suggested primary part when the log entry should be updated.
pub fn check_primary_part<'i>(
    record: Option<&EcoRecord>,
    eco: &str,
    introduced: &'i [IntroducedItem],
    categories: &PartCategories,
    diags: &mut Diagnostics,
) -> Option<&'i IntroducedItem> {
    let Some(record) = record else {
        diags.push(Diagnostic::warning(
            DiagnosticKind::EcoLogMissing,
            format!("ECO {} is not in the ECO log.", eco),
        ));
        return None;
    };

    let candidate = categories.primary_candidate(introduced)?;
    let primary = record.primary_part.as_deref().unwrap_or_default();
    if introduced.iter().any(|item| primary.contains(item.part.as_str())) {
        return None;
    }

    diags.push(Diagnostic::warning(
        DiagnosticKind::EcoLogPrimaryPart,
        format!(
            "ECO log row {} lists primary part '{}' for ECO {}, which is not a new CI on this form. Suggest {}.",
            record.row, primary, eco, candidate.part
        ),
    ));
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{Cell, Sheet, XlsxWorkbook};
    use tempfile::TempDir;

    fn item(part: &str, row: u32) -> IntroducedItem {
        IntroducedItem {
            part: part.to_string(),
            revision: "A".to_string(),
            row,
        }
    }

    fn categories() -> PartCategories {
        PartCategories {
            executable: vec!["142".to_string()],
            source: vec!["139".to_string()],
        }
    }

    fn log_sheet() -> Sheet {
        let mut sheet = Sheet::new(ECO_LOG_SHEET);
        sheet.set_text("A1", "ECO Log").unwrap();
        for (row, values) in [
            (4, ["11629", "2024-01-05", "jdoe", "100-000001-01", "007"]),
            (5, ["", "2024-01-06", "asmith", "", ""]),
            (6, ["11631", "", "", "", ""]),
        ] {
            for (col, value) in values.iter().enumerate() {
                sheet.set_text(&address(col, row), value).unwrap();
            }
        }
        // typed into the log as a number
        sheet.set_cell(ECO_COLUMN, 5, Cell::number(11630.0));
        sheet
    }

    fn log_book(path: impl Into<std::path::PathBuf>) -> XlsxWorkbook {
        let mut book = XlsxWorkbook::new(path);
        book.insert_sheet(log_sheet()).unwrap();
        book
    }

    #[test]
    fn test_load_and_lookup() {
        let log = EcoLog::load(log_book("eco_log.xlsx")).unwrap();

        assert_eq!(log.len(), 2);
        let record = log.lookup("11629").unwrap();
        assert_eq!(record.row, 4);
        assert_eq!(record.initiator.as_deref(), Some("jdoe"));
        assert_eq!(record.primary_part.as_deref(), Some("100-000001-01"));
        assert!(log.lookup("11630").is_some());
        // no date assigned
        assert!(log.lookup("11631").is_none());
    }

    #[test]
    fn test_primary_candidate_ranking() {
        let cats = categories();
        let introduced = vec![
            item("100-000001-01", 5),
            item("139-000001-01", 6),
            item("142-000001-01", 7),
            item("142-000002-01", 8),
        ];
        assert_eq!(cats.primary_candidate(&introduced).unwrap().row, 7);
        assert_eq!(cats.primary_candidate(&introduced[..2]).unwrap().row, 6);
        assert_eq!(cats.primary_candidate(&introduced[..1]).unwrap().row, 5);
        assert!(cats.primary_candidate(&[]).is_none());
    }

    #[test]
    fn test_check_primary_part() {
        let record = EcoRecord {
            eco: "11629".to_string(),
            row: 4,
            date_assigned: "2024-01-05".to_string(),
            initiator: None,
            primary_part: Some("100-000001-01".to_string()),
            project_data: None,
        };
        let mut diags = Diagnostics::new();

        let listed = vec![item("100-000001-01", 5), item("142-000001-01", 6)];
        assert!(check_primary_part(Some(&record), "11629", &listed, &categories(), &mut diags).is_none());
        assert!(diags.is_empty());

        let unlisted = vec![item("139-000001-01", 5), item("142-000001-01", 6)];
        let suggestion =
            check_primary_part(Some(&record), "11629", &unlisted, &categories(), &mut diags);
        assert_eq!(suggestion.unwrap().part, "142-000001-01");
        assert_eq!(diags.count(DiagnosticKind::EcoLogPrimaryPart), 1);

        check_primary_part(None, "99999", &unlisted, &categories(), &mut diags);
        assert_eq!(diags.count(DiagnosticKind::EcoLogMissing), 1);
    }

    #[test]
    fn test_set_primary_part_persists() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("eco_log.xlsx");
        log_book(&path).save().unwrap();

        let mut log = EcoLog::load(XlsxWorkbook::open(&path).unwrap()).unwrap();
        log.set_primary_part("11630", "142-000001-01").unwrap();
        log.save().unwrap();
        assert!(log.set_primary_part("1", "x").is_err());

        let reopened = EcoLog::load(XlsxWorkbook::open(&path).unwrap()).unwrap();
        assert_eq!(
            reopened.lookup("11630").unwrap().primary_part.as_deref(),
            Some("142-000001-01")
        );
        assert_eq!(
            reopened.lookup("11629").unwrap().primary_part.as_deref(),
            Some("100-000001-01")
        );
    }

    #[test]
    fn test_write_back_keeps_untouched_cells() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("eco_log.xlsx");
        log_book(&path).save().unwrap();

        let mut log = EcoLog::load(XlsxWorkbook::open(&path).unwrap()).unwrap();
        log.set_primary_part("11629", "142-000001-01").unwrap();
        log.save().unwrap();

        let book = XlsxWorkbook::open(&path).unwrap();
        let sheet = book.sheet(ECO_LOG_SHEET).unwrap();
        assert_eq!(sheet.text("D4").as_deref(), Some("142-000001-01"));
        assert_eq!(sheet.get("E4").unwrap().value, CellValue::Text("007".to_string()));
        assert_eq!(sheet.get("A5").unwrap().value, CellValue::Number(11630.0));
        assert_eq!(sheet.text("A1").as_deref(), Some("ECO Log"));
    }
}
