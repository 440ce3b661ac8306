//! ECO form reading - cover sheet fields and configuration-item rows

use thiserror::Error;

use crate::core::diagnostics::{CellRef, Diagnostic, DiagnosticKind, Diagnostics};
use crate::core::revision::{Alphabet, RevisionCode};
use crate::sheet::{find_sheet, ColumnLayout, ColumnRole, Sheet, SheetError, Spreadsheet};

pub const COVER_SHEET_NAMES: [&str; 2] = ["CoverSheet", "NewCoverSheet"];
pub const CI_SHEET_NAMES: [&str; 2] = ["CI_Sheet", "PS1"];

const FORM_REVISION_CELL: &str = "A44";
const ECO_NUMBER_CELL: &str = "S2";
const RELEASED_COUNT_CELL: &str = "C16";

/// Rows above this are column headings
pub const FIRST_DATA_ROW: u32 = 5;

#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("Cover sheet cell A44 holds an invalid form revision '{0}'")]
    InvalidFormRevision(String),
}

/// Check if a change-order cell holds the duplicate marker
pub fn is_dup_marker(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("dup")
}

/// One row of the configuration-items tab, with cell text trimmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormRow {
    pub row: u32,
    pub affected_part: Option<String>,
    pub current_revision: Option<String>,
    pub new_revision: Option<String>,
    pub change_order: Option<String>,
    pub description: Option<String>,
    /// Paragraph indent of the description cell
    pub indent: u32,
    pub media_type: Option<String>,
    pub iso_volume_name: Option<String>,
}

impl FormRow {
    pub fn new(row: u32) -> Self {
        Self {
            row,
            ..Self::default()
        }
    }

    pub fn from_sheet(sheet: &Sheet, layout: &ColumnLayout, row: u32) -> Self {
        let text = |role| sheet.text_at(layout.index(role), row);
        let indent = sheet
            .cell(layout.index(ColumnRole::Description), row)
            .map(|cell| cell.indent)
            .unwrap_or(0);

        Self {
            row,
            affected_part: text(ColumnRole::AffectedPart),
            current_revision: text(ColumnRole::CurrentRevision),
            new_revision: text(ColumnRole::NewRevision),
            change_order: text(ColumnRole::ChangeOrderRef),
            description: text(ColumnRole::Description),
            indent,
            media_type: text(ColumnRole::MediaType),
            iso_volume_name: text(ColumnRole::IsoVolumeName),
        }
    }

    pub fn part(mut self, value: &str) -> Self {
        self.affected_part = Some(value.to_string());
        self
    }

    pub fn current(mut self, value: &str) -> Self {
        self.current_revision = Some(value.to_string());
        self
    }

    pub fn new_rev(mut self, value: &str) -> Self {
        self.new_revision = Some(value.to_string());
        self
    }

    pub fn change_order(mut self, value: &str) -> Self {
        self.change_order = Some(value.to_string());
        self
    }

    pub fn description(mut self, value: &str) -> Self {
        self.description = Some(value.to_string());
        self
    }

    pub fn indent(mut self, level: u32) -> Self {
        self.indent = level;
        self
    }

    pub fn media(mut self, value: &str) -> Self {
        self.media_type = Some(value.to_string());
        self
    }

    pub fn volume(mut self, value: &str) -> Self {
        self.iso_volume_name = Some(value.to_string());
        self
    }

    /// Rows annotated as notes carry no configuration item
    pub fn is_note(&self) -> bool {
        self.media_type
            .as_deref()
            .map(|m| m.trim().to_lowercase())
            .is_some_and(|m| m == "note" || m == "notes")
    }

    /// A new revision released by this change order (not a `dup` reference)
    pub fn introduces_revision(&self) -> bool {
        self.new_revision.is_some() && self.change_order.is_none()
    }

    pub fn is_blank(&self) -> bool {
        self.affected_part.is_none()
            && self.current_revision.is_none()
            && self.new_revision.is_none()
            && self.change_order.is_none()
            && self.description.is_none()
            && self.media_type.is_none()
            && self.iso_volume_name.is_none()
    }
}

/// The parts of an ECO form that drive extraction
#[derive(Debug, Clone)]
pub struct EcoForm {
    pub form_revision: RevisionCode,
    pub layout: ColumnLayout,
    /// Change order number from the cover sheet
    pub change_order: Option<String>,
    /// "Configuration items released" count from the cover sheet
    pub released_count: Option<String>,
    pub rows: Vec<FormRow>,
}

impl EcoForm {
    /// Read the cover sheet and the configuration-items tab
    pub fn read<S: Spreadsheet + ?Sized>(book: &S) -> Result<Self, FormError> {
        let cover = find_sheet(book, &COVER_SHEET_NAMES)?;
        let items = find_sheet(book, &CI_SHEET_NAMES)?;

        // forms that predate the revision cell are B1
        let form_revision = match cover.text(FORM_REVISION_CELL) {
            None => RevisionCode::new_unchecked("B1"),
            Some(text) => RevisionCode::parse(&text, Alphabet::Standard)
                .map_err(|_| FormError::InvalidFormRevision(text))?,
        };
        let layout = ColumnLayout::for_form_revision(&form_revision);

        let rows = (FIRST_DATA_ROW..=items.row_count())
            .map(|row| FormRow::from_sheet(items, &layout, row))
            .collect();

        Ok(Self {
            form_revision,
            layout,
            change_order: cover.text(ECO_NUMBER_CELL),
            released_count: cover.text(RELEASED_COUNT_CELL),
            rows,
        })
    }

    /// Warn when the form is older or newer than the newest supported revision
    pub fn check_form_revision(&self, newest: &RevisionCode, diags: &mut Diagnostics) {
        let cell = CellRef::new("A", 44);
        if self.form_revision < *newest {
            diags.push(
                Diagnostic::warning(
                    DiagnosticKind::FormRevision,
                    format!(
                        "ECO form revision {} is outdated; the current form is revision {}.",
                        self.form_revision, newest
                    ),
                )
                .at(cell),
            );
        } else if self.form_revision > *newest {
            diags.push(
                Diagnostic::warning(
                    DiagnosticKind::FormRevision,
                    format!(
                        "ECO form revision {} is newer than this tool supports (revision {}). Check for an updated tool.",
                        self.form_revision, newest
                    ),
                )
                .at(cell),
            );
        }
    }

    /// Warn when the cover sheet has no change order number
    pub fn check_change_order(&self, diags: &mut Diagnostics) {
        if self.change_order.is_none() {
            diags.push(
                Diagnostic::warning(
                    DiagnosticKind::MissingEcoNumber,
                    format!("No ECO number in cover sheet cell {}.", ECO_NUMBER_CELL),
                )
                .at(CellRef::new("S", 2)),
            );
        }
    }

    /// Compare the cover sheet's released count with the number of changed items
    ///
    /// Only forms after B2 carry the count.
    pub fn check_released_count(&self, changed_items: usize, diags: &mut Diagnostics) {
        if self.form_revision <= RevisionCode::new_unchecked("B2") {
            return;
        }

        let cell = CellRef::new("C", 16);
        match self.released_count.as_deref() {
            None => diags.push(
                Diagnostic::warning(
                    DiagnosticKind::ReleasedCountMismatch,
                    format!(
                        "Cover sheet cell {} (configuration items released) is blank; expected {}.",
                        RELEASED_COUNT_CELL, changed_items
                    ),
                )
                .at(cell),
            ),
            Some(count) if count != changed_items.to_string() => diags.push(
                Diagnostic::warning(
                    DiagnosticKind::ReleasedCountMismatch,
                    format!(
                        "Cover sheet cell {} says {} configuration items released, but the CI sheet lists {} changed items.",
                        RELEASED_COUNT_CELL, count, changed_items
                    ),
                )
                .at(cell),
            ),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{address, Cell, XlsxWorkbook};

    fn sheet_from(name: &str, rows: &[&[&str]]) -> Sheet {
        let mut sheet = Sheet::new(name);
        for (r, cells) in rows.iter().enumerate() {
            for (c, value) in cells.iter().enumerate() {
                sheet.set_text(&address(c, r as u32 + 1), value).unwrap();
            }
        }
        sheet
    }

    fn book_with(sheets: Vec<Sheet>) -> XlsxWorkbook {
        let mut book = XlsxWorkbook::new("form.xlsx");
        for sheet in sheets {
            book.insert_sheet(sheet).unwrap();
        }
        book
    }

    fn cover(form_rev: Option<&str>, eco: &str, released: Option<&str>) -> Sheet {
        let mut sheet = Sheet::new("CoverSheet");
        sheet.set_text("S2", eco).unwrap();
        if let Some(rev) = form_rev {
            sheet.set_text("A44", rev).unwrap();
        }
        if let Some(count) = released {
            sheet.set_text("C16", count).unwrap();
        }
        sheet
    }

    #[test]
    fn test_read_current_layout() {
        let mut items = sheet_from(
            "CI_Sheet",
            &[
                &["header"],
                &[],
                &[],
                &[],
                &["123-456789-01", "B", "C", "", "", "Widget", "CD", "WIDGET_C"],
            ],
        );
        items.set_cell(5, 5, Cell::text_value("Widget").indented(1));
        let book = book_with(vec![cover(Some("B3"), "11629", Some("1")), items]);

        let form = EcoForm::read(&book).unwrap();
        assert_eq!(form.form_revision.name(), "B3");
        assert_eq!(form.layout, ColumnLayout::CURRENT);
        assert_eq!(form.change_order.as_deref(), Some("11629"));
        assert_eq!(form.rows.len(), 1);

        let row = &form.rows[0];
        assert_eq!(row.row, 5);
        assert_eq!(row.affected_part.as_deref(), Some("123-456789-01"));
        assert_eq!(row.new_revision.as_deref(), Some("C"));
        assert_eq!(row.change_order, None);
        assert_eq!(row.description.as_deref(), Some("Widget"));
        assert_eq!(row.indent, 1);
        assert_eq!(row.media_type.as_deref(), Some("CD"));
        assert_eq!(row.iso_volume_name.as_deref(), Some("WIDGET_C"));
    }

    #[test]
    fn test_read_legacy_layout_and_fallback_tabs() {
        let book = book_with(vec![
            cover(Some("B"), "500", None).renamed("NewCoverSheet"),
            sheet_from(
                "PS1",
                &[&[], &[], &[], &[], &["123-456789-01", "A", "", "dup", "Widget", "CD"]],
            ),
        ]);

        let form = EcoForm::read(&book).unwrap();
        assert_eq!(form.layout, ColumnLayout::LEGACY);
        let row = &form.rows[0];
        assert_eq!(row.change_order.as_deref(), Some("dup"));
        assert_eq!(row.description.as_deref(), Some("Widget"));
        assert_eq!(row.media_type.as_deref(), Some("CD"));
    }

    #[test]
    fn test_blank_form_revision_means_b1() {
        let book = book_with(vec![cover(None, "1", None), Sheet::new("CI_Sheet")]);

        let form = EcoForm::read(&book).unwrap();
        assert_eq!(form.form_revision.name(), "B1");
        assert_eq!(form.layout, ColumnLayout::CURRENT);
        assert!(form.rows.is_empty());
    }

    #[test]
    fn test_missing_tabs_and_bad_revision_are_errors() {
        let mut book = book_with(vec![cover(Some("B3"), "1", None)]);
        assert!(matches!(
            EcoForm::read(&book),
            Err(FormError::Sheet(SheetError::MissingSheet { .. }))
        ));

        book.insert_sheet(cover(Some("BO"), "1", None)).unwrap();
        book.insert_sheet(Sheet::new("CI_Sheet")).unwrap();
        assert!(matches!(
            EcoForm::read(&book),
            Err(FormError::InvalidFormRevision(rev)) if rev == "BO"
        ));
    }

    #[test]
    fn test_form_revision_warnings() {
        let newest = RevisionCode::new_unchecked("B3");
        let form_at = |rev: &str| EcoForm {
            form_revision: RevisionCode::new_unchecked(rev),
            layout: ColumnLayout::CURRENT,
            change_order: Some("1".to_string()),
            released_count: None,
            rows: Vec::new(),
        };

        let mut diags = Diagnostics::new();
        form_at("B3").check_form_revision(&newest, &mut diags);
        assert!(diags.is_empty());

        form_at("B2").check_form_revision(&newest, &mut diags);
        form_at("C").check_form_revision(&newest, &mut diags);
        assert_eq!(diags.count(DiagnosticKind::FormRevision), 2);
        assert!(diags.items()[0].message.contains("outdated"));
        assert!(diags.items()[1].message.contains("newer"));
    }

    #[test]
    fn test_released_count_check() {
        let mut form = EcoForm {
            form_revision: RevisionCode::new_unchecked("B3"),
            layout: ColumnLayout::CURRENT,
            change_order: None,
            released_count: Some("2".to_string()),
            rows: Vec::new(),
        };

        let mut diags = Diagnostics::new();
        form.check_released_count(2, &mut diags);
        assert!(diags.is_empty());

        form.check_released_count(3, &mut diags);
        form.released_count = None;
        form.check_released_count(3, &mut diags);
        assert_eq!(diags.count(DiagnosticKind::ReleasedCountMismatch), 2);

        // legacy forms have no released count
        form.form_revision = RevisionCode::new_unchecked("B2");
        form.check_released_count(9, &mut diags);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_row_predicates() {
        assert!(FormRow::new(5).media("Notes").is_note());
        assert!(!FormRow::new(5).media("CD").is_note());
        assert!(FormRow::new(5).new_rev("B").introduces_revision());
        assert!(!FormRow::new(5).new_rev("B").change_order("dup").introduces_revision());
        assert!(FormRow::new(5).is_blank());
        assert!(is_dup_marker(" DUP "));
        assert!(!is_dup_marker("11629"));
    }
}
