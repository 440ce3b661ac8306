//! Part Number Reserve Log - the catalog of reserved and released part revisions
//!
//! The log is a workbook with a `PN_Rev` tab: part number, comment, revision,
//! change order and description in columns A through E, one reservation per
//! row under a heading row.

use std::collections::HashSet;
use std::path::PathBuf;

use indexmap::IndexSet;
use thiserror::Error;

use crate::core::catalog::PartCatalog;
use crate::core::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::core::part::{is_valid_part_number, item_key};
use crate::core::revision::{is_valid_revision, Alphabet};
use crate::eco::classifier::IntroducedItem;
use crate::sheet::{find_sheet, ColumnLayout, ColumnRole, SheetError, Spreadsheet};

pub const RESERVE_LOG_SHEET: &str = "PN_Rev";

const PART_COLUMN: usize = 0;
const COMMENT_COLUMN: usize = 1;
const REVISION_COLUMN: usize = 2;
const CHANGE_ORDER_COLUMN: usize = 3;

#[derive(Debug, Error)]
pub enum ReserveLogError {
    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("{} does not look like a PN Reserve Log: cell A1 of PN_Rev is blank", path.display())]
    NotAReserveLog { path: PathBuf },
}

/// The loaded reserve log
#[derive(Debug, Clone)]
pub struct ReserveLog {
    catalog: PartCatalog,
    duplicates: PartCatalog,
    load_warnings: Vec<Diagnostic>,
}

impl ReserveLog {
    /// Load the `PN_Rev` tab of a reserve-log workbook
    pub fn load<S: Spreadsheet + ?Sized>(
        book: &S,
        alphabet: Alphabet,
    ) -> Result<Self, ReserveLogError> {
        let sheet = find_sheet(book, &[RESERVE_LOG_SHEET])?;
        if sheet.text("A1").is_none() {
            return Err(ReserveLogError::NotAReserveLog {
                path: book.path().to_path_buf(),
            });
        }

        let mut log = Self {
            catalog: PartCatalog::new(alphabet),
            duplicates: PartCatalog::new(alphabet),
            load_warnings: Vec::new(),
        };

        // row 1 holds the headings
        for row in 2..=sheet.row_count() {
            let (Some(part), Some(revision), Some(change_order)) = (
                sheet.text_at(PART_COLUMN, row),
                sheet.text_at(REVISION_COLUMN, row),
                sheet.text_at(CHANGE_ORDER_COLUMN, row),
            ) else {
                continue;
            };
            let comment = sheet.text_at(COMMENT_COLUMN, row).unwrap_or_default();

            if log.catalog.has_part(&part, &revision) {
                log.load_warnings.push(Diagnostic::warning(
                    DiagnosticKind::ReserveLogLoad,
                    format!(
                        "Duplicate CI {} in PN Reserve Log row {}.",
                        item_key(&part, &revision),
                        row
                    ),
                ));
                // already validated when first recorded
                let _ = log.duplicates.add_part(&part, &revision, Some(&change_order));
                continue;
            }

            if log
                .catalog
                .add_part(&part, &revision, Some(&change_order))
                .is_err()
                && !comment.to_lowercase().contains("waive")
            {
                let reason = if !is_valid_part_number(&part) {
                    format!("illegal part number {}", part)
                } else if !is_valid_revision(&revision, alphabet) {
                    format!("illegal revision {}", revision)
                } else {
                    "unreadable entry".to_string()
                };
                log.load_warnings.push(Diagnostic::warning(
                    DiagnosticKind::ReserveLogLoad,
                    format!("Skipping PN Reserve Log row {} -- {}.", row, reason),
                ));
            }
        }

        Ok(log)
    }

    pub fn catalog(&self) -> &PartCatalog {
        &self.catalog
    }

    pub fn duplicates(&self) -> &PartCatalog {
        &self.duplicates
    }

    /// Problems found while reading the log
    pub fn load_warnings(&self) -> &[Diagnostic] {
        &self.load_warnings
    }

    pub fn is_duplicated(&self, part: &str, revision: &str) -> bool {
        self.duplicates.has_part(part, revision)
    }

    /// Warn about parts reserved against `change_order` that the form does not introduce
    pub fn check_reservations(
        &self,
        change_order: &str,
        introduced: &[IntroducedItem],
        diags: &mut Diagnostics,
    ) {
        let on_form: HashSet<String> = introduced.iter().map(IntroducedItem::key).collect();

        for (part, revision) in self.catalog.released_on(change_order) {
            let key = item_key(part.as_str(), revision.name());
            if !on_form.contains(&key) {
                diags.push(Diagnostic::warning(
                    DiagnosticKind::UnusedReservation,
                    format!(
                        "PN Reserve Log lists {} as released on ECO {}, but it is not a new CI on this ECO form.",
                        key, change_order
                    ),
                ));
            }
        }
    }
}

/// Cross-checks form rows against the reserve log during classification
///
/// Each missing part is reported once, however many rows name it.
#[derive(Debug)]
pub struct ReserveLogValidator<'a> {
    log: &'a ReserveLog,
    change_order: Option<String>,
    reported: IndexSet<String>,
    to_add: Vec<String>,
}

impl<'a> ReserveLogValidator<'a> {
    pub fn new(log: &'a ReserveLog, change_order: Option<&str>) -> Self {
        Self {
            log,
            change_order: change_order.map(|c| c.trim().to_string()),
            reported: IndexSet::new(),
            to_add: Vec::new(),
        }
    }

    /// Change order the log records for a part revision
    pub fn released_change_order(&self, part: &str, revision: &str) -> Option<&'a str> {
        self.log.catalog().change_order_for(part, revision)
    }

    /// Parts that should be added to the log, in form order
    pub fn missing(&self) -> &[String] {
        &self.to_add
    }

    /// Check a row introducing `part` at `revision`
    ///
    /// `previous` is the row's current revision, which the log's latest
    /// revision for the part should match.
    pub fn check_new_revision(
        &mut self,
        part: &str,
        revision: &str,
        previous: Option<&str>,
        row: u32,
        layout: &ColumnLayout,
        diags: &mut Diagnostics,
    ) {
        let key = item_key(part, revision);
        let cell = layout.cell_ref(ColumnRole::NewRevision, row);

        if self.log.is_duplicated(part, revision) {
            diags.push(
                Diagnostic::error(
                    DiagnosticKind::ReserveLogDuplicate,
                    format!(
                        "CI_Sheet row {} lists {}, which appears more than once in the PN Reserve Log.",
                        row, key
                    ),
                )
                .at(cell.clone()),
            );
        }

        let catalog = self.log.catalog();
        let current = self.change_order.as_deref().unwrap_or_default();

        if let Some(recorded) = catalog.change_order_for(part, revision) {
            if recorded != current {
                diags.push(
                    Diagnostic::error(
                        DiagnosticKind::ReserveLogConflict,
                        format!(
                            "CI_Sheet row {} lists new CI {}, but the PN Reserve Log says it was released on ECO {}, not ECO {}.",
                            row, key, recorded, current
                        ),
                    )
                    .at(cell),
                );
            }
            return;
        }

        if self.reported.insert(key.clone()) {
            diags.push(
                Diagnostic::warning(
                    DiagnosticKind::MissingFromReserveLog,
                    format!("CI_Sheet row {} - Add part {} to the PN Reserve Log.", row, key),
                )
                .at(cell.clone()),
            );
            self.to_add.push(key);
        }

        if let (Some(highest), Some(previous)) = (catalog.highest_revision(part), previous) {
            if highest.name() != previous.trim() {
                let expected = catalog
                    .next_revision(part)
                    .map(|r| r.to_string())
                    .unwrap_or_default();
                diags.push(
                    Diagnostic::warning(
                        DiagnosticKind::ReserveLogSequence,
                        format!(
                            "PN Reserve Log lists the latest rev for {} as {}, but CI_Sheet row {} gives current rev {}. Expected new rev {} instead of {}.",
                            part, highest, row, previous.trim(), expected, revision
                        ),
                    )
                    .at(cell),
                );
            }
        }
    }

    /// Check a row referencing `part` at `revision` as released on `change_order`
    pub fn check_released_revision(
        &mut self,
        part: &str,
        revision: &str,
        change_order: &str,
        row: u32,
        layout: &ColumnLayout,
        diags: &mut Diagnostics,
    ) {
        let key = item_key(part, revision);
        let cell = layout.cell_ref(ColumnRole::ChangeOrderRef, row);

        match self.log.catalog().change_order_for(part, revision) {
            Some(recorded) if recorded != change_order.trim() => diags.push(
                Diagnostic::error(
                    DiagnosticKind::ReserveLogConflict,
                    format!(
                        "On CI_Sheet row {}, {} is marked as released on ECO {}. This conflicts with the PN Reserve Log, where it is released on ECO {}.",
                        row, key, change_order.trim(), recorded
                    ),
                )
                .at(cell),
            ),
            Some(_) => {}
            None => {
                if self.reported.insert(key.clone()) {
                    diags.push(
                        Diagnostic::warning(
                            DiagnosticKind::MissingFromReserveLog,
                            format!(
                                "CI_Sheet row {} lists released part {}, which is not in the PN Reserve Log.",
                                row, key
                            ),
                        )
                        .at(cell),
                    );
                }
            }
        }
    }
}
