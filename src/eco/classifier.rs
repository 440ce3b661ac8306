//! Row classification - the per-row state machine that validates the form and
//! builds configuration-item blocks
//!
//! Rows are visited group by group in work-queue order. Each row passes through
//! the same column sequence: affected part, current revision, new revision,
//! change-order reference, description, media type and ISO volume name. Part,
//! revision and duplicate tracking carry across groups; the indent level resets
//! at the start of each group.

use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;

use indexmap::IndexMap;

use crate::core::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::core::part::{is_valid_part_number, item_key};
use crate::core::revision::{is_valid_revision, Alphabet, RevisionCode};
use crate::eco::block::{ConfigurationItemBlock, EntryBuilder};
use crate::eco::context::ValidationContext;
use crate::eco::form::{is_dup_marker, FormRow};
use crate::eco::grouping::{GroupKind, MediaGroup, WorkQueue};
use crate::sheet::{ColumnLayout, ColumnRole};
use crate::xref::reserve_log::ReserveLogValidator;

/// A part revision introduced on the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntroducedItem {
    pub part: String,
    pub revision: String,
    /// Form row that first introduced it
    pub row: u32,
}

impl IntroducedItem {
    pub fn key(&self) -> String {
        item_key(&self.part, &self.revision)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub total_items: usize,
    pub changed_items: usize,
    pub skipped_items: usize,
    pub blocks: usize,
}

/// Result of a classification pass
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Non-empty blocks keyed by `<media>:<set name>`, in form order
    pub blocks: IndexMap<String, ConfigurationItemBlock>,
    pub stats: ExtractionStats,
    pub introduced: Vec<IntroducedItem>,
    /// Part revisions that should be added to the reserve log
    pub missing_from_reserve_log: Vec<String>,
    /// Classification stopped early at an orphan value
    pub aborted: bool,
}

/// Cross-row classification state
pub struct RowClassifier<'c, 'a> {
    ctx: &'c ValidationContext<'a>,
    layout: ColumnLayout,
    reserve: Option<ReserveLogValidator<'a>>,
    current_part: String,
    current_revision: String,
    previous_revision: Option<String>,
    skip_current_media: bool,
    indent: u32,
    /// Item key -> row it was last listed on
    seen: HashMap<String, u32>,
    /// Item key -> (change order, row) for released-part references
    released: HashMap<String, (String, u32)>,
    introduced: Vec<IntroducedItem>,
    introduced_keys: HashSet<String>,
}

impl<'c, 'a> RowClassifier<'c, 'a> {
    pub fn new(ctx: &'c ValidationContext<'a>, layout: ColumnLayout) -> Self {
        let reserve = ctx
            .reserve_log
            .map(|log| ReserveLogValidator::new(log, ctx.change_order.as_deref()));

        Self {
            ctx,
            layout,
            reserve,
            current_part: String::new(),
            current_revision: String::new(),
            previous_revision: None,
            skip_current_media: false,
            indent: 0,
            seen: HashMap::new(),
            released: HashMap::new(),
            introduced: Vec::new(),
            introduced_keys: HashSet::new(),
        }
    }

    /// Classify every queued group and collect the rendered blocks
    pub fn extract(mut self, queue: WorkQueue, diags: &mut Diagnostics) -> Extraction {
        let mut extraction = Extraction {
            stats: ExtractionStats {
                total_items: queue.total_items,
                changed_items: queue.changed_items,
                skipped_items: queue.skipped_items,
                blocks: 0,
            },
            ..Extraction::default()
        };

        for group in &queue.groups {
            let (block, flow) = self.classify_group(group, diags);

            if let Some(block) = block.filter(|b| !b.is_empty()) {
                extraction.blocks.insert(block.key(), block);
            }
            if flow.is_break() {
                extraction.aborted = true;
                break;
            }
        }

        extraction.stats.blocks = extraction.blocks.len();
        extraction.missing_from_reserve_log = self
            .reserve
            .as_ref()
            .map(|r| r.missing().to_vec())
            .unwrap_or_default();
        extraction.introduced = self.introduced;
        extraction
    }

    /// Classify one group; skipped groups are validated but produce no block
    fn classify_group(
        &mut self,
        group: &MediaGroup,
        diags: &mut Diagnostics,
    ) -> (Option<ConfigurationItemBlock>, ControlFlow<()>) {
        let mut block = match &group.kind {
            GroupKind::MediaSet {
                media_label,
                set_name,
                ..
            } => ConfigurationItemBlock::new(media_label, set_name),
            GroupKind::Skipped => ConfigurationItemBlock::new("", ""),
        };

        self.indent = 0;
        let mut flow = ControlFlow::Continue(());
        for row in &group.rows {
            flow = self.classify_row(row, &mut block, diags);
            if flow.is_break() {
                break;
            }
        }

        if group.is_skipped() {
            return (None, flow);
        }

        // the row naming the media has no entry when it lacks a part number
        if !block.is_empty() {
            block.push_header();
        }
        (Some(block), flow)
    }

    fn classify_row(
        &mut self,
        row: &FormRow,
        block: &mut ConfigurationItemBlock,
        diags: &mut Diagnostics,
    ) -> ControlFlow<()> {
        let Some(part) = row.affected_part.as_deref() else {
            return self.check_orphan(row, diags);
        };

        let mut entry = EntryBuilder::new(part);
        self.current_part = part.to_string();
        if !is_valid_part_number(part) {
            diags.push(
                Diagnostic::error(
                    DiagnosticKind::InvalidPartNumber,
                    format!(
                        "CI_Sheet cell {} lists '{}', which is not a valid part number.",
                        self.cell(ColumnRole::AffectedPart, row.row),
                        part
                    ),
                )
                .at(self.layout.cell_ref(ColumnRole::AffectedPart, row.row)),
            );
        }

        self.check_current_revision(row, &mut entry, diags);
        if let Some(new_revision) = row.new_revision.as_deref() {
            self.check_new_revision(row, new_revision, &mut entry, diags);
        }
        self.check_change_order(row, diags);
        self.apply_description(row, &mut entry, diags);

        if let Some(media) = row.media_type.as_deref() {
            self.skip_current_media = self.ctx.skips_media(media);
            if !self.skip_current_media {
                block.push_header();
            }
        }
        // in new-parts-only mode every row is validated but only new revisions are listed
        let listed = !self.ctx.new_parts_only || row.introduces_revision();
        if !self.skip_current_media && listed {
            block.push_entry(entry);
        }

        self.check_volume_name(row, diags);
        ControlFlow::Continue(())
    }

    /// A row without a part number may not carry a revision or media type
    fn check_orphan(&self, row: &FormRow, diags: &mut Diagnostics) -> ControlFlow<()> {
        let orphan = if row.current_revision.is_some() {
            Some((ColumnRole::CurrentRevision, "Rev"))
        } else if row.media_type.is_some() {
            Some((ColumnRole::MediaType, "Media type"))
        } else {
            None
        };

        let Some((role, what)) = orphan else {
            return ControlFlow::Continue(());
        };

        diags.push(
            Diagnostic::error(
                DiagnosticKind::OrphanValue,
                format!(
                    "{} present in CI_Sheet cell {}, but no part number in cell {}.",
                    what,
                    self.cell(role, row.row),
                    self.cell(ColumnRole::AffectedPart, row.row)
                ),
            )
            .at(self.layout.cell_ref(role, row.row)),
        );

        if self.ctx.abort_on_orphan_values {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn check_current_revision(
        &mut self,
        row: &FormRow,
        entry: &mut EntryBuilder,
        diags: &mut Diagnostics,
    ) {
        match row.current_revision.as_deref() {
            None => diags.push(
                Diagnostic::error(
                    DiagnosticKind::MissingCurrentRevision,
                    format!(
                        "P/N present in CI_Sheet cell {}, but no current rev in cell {}.",
                        self.cell(ColumnRole::AffectedPart, row.row),
                        self.cell(ColumnRole::CurrentRevision, row.row)
                    ),
                )
                .at(self.layout.cell_ref(ColumnRole::CurrentRevision, row.row)),
            ),
            Some(current) => {
                self.check_revision_format(current, ColumnRole::CurrentRevision, row.row, diags)
            }
        }

        let current = row.current_revision.clone().unwrap_or_default();
        if row.new_revision.is_none() {
            entry.set_revision(&current);
            self.current_revision = current;
            self.previous_revision = None;
        } else {
            self.previous_revision = Some(current);
        }
    }

    /// Error on a malformed revision, or warn when non-standard revisions are allowed
    fn check_revision_format(
        &self,
        revision: &str,
        role: ColumnRole,
        row: u32,
        diags: &mut Diagnostics,
    ) {
        if is_valid_revision(revision, Alphabet::Standard) {
            return;
        }

        let cell = self.layout.cell_ref(role, row);
        if self.ctx.allow_nonstandard_revisions && is_valid_revision(revision, self.ctx.alphabet) {
            diags.push(
                Diagnostic::warning(
                    DiagnosticKind::InvalidRevision,
                    format!(
                        "Non-standard rev '{}' in CI_Sheet cell {} accepted by override.",
                        revision, cell
                    ),
                )
                .at(cell),
            );
        } else {
            diags.push(
                Diagnostic::error(
                    DiagnosticKind::InvalidRevision,
                    format!("Invalid rev '{}' in CI_Sheet cell {}.", revision, cell),
                )
                .at(cell),
            );
        }
    }

    fn check_new_revision(
        &mut self,
        row: &FormRow,
        new_revision: &str,
        entry: &mut EntryBuilder,
        diags: &mut Diagnostics,
    ) {
        self.check_revision_format(new_revision, ColumnRole::NewRevision, row.row, diags);

        let alphabet = self.ctx.alphabet;
        if let Some(current) = row.current_revision.as_deref() {
            if let Ok(code) = RevisionCode::parse(current, alphabet) {
                let expected = code.successor(alphabet);
                if expected.name() != new_revision {
                    diags.push(
                        Diagnostic::warning(
                            DiagnosticKind::UnexpectedRevisionJump,
                            format!(
                                "CI_Sheet cell {} lists new rev '{}'. Expected '{}', the first valid rev after current rev {} (cell {}).",
                                self.cell(ColumnRole::NewRevision, row.row),
                                new_revision,
                                expected,
                                current,
                                self.cell(ColumnRole::CurrentRevision, row.row)
                            ),
                        )
                        .at(self.layout.cell_ref(ColumnRole::NewRevision, row.row)),
                    );
                }
            }
        }

        if let Some(change_order) = row.change_order.as_deref() {
            if !is_dup_marker(change_order) {
                diags.push(
                    Diagnostic::error(
                        DiagnosticKind::NewRevisionWithChangeOrder,
                        format!(
                            "CI_Sheet row {} has a new rev, so cell {} must be blank or 'dup', not '{}'.",
                            row.row,
                            self.cell(ColumnRole::ChangeOrderRef, row.row),
                            change_order
                        ),
                    )
                    .at(self.layout.cell_ref(ColumnRole::ChangeOrderRef, row.row)),
                );
            }
        }

        self.current_revision = new_revision.to_string();
        entry.set_revision(new_revision);

        let part = self.current_part.clone();
        if self.introduced_keys.insert(item_key(&part, new_revision)) {
            self.introduced.push(IntroducedItem {
                part: part.clone(),
                revision: new_revision.to_string(),
                row: row.row,
            });
        }

        if let Some(reserve) = self.reserve.as_mut() {
            reserve.check_new_revision(
                &part,
                new_revision,
                self.previous_revision.as_deref(),
                row.row,
                &self.layout,
                diags,
            );
        }
    }

    fn check_change_order(&mut self, row: &FormRow, diags: &mut Diagnostics) {
        let key = item_key(&self.current_part, &self.current_revision);
        let cell = self.layout.cell_ref(ColumnRole::ChangeOrderRef, row.row);
        let marker = row.change_order.as_deref();
        let is_dup = marker.is_some_and(is_dup_marker);

        if row.new_revision.is_some() {
            match (self.seen.get(&key), is_dup) {
                (Some(last_row), false) => diags.push(
                    Diagnostic::warning(
                        DiagnosticKind::UnmarkedDuplicate,
                        format!(
                            "CI_Sheet row {} repeats {} but cell {} is not marked 'dup'. Last listed on row {}.",
                            row.row, key, cell, last_row
                        ),
                    )
                    .at(cell.clone()),
                ),
                (None, true) => diags.push(
                    Diagnostic::warning(
                        DiagnosticKind::FalseDuplicate,
                        format!(
                            "CI_Sheet cell {} marks {} as 'dup', but it has not been listed before.",
                            cell, key
                        ),
                    )
                    .at(cell.clone()),
                ),
                _ => {}
            }
        } else {
            self.check_released_reference(row, &key, marker, is_dup, diags);
        }

        self.seen.insert(key, row.row);
    }

    /// A row without a new revision must name the change order that released it
    fn check_released_reference(
        &mut self,
        row: &FormRow,
        key: &str,
        marker: Option<&str>,
        is_dup: bool,
        diags: &mut Diagnostics,
    ) {
        let cell = self.layout.cell_ref(ColumnRole::ChangeOrderRef, row.row);
        let part = self.current_part.clone();
        let revision = self.current_revision.clone();

        let Some(change_order) = marker else {
            let known = self
                .reserve
                .as_ref()
                .and_then(|r| r.released_change_order(&part, &revision));
            let message = match known {
                Some(eco) => format!(
                    "CI_Sheet row {} lists {}, which the PN Reserve Log lists as released on ECO {}. Cell {} should contain '{}'.",
                    row.row, key, eco, cell, eco
                ),
                None => format!(
                    "No new rev in CI_Sheet cell {}, so an ECO# is required in cell {}.",
                    self.cell(ColumnRole::NewRevision, row.row),
                    cell
                ),
            };
            diags.push(Diagnostic::error(DiagnosticKind::MissingChangeOrder, message).at(cell));
            return;
        };

        if is_dup {
            return;
        }

        if let Some(reserve) = self.reserve.as_mut() {
            reserve.check_released_revision(
                &part,
                &revision,
                change_order,
                row.row,
                &self.layout,
                diags,
            );
        }

        match self.released.get(key) {
            Some((earlier, earlier_row)) if earlier != change_order => diags.push(
                Diagnostic::error(
                    DiagnosticKind::InconsistentRelease,
                    format!(
                        "On CI_Sheet row {}, {} is marked as released on ECO {}. This conflicts with row {}, where it is marked as released on ECO {}.",
                        row.row, key, change_order, earlier_row, earlier
                    ),
                )
                .at(cell),
            ),
            Some(_) => {}
            None => {
                self.released
                    .insert(key.to_string(), (change_order.to_string(), row.row));
            }
        }
    }

    fn apply_description(
        &mut self,
        row: &FormRow,
        entry: &mut EntryBuilder,
        diags: &mut Diagnostics,
    ) {
        match row.description.as_deref() {
            Some(description) => entry.set_description(description),
            None => diags.push(
                Diagnostic::error(
                    DiagnosticKind::MissingDescription,
                    format!(
                        "P/N present in CI_Sheet cell {}, but no description in cell {}.",
                        self.cell(ColumnRole::AffectedPart, row.row),
                        self.cell(ColumnRole::Description, row.row)
                    ),
                )
                .at(self.layout.cell_ref(ColumnRole::Description, row.row)),
            ),
        }

        let level = row.indent;
        let reduced = level < self.indent;
        self.indent = level;

        entry.set_indent(level);
        if reduced && level == 0 {
            entry.separate();
        }
    }

    fn check_volume_name(&self, row: &FormRow, diags: &mut Diagnostics) {
        let Some(name) = row.iso_volume_name.as_deref() else {
            return;
        };

        let length = name.replace(".iso", "").trim().chars().count();
        if length > self.ctx.max_volume_name_len {
            let cell = self.layout.cell_ref(ColumnRole::IsoVolumeName, row.row);
            diags.push(
                Diagnostic::warning(
                    DiagnosticKind::VolumeNameTooLong,
                    format!(
                        "ISO name in CI_Sheet cell {} is {} chars. Is the volume name <= {} chars?",
                        cell, length, self.ctx.max_volume_name_len
                    ),
                )
                .at(cell),
            );
        }
    }

    fn cell(&self, role: ColumnRole, row: u32) -> String {
        self.layout.cell_ref(role, row).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eco::grouping::group_rows;
    use crate::sheet::{address, Sheet, XlsxWorkbook};
    use crate::xref::reserve_log::{ReserveLog, RESERVE_LOG_SHEET};

    const PN1: &str = "123-456789-01";
    const PN2: &str = "123-456789-02";
    const PN3: &str = "123-456789-03";

    fn run(rows: Vec<FormRow>, ctx: &ValidationContext<'_>) -> (Extraction, Diagnostics) {
        let mut diags = Diagnostics::new();
        let layout = ColumnLayout::CURRENT;
        let queue = group_rows(&rows, ctx, &layout, &mut diags);
        let extraction = RowClassifier::new(ctx, layout).extract(queue, &mut diags);
        (extraction, diags)
    }

    fn lines(extraction: &Extraction, key: &str) -> Vec<String> {
        extraction.blocks[key].render_lines(true)
    }

    fn reserve_log(rows: &[[&str; 4]]) -> ReserveLog {
        let mut sheet = Sheet::new(RESERVE_LOG_SHEET);
        sheet.set_text("A1", "Part Number").unwrap();
        for (idx, cells) in rows.iter().enumerate() {
            for (col, value) in cells.iter().enumerate() {
                sheet.set_text(&address(col, idx as u32 + 2), value).unwrap();
            }
        }
        let mut book = XlsxWorkbook::new("pn_reserve_log.xlsx");
        book.insert_sheet(sheet).unwrap();
        ReserveLog::load(&book, Alphabet::Standard).unwrap()
    }

    #[test]
    fn test_simple_release_block() {
        let rows = vec![FormRow::new(5)
            .part(PN1)
            .current("B")
            .new_rev("C")
            .description("desc")
            .media("CD")];
        let (extraction, diags) = run(rows, &ValidationContext::default());

        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(
            lines(&extraction, "CD:123-456789-01-C"),
            vec!["CD:123-456789-01-C", "123-456789-01 Rev. C  desc"]
        );
        assert_eq!(extraction.stats.changed_items, 1);
        assert_eq!(extraction.introduced[0].key(), "123-456789-01 Rev. C");
    }

    #[test]
    fn test_marked_duplicate_renders_once_without_warning() {
        let rows = vec![
            FormRow::new(5).part(PN1).current("B").new_rev("C").description("desc").media("CD"),
            FormRow::new(6).part(PN1).current("B").new_rev("C").change_order("dup").description("desc"),
        ];
        let (extraction, diags) = run(rows, &ValidationContext::default());

        assert!(diags.is_empty(), "{:?}", diags);
        assert_eq!(extraction.blocks.len(), 1);
        assert_eq!(lines(&extraction, "CD:123-456789-01-C").len(), 2);
        assert_eq!(extraction.stats.changed_items, 1);
    }

    #[test]
    fn test_unmarked_duplicate_warns() {
        let rows = vec![
            FormRow::new(5).part(PN1).current("B").new_rev("C").description("desc").media("CD"),
            FormRow::new(6).part(PN1).current("B").new_rev("C").description("desc"),
        ];
        let (_, diags) = run(rows, &ValidationContext::default());

        assert!(!diags.has_errors());
        assert_eq!(diags.count(DiagnosticKind::UnmarkedDuplicate), 1);
        assert!(diags.items()[0].message.contains("Last listed on row 5"));
    }

    #[test]
    fn test_false_duplicate_warns() {
        let rows = vec![FormRow::new(5)
            .part(PN1)
            .current("B")
            .new_rev("C")
            .change_order("dup")
            .description("desc")
            .media("CD")];
        let (_, diags) = run(rows, &ValidationContext::default());
        assert_eq!(diags.count(DiagnosticKind::FalseDuplicate), 1);
    }

    #[test]
    fn test_skipped_media_is_validated_but_not_rendered() {
        let rows = vec![
            FormRow::new(5).part(PN1).current("B").new_rev("C").description("cd").media("CD"),
            FormRow::new(6).part(PN2).current("A").new_rev("B").description("paper").media("SCIF"),
            FormRow::new(7).part(PN3).current("A").new_rev("B"),
        ];
        let (extraction, diags) = run(rows, &ValidationContext::default());

        assert_eq!(extraction.blocks.len(), 1);
        assert!(extraction.blocks.contains_key("CD:123-456789-01-C"));
        assert_eq!(extraction.stats.total_items, 3);
        assert_eq!(extraction.stats.skipped_items, 2);
        // row 7 is still validated
        assert_eq!(diags.count(DiagnosticKind::MissingDescription), 1);
    }

    #[test]
    fn test_all_media_renders_skip_listed_sets() {
        let rows = vec![
            FormRow::new(5).part(PN1).current("B").new_rev("C").description("cd").media("CD"),
            FormRow::new(6).part(PN2).current("A").new_rev("B").description("paper").media("SCIF"),
        ];
        let (extraction, _) = run(rows, &ValidationContext::default().with_all_media());
        assert_eq!(extraction.blocks.len(), 2);
    }

    #[test]
    fn test_revision_rules() {
        let rows = vec![
            FormRow::new(5).part(PN1).current("B").new_rev("D").description("jump").media("CD"),
            FormRow::new(6).part(PN2).current("I").description("bad"),
            FormRow::new(7).part(PN3).description("no rev"),
        ];
        let (_, diags) = run(rows, &ValidationContext::default());

        assert_eq!(diags.count(DiagnosticKind::UnexpectedRevisionJump), 1);
        assert!(diags
            .items()
            .iter()
            .any(|d| d.message.contains("Expected 'C'")));
        assert_eq!(diags.count(DiagnosticKind::InvalidRevision), 1);
        assert_eq!(diags.count(DiagnosticKind::MissingCurrentRevision), 1);
    }

    #[test]
    fn test_nonstandard_revisions_warn_under_override() {
        let rows = vec![FormRow::new(5)
            .part(PN1)
            .current("H")
            .new_rev("I")
            .description("override")
            .media("CD")];
        let ctx = ValidationContext::default().with_nonstandard_revisions(true);
        let (extraction, diags) = run(rows, &ctx);

        assert!(!diags.has_errors(), "{:?}", diags);
        assert_eq!(diags.count(DiagnosticKind::InvalidRevision), 1);
        // I is the successor of H when all letters are allowed
        assert_eq!(diags.count(DiagnosticKind::UnexpectedRevisionJump), 0);
        assert_eq!(extraction.blocks.len(), 1);
    }

    #[test]
    fn test_change_order_rules() {
        let rows = vec![
            FormRow::new(5).part(PN1).current("B").new_rev("C").change_order("11629").description("a").media("CD"),
            FormRow::new(6).part(PN2).current("A").description("b"),
            FormRow::new(7).part(PN3).current("A").change_order("100").description("c"),
            FormRow::new(8).part(PN3).current("A").change_order("200").description("c"),
        ];
        let (_, diags) = run(rows, &ValidationContext::default());

        assert_eq!(diags.count(DiagnosticKind::NewRevisionWithChangeOrder), 1);
        assert_eq!(diags.count(DiagnosticKind::MissingChangeOrder), 1);
        assert_eq!(diags.count(DiagnosticKind::InconsistentRelease), 1);
        assert!(diags
            .items()
            .iter()
            .any(|d| d.message.contains("conflicts with row 7")));
    }

    #[test]
    fn test_orphan_values() {
        let rows = vec![
            FormRow::new(5).part(PN1).current("B").description("a").change_order("1").media("CD"),
            FormRow::new(6).current("C"),
            FormRow::new(7).media("DVD"),
            FormRow::new(8),
            FormRow::new(9).part(PN2).current("A").description("b").change_order("1"),
        ];
        let (extraction, diags) = run(rows.clone(), &ValidationContext::default());
        assert_eq!(diags.count(DiagnosticKind::OrphanValue), 2);
        assert!(!extraction.aborted);

        let mut ctx = ValidationContext::default();
        ctx.abort_on_orphan_values = true;
        let (extraction, diags) = run(rows, &ctx);
        assert_eq!(diags.count(DiagnosticKind::OrphanValue), 1);
        assert!(extraction.aborted);
    }

    #[test]
    fn test_indentation_and_separator() {
        let rows = vec![
            FormRow::new(5).part(PN1).current("A").change_order("1").description("top").media("CD"),
            FormRow::new(6).part(PN2).current("A").change_order("1").description("child").indent(1),
            FormRow::new(7).part(PN3).current("A").change_order("1").description("next top"),
        ];
        let (extraction, diags) = run(rows, &ValidationContext::default());
        assert!(diags.is_empty(), "{:?}", diags);

        let rendered = lines(&extraction, "CD:123-456789-01-A");
        assert_eq!(rendered.len(), 5);
        assert!(rendered[2].starts_with("  123-456789-02 Rev. A"));
        assert_eq!(rendered[3], "");
        assert!(rendered[4].starts_with("123-456789-03 Rev. A"));
    }

    #[test]
    fn test_volume_name_length() {
        let rows = vec![
            FormRow::new(5).part(PN1).current("A").change_order("1").description("a").media("CD").volume("SIXTEEN_CHARS_OK.iso"),
            FormRow::new(6).part(PN2).current("A").change_order("1").description("b").media("DVD").volume("SEVENTEEN_CHARS_X"),
        ];
        let (_, diags) = run(rows, &ValidationContext::default());
        assert_eq!(diags.count(DiagnosticKind::VolumeNameTooLong), 1);
        assert_eq!(diags.items()[0].cell.as_ref().unwrap().to_string(), "H6");
    }

    #[test]
    fn test_reserve_log_cross_checks() {
        let log = reserve_log(&[[PN1, "", "B", "100"], [PN1, "", "C", "300"], [PN3, "", "A", "90"]]);
        let ctx = ValidationContext::default()
            .with_change_order(Some("300".to_string()))
            .with_reserve_log(&log);
        let rows = vec![
            FormRow::new(5).part(PN1).current("B").new_rev("C").description("listed").media("CD"),
            FormRow::new(6).part(PN2).current("A").new_rev("B").description("not listed"),
            FormRow::new(7).part(PN3).current("A").description("released elsewhere"),
        ];
        let (extraction, diags) = run(rows, &ctx);

        assert_eq!(diags.count(DiagnosticKind::MissingFromReserveLog), 1);
        assert_eq!(extraction.missing_from_reserve_log, vec!["123-456789-02 Rev. B"]);
        assert_eq!(diags.count(DiagnosticKind::MissingChangeOrder), 1);
        assert!(diags
            .errors()
            .any(|d| d.message.contains("Cell E7 should contain '90'")));
    }

    #[test]
    fn test_new_parts_only_blocks_get_headers() {
        let rows = vec![
            FormRow::new(5).part(PN1).current("A").change_order("1").description("old").media("CD"),
            FormRow::new(6).part(PN2).current("A").new_rev("B").description("new"),
        ];
        let ctx = ValidationContext::default().with_new_parts_only(true);
        let (extraction, _) = run(rows, &ctx);

        assert_eq!(
            lines(&extraction, "CD:123-456789-01-A"),
            vec!["CD:123-456789-01-A", "123-456789-02 Rev. B  new"]
        );
    }

    #[test]
    fn test_new_parts_only_still_validates_unlisted_rows() {
        let rows = vec![
            FormRow::new(5).part(PN1).current("B").new_rev("C").description("new").media("CD"),
            FormRow::new(6).part(PN2).current("A").description("no eco"),
        ];
        let ctx = ValidationContext::default().with_new_parts_only(true);
        let (extraction, diags) = run(rows, &ctx);

        assert_eq!(diags.count(DiagnosticKind::MissingChangeOrder), 1);
        assert!(diags.errors().any(|d| d.cell.as_ref().unwrap().to_string() == "E6"));
        assert_eq!(
            lines(&extraction, "CD:123-456789-01-C"),
            vec!["CD:123-456789-01-C", "123-456789-01 Rev. C  new"]
        );
    }
}
