//! Media grouping - turn form rows into an ordered work queue of media sets
//!
//! A row with a media type opens a media set named after its part and revision;
//! following rows belong to it until the next media type. Sets on the
//! skip-list share one "skipped" group that is still validated but never
//! rendered.

use std::collections::HashMap;

use crate::core::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::eco::context::ValidationContext;
use crate::eco::form::{FormRow, FIRST_DATA_ROW};
use crate::sheet::{ColumnLayout, ColumnRole};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKind {
    /// Rows of one media set, rendered as one block
    MediaSet {
        key: String,
        media_label: String,
        set_name: String,
    },
    /// Rows of every skipped media set
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaGroup {
    pub kind: GroupKind,
    pub rows: Vec<FormRow>,
}

impl MediaGroup {
    fn media_set(media_label: &str, set_name: String) -> Self {
        Self {
            kind: GroupKind::MediaSet {
                key: format!("{}:{}", media_label, set_name),
                media_label: media_label.to_string(),
                set_name,
            },
            rows: Vec::new(),
        }
    }

    fn skipped() -> Self {
        Self {
            kind: GroupKind::Skipped,
            rows: Vec::new(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.kind == GroupKind::Skipped
    }
}

/// Media groups in processing order, plus item counts gathered while grouping
#[derive(Debug, Clone, Default)]
pub struct WorkQueue {
    pub groups: Vec<MediaGroup>,
    /// Rows with a part number
    pub total_items: usize,
    /// Rows introducing a new revision
    pub changed_items: usize,
    /// Part rows that fell into the skipped group
    pub skipped_items: usize,
}

/// Set name for the media set a row opens (`<part>-<revision>`)
fn set_name(row: &FormRow) -> String {
    let part = row.affected_part.as_deref().unwrap_or_default();
    let revision = row
        .new_revision
        .as_deref()
        .or(row.current_revision.as_deref())
        .unwrap_or_default();
    format!("{}-{}", part, revision)
}

/// Group form rows by media set
pub fn group_rows(
    rows: &[FormRow],
    ctx: &ValidationContext<'_>,
    layout: &ColumnLayout,
    diags: &mut Diagnostics,
) -> WorkQueue {
    let mut queue = WorkQueue::default();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut skipped_slot: Option<usize> = None;
    let mut current: Option<usize> = None;

    if let Some(first) = rows.iter().find(|r| r.row == FIRST_DATA_ROW) {
        if first.media_type.is_none() {
            diags.push(
                Diagnostic::error(
                    DiagnosticKind::MissingFirstMedia,
                    format!(
                        "No media type in CI_Sheet cell {}. The first configuration item must name its media.",
                        layout.cell_ref(ColumnRole::MediaType, FIRST_DATA_ROW)
                    ),
                )
                .at(layout.cell_ref(ColumnRole::MediaType, FIRST_DATA_ROW)),
            );
        }
    }

    for row in rows.iter().filter(|r| !r.is_note()) {
        if row.affected_part.is_some() {
            queue.total_items += 1;
        }

        if let Some(media) = row.media_type.as_deref() {
            let slot = if ctx.skips_media(media) {
                *skipped_slot.get_or_insert_with(|| {
                    queue.groups.push(MediaGroup::skipped());
                    queue.groups.len() - 1
                })
            } else {
                let name = set_name(row);
                let label = media.trim();
                let key = format!("{}:{}", label, name);
                *slots.entry(key).or_insert_with(|| {
                    queue.groups.push(MediaGroup::media_set(label, name));
                    queue.groups.len() - 1
                })
            };
            current = Some(slot);
        }

        if row.introduces_revision() && current.is_some() {
            queue.changed_items += 1;
        }

        // rows before the first media set cannot be rendered anywhere
        let slot = match current {
            Some(slot) => slot,
            None => *skipped_slot.get_or_insert_with(|| {
                queue.groups.push(MediaGroup::skipped());
                queue.groups.len() - 1
            }),
        };

        let group = &mut queue.groups[slot];
        if group.is_skipped() && row.affected_part.is_some() {
            queue.skipped_items += 1;
        }
        group.rows.push(row.clone());
    }

    queue
}
