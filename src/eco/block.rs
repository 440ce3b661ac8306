//! Configuration-item blocks and their two-column rendering

use std::collections::HashSet;

use crate::core::part::item_key;

/// Spaces between the label and description columns
const COLUMN_GAP: usize = 2;

/// One line of a rendered block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEntry {
    /// `<media>:<set name>` heading
    Header(String),
    /// Blank line marking a return to the top indent level
    Separator,
    Item { label: String, description: String },
}

/// Accumulates one row's contribution before it is committed to a block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryBuilder {
    part: String,
    revision: Option<String>,
    description: String,
    indent: u32,
    separated: bool,
}

impl EntryBuilder {
    pub fn new(part: &str) -> Self {
        Self {
            part: part.trim().to_string(),
            ..Self::default()
        }
    }

    /// Set the revision shown in the label; a later call replaces an earlier one
    pub fn set_revision(&mut self, revision: &str) {
        let revision = revision.trim();
        self.revision = (!revision.is_empty()).then(|| revision.to_string());
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.trim().to_string();
    }

    pub fn set_indent(&mut self, indent: u32) {
        self.indent = indent;
    }

    /// Precede the entry with a separator line
    pub fn separate(&mut self) {
        self.separated = true;
    }

    /// The unindented label (`123-456789-01 Rev. C`)
    pub fn part_revision(&self) -> String {
        match &self.revision {
            Some(revision) => item_key(&self.part, revision),
            None => self.part.clone(),
        }
    }

    fn into_lines(self) -> Vec<LineEntry> {
        let mut lines = Vec::with_capacity(2);
        if self.separated {
            lines.push(LineEntry::Separator);
        }
        lines.push(LineEntry::Item {
            label: format!("{}{}", "  ".repeat(self.indent as usize), self.part_revision()),
            description: self.description,
        });
        lines
    }
}

/// The rendered content of one media set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationItemBlock {
    media_label: String,
    set_name: String,
    entries: Vec<LineEntry>,
    seen: HashSet<String>,
}

impl ConfigurationItemBlock {
    pub fn new(media_label: &str, set_name: &str) -> Self {
        Self {
            media_label: media_label.trim().to_string(),
            set_name: set_name.to_string(),
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// `<media>:<set name>`
    pub fn key(&self) -> String {
        format!("{}:{}", self.media_label, self.set_name)
    }

    pub fn media_label(&self) -> &str {
        &self.media_label
    }

    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    pub fn entries(&self) -> &[LineEntry] {
        &self.entries
    }

    pub fn has_header(&self) -> bool {
        self.entries.iter().any(|e| matches!(e, LineEntry::Header(_)))
    }

    /// Add the heading line if the block does not have one yet
    pub fn push_header(&mut self) {
        if !self.has_header() {
            self.entries.insert(0, LineEntry::Header(self.key()));
        }
    }

    /// Commit a finished entry; a part and revision already in the block is dropped
    pub fn push_entry(&mut self, entry: EntryBuilder) -> bool {
        if !self.seen.insert(entry.part_revision()) {
            return false;
        }
        self.entries.extend(entry.into_lines());
        true
    }

    pub fn item_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, LineEntry::Item { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Render as a two-column table, one line per entry
    ///
    /// Labels are padded to the widest label (headers included) so the
    /// descriptions line up whether or not the header is written.
    pub fn render_lines(&self, include_header: bool) -> Vec<String> {
        let width = self
            .entries
            .iter()
            .map(|e| match e {
                LineEntry::Header(text) => text.chars().count(),
                LineEntry::Item { label, .. } => label.chars().count(),
                LineEntry::Separator => 0,
            })
            .max()
            .unwrap_or(0);

        self.entries
            .iter()
            .filter_map(|e| match e {
                LineEntry::Header(text) => include_header.then(|| text.clone()),
                LineEntry::Separator => Some(String::new()),
                LineEntry::Item { label, description } => Some(
                    format!(
                        "{:<width$}{}{}",
                        label,
                        " ".repeat(COLUMN_GAP),
                        description,
                        width = width
                    )
                    .trim_end()
                    .to_string(),
                ),
            })
            .collect()
    }
}
