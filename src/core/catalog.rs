//! Part catalog - every known part and its recorded revisions

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::part::{is_valid_part_number, Part, PartError, PartNumber};
use crate::core::revision::{Alphabet, RevisionCode, RevisionError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error(transparent)]
    Part(#[from] PartError),

    #[error(transparent)]
    Revision(#[from] RevisionError),
}

/// A keyed collection of parts, validated against one revision alphabet
#[derive(Debug, Clone, Default)]
pub struct PartCatalog {
    alphabet: Alphabet,
    parts: IndexMap<String, Part>,
}

impl PartCatalog {
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            alphabet,
            parts: IndexMap::new(),
        }
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Record `part` at `revision`, optionally released on `change_order`
    ///
    /// Returns `Ok(false)` when the pair is already present; the first record
    /// is kept. Nothing is recorded if either value is invalid.
    pub fn add_part(
        &mut self,
        part: &str,
        revision: &str,
        change_order: Option<&str>,
    ) -> Result<bool, CatalogError> {
        let number = PartNumber::parse(part)?;
        let mut code = RevisionCode::parse(revision, self.alphabet)?;
        if let Some(change_order) = change_order.map(str::trim).filter(|c| !c.is_empty()) {
            code = code.with_change_order(change_order);
        }

        let key = number.to_string();
        Ok(self
            .parts
            .entry(key)
            .or_insert_with(|| Part::new(number))
            .add_revision(code))
    }

    pub fn part(&self, part: &str) -> Option<&Part> {
        self.parts.get(part.trim())
    }

    pub fn has_part(&self, part: &str, revision: &str) -> bool {
        self.part(part).is_some_and(|p| p.has_revision(revision))
    }

    /// The change order recorded for a part at a revision
    pub fn change_order_for(&self, part: &str, revision: &str) -> Option<&str> {
        self.part(part)
            .and_then(|p| p.revision(revision))
            .and_then(RevisionCode::change_order)
    }

    pub fn highest_revision(&self, part: &str) -> Option<&RevisionCode> {
        self.part(part).and_then(Part::highest_revision)
    }

    /// The revision that should come after `current` for `part`
    pub fn expected_successor(
        &self,
        part: &str,
        current: &str,
    ) -> Result<RevisionCode, RevisionError> {
        if let Some(known) = self.part(part).and_then(|p| p.revision(current)) {
            return Ok(known.successor(self.alphabet));
        }

        RevisionCode::parse(current, self.alphabet).map(|code| code.successor(self.alphabet))
    }

    /// The revision the next release of `part` should carry
    ///
    /// `A` for a part the catalog has never seen; `None` if `part` is not a
    /// valid part number.
    pub fn next_revision(&self, part: &str) -> Option<RevisionCode> {
        if !is_valid_part_number(part.trim()) {
            return None;
        }

        let next = match self.highest_revision(part) {
            Some(highest) => highest.successor(self.alphabet),
            None => RevisionCode::initial().successor(self.alphabet),
        };
        Some(next)
    }

    /// Every (part, revision) pair released on `change_order`
    pub fn released_on(&self, change_order: &str) -> Vec<(&PartNumber, &RevisionCode)> {
        let change_order = change_order.trim();
        self.parts
            .values()
            .flat_map(|part| {
                part.revisions()
                    .filter(move |r| r.change_order() == Some(change_order))
                    .map(move |r| (part.number(), r))
            })
            .collect()
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
