//! Part numbers and the revision history of a single part

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::revision::RevisionCode;

/// `NNN-NNNNNN-NN`: a three-digit prefix, six-digit body and two-digit suffix
static PART_NUMBER_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[0-9]{3}-[0-9]{6}-[0-9]{2}$").expect("part number pattern is valid")
});

/// Check whether `text` is a well-formed part number
pub fn is_valid_part_number(text: &str) -> bool {
    PART_NUMBER_RE.is_match(text)
}

/// The label used for a part at a revision (`123-456789-01 Rev. C`)
///
/// Also serves as the identity of a configuration item when looking for
/// duplicates across a form.
pub fn item_key(part: &str, revision: &str) -> String {
    format!("{} Rev. {}", part.trim(), revision.trim())
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PartError {
    #[error("'{0}' is not a valid part number")]
    Invalid(String),
}

/// A validated part number
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartNumber(String);

impl PartNumber {
    pub fn parse(text: &str) -> Result<Self, PartError> {
        let text = text.trim();
        if is_valid_part_number(text) {
            Ok(Self(text.to_string()))
        } else {
            Err(PartError::Invalid(text.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The three-digit category prefix (`142` for executables, `139` for source)
    pub fn prefix(&self) -> &str {
        &self.0[..3]
    }
}

impl FromStr for PartNumber {
    type Err = PartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PartNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A part and every revision recorded for it
///
/// The highest revision is tracked as revisions are added, so it is `None`
/// exactly when no revision has been recorded.
#[derive(Debug, Clone)]
pub struct Part {
    number: PartNumber,
    revisions: IndexMap<String, RevisionCode>,
    highest: Option<RevisionCode>,
}

impl Part {
    pub fn new(number: PartNumber) -> Self {
        Self {
            number,
            revisions: IndexMap::new(),
            highest: None,
        }
    }

    pub fn number(&self) -> &PartNumber {
        &self.number
    }

    pub fn has_revision(&self, revision: &str) -> bool {
        self.revisions.contains_key(revision.trim())
    }

    pub fn revision(&self, revision: &str) -> Option<&RevisionCode> {
        self.revisions.get(revision.trim())
    }

    /// Record a revision; returns false if it was already present
    ///
    /// The first record of a revision wins, including its change order.
    pub fn add_revision(&mut self, revision: RevisionCode) -> bool {
        if self.revisions.contains_key(revision.name()) {
            return false;
        }

        let is_highest = self
            .highest
            .as_ref()
            .map_or(true, |highest| revision > *highest);
        if is_highest {
            self.highest = Some(revision.clone());
        }

        self.revisions.insert(revision.name().to_string(), revision);
        true
    }

    pub fn highest_revision(&self) -> Option<&RevisionCode> {
        self.highest.as_ref()
    }

    /// Revisions in the order they were recorded
    pub fn revisions(&self) -> impl Iterator<Item = &RevisionCode> {
        self.revisions.values()
    }

    pub fn revision_count(&self) -> usize {
        self.revisions.len()
    }
}
