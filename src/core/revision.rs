//! Revision codes - validation, ordering and successor computation
//!
//! Revisions are drawn from a restricted alphabet that leaves out letters easily
//! confused with digits (I, O, Q, S, X, Z). A code is one of:
//! - the initial-release dash `-`
//! - a single redline digit `1`..`9`
//! - one or more letters, optionally followed by a single redline digit (`B`, `AA`, `B1`)
//!
//! Letter runs order like spreadsheet column names (`Y` < `AA`), a redline digit
//! sorts after the bare letter run it annotates (`B` < `B1` < `B2` < `C`), bare
//! digits sort before any letter code, and `-` sorts before everything.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// Revision characters allowed by the CM standard, in rank order
pub const STANDARD_REV_CHARS: &str = "-123456789ABCDEFGHJKLMNPRTUVWY";

/// Standard characters plus the visually ambiguous letters, in rank order
pub const PERMISSIVE_REV_CHARS: &str = "-123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Which revision alphabet is active for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alphabet {
    /// The CM standard alphabet (no I, O, Q, S, X, Z)
    #[default]
    Standard,
    /// All letters allowed; selected when an approved exception overrides the standard
    Permissive,
}

impl Alphabet {
    /// The ordered characters of this alphabet
    pub fn chars(&self) -> &'static str {
        match self {
            Alphabet::Standard => STANDARD_REV_CHARS,
            Alphabet::Permissive => PERMISSIVE_REV_CHARS,
        }
    }

    /// Check if a character belongs to this alphabet
    pub fn contains(&self, c: char) -> bool {
        self.chars().contains(c)
    }

    /// The first letter of this alphabet strictly after `c`
    fn next_letter(&self, c: char) -> Option<char> {
        self.chars()
            .chars()
            .find(|l| l.is_ascii_alphabetic() && *l > c)
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alphabet::Standard => write!(f, "standard"),
            Alphabet::Permissive => write!(f, "permissive"),
        }
    }
}

/// Errors raised when constructing a revision code
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RevisionError {
    #[error("'{0}' is not a valid revision")]
    Invalid(String),
}

/// Check whether `text` is a well-formed revision under `alphabet`
///
/// The text is checked as given; callers trim cell values first.
pub fn is_valid_revision(text: &str, alphabet: Alphabet) -> bool {
    if text.is_empty() {
        return false;
    }

    let mut has_digit = false;

    for c in text.chars() {
        if !alphabet.contains(c) {
            return false;
        }

        // the dash is only legal on its own
        if c == '-' && text.len() > 1 {
            return false;
        }

        if c.is_ascii_digit() {
            if has_digit {
                return false;
            }
            has_digit = true;
        } else if c.is_ascii_alphabetic() && has_digit {
            // letters never follow a digit
            return false;
        }
    }

    true
}

/// A validated revision code, optionally tagged with the change order that released it
#[derive(Debug, Clone)]
pub struct RevisionCode {
    name: String,
    change_order: Option<String>,
}

impl RevisionCode {
    /// Parse a revision from cell text under the given alphabet
    pub fn parse(text: &str, alphabet: Alphabet) -> Result<Self, RevisionError> {
        let name = text.trim();
        if !is_valid_revision(name, alphabet) {
            return Err(RevisionError::Invalid(name.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            change_order: None,
        })
    }

    /// Parse a numeric redline revision (a spreadsheet may store `1` as a number)
    pub fn from_number(number: u32, alphabet: Alphabet) -> Result<Self, RevisionError> {
        Self::parse(&number.to_string(), alphabet)
    }

    /// The initial-release revision `-`
    pub fn initial() -> Self {
        Self::new_unchecked("-")
    }

    /// Build a code from a literal known to be valid
    pub(crate) fn new_unchecked(name: &str) -> Self {
        Self {
            name: name.to_string(),
            change_order: None,
        }
    }

    /// Attach the change order that released this revision
    pub fn with_change_order(mut self, change_order: impl Into<String>) -> Self {
        self.change_order = Some(change_order.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn change_order(&self) -> Option<&str> {
        self.change_order.as_deref()
    }

    /// The letter run of the code (empty for `-` and bare digits)
    fn letters(&self) -> &str {
        self.name.trim_end_matches(|c: char| c.is_ascii_digit() || c == '-')
    }

    /// The redline digit, if any
    fn redline(&self) -> Option<u32> {
        self.name.chars().last().and_then(|c| c.to_digit(10))
    }

    fn sort_key(&self) -> (u8, usize, Vec<usize>, Option<u32>) {
        if self.name == "-" {
            return (0, 0, Vec::new(), None);
        }

        let letters = self.letters();
        let ranks = letters
            .chars()
            .map(|c| PERMISSIVE_REV_CHARS.find(c).unwrap_or(usize::MAX))
            .collect();

        (1, letters.len(), ranks, self.redline())
    }

    /// The first revision after this one under `alphabet`
    ///
    /// `-` and bare digits advance to `A`; a redline digit is dropped and the
    /// letter run advanced (`B1` -> `C`); the last letter carries (`Y` -> `AA`,
    /// `AY` -> `BA`). The result is always valid under `alphabet`.
    pub fn successor(&self, alphabet: Alphabet) -> RevisionCode {
        RevisionCode {
            name: increment_letters(self.letters(), alphabet),
            change_order: None,
        }
    }
}

fn increment_letters(letters: &str, alphabet: Alphabet) -> String {
    match letters.char_indices().last() {
        None => "A".to_string(),
        Some((idx, last)) => {
            let head = &letters[..idx];
            match alphabet.next_letter(last) {
                Some(next) => format!("{}{}", head, next),
                None => format!("{}A", increment_letters(head, alphabet)),
            }
        }
    }
}

impl PartialEq for RevisionCode {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RevisionCode {}

impl PartialOrd for RevisionCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RevisionCode {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.name == other.name {
            return Ordering::Equal;
        }
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for RevisionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
