//! Column roles on the configuration-items tab and the layouts that place them

use std::fmt;

use super::column_letters;
use crate::core::diagnostics::CellRef;
use crate::core::revision::RevisionCode;

/// What a column of the configuration-items tab holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    AffectedPart,
    CurrentRevision,
    NewRevision,
    ChangeOrderRef,
    Description,
    MediaType,
    IsoVolumeName,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 7] = [
        ColumnRole::AffectedPart,
        ColumnRole::CurrentRevision,
        ColumnRole::NewRevision,
        ColumnRole::ChangeOrderRef,
        ColumnRole::Description,
        ColumnRole::MediaType,
        ColumnRole::IsoVolumeName,
    ];

    fn position(self) -> usize {
        match self {
            ColumnRole::AffectedPart => 0,
            ColumnRole::CurrentRevision => 1,
            ColumnRole::NewRevision => 2,
            ColumnRole::ChangeOrderRef => 3,
            ColumnRole::Description => 4,
            ColumnRole::MediaType => 5,
            ColumnRole::IsoVolumeName => 6,
        }
    }

    /// Heading used on the form for this column
    pub fn label(self) -> &'static str {
        match self {
            ColumnRole::AffectedPart => "P/N",
            ColumnRole::CurrentRevision => "current rev",
            ColumnRole::NewRevision => "new rev",
            ColumnRole::ChangeOrderRef => "ECO#",
            ColumnRole::Description => "description",
            ColumnRole::MediaType => "media type",
            ColumnRole::IsoVolumeName => "ISO volume name",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which column holds each role for one revision of the ECO form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: [usize; 7],
}

impl ColumnLayout {
    /// Forms up to B2: seven consecutive columns A through G
    pub const LEGACY: ColumnLayout = ColumnLayout {
        columns: [0, 1, 2, 3, 4, 5, 6],
    };

    /// Forms B1 and after B2: column D is unused, roles run A, B, C, E, F, G, H
    pub const CURRENT: ColumnLayout = ColumnLayout {
        columns: [0, 1, 2, 4, 5, 6, 7],
    };

    /// Pick the layout for a form revision
    pub fn for_form_revision(revision: &RevisionCode) -> Self {
        let last_legacy = RevisionCode::new_unchecked("B2");
        if revision.name() == "B1" || *revision > last_legacy {
            Self::CURRENT
        } else {
            Self::LEGACY
        }
    }

    /// Zero-based column index for a role
    pub fn index(&self, role: ColumnRole) -> usize {
        self.columns[role.position()]
    }

    pub fn letter(&self, role: ColumnRole) -> String {
        column_letters(self.index(role))
    }

    pub fn cell_ref(&self, role: ColumnRole, row: u32) -> CellRef {
        CellRef::new(self.letter(role), row)
    }
}
