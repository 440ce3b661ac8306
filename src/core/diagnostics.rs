//! Diagnostics collected while validating a form
//!
//! Every finding carries a severity. Errors block manifest generation; warnings
//! are reported and written to the warnings file. A sink can be attached so the
//! CLI prints findings as they are raised rather than at the end of a run.

use std::fmt;

/// How serious a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// What a finding is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A revision or media value on a row with no part number
    OrphanValue,
    InvalidPartNumber,
    MissingCurrentRevision,
    InvalidRevision,
    /// New revision is not the successor of the current one
    UnexpectedRevisionJump,
    /// A new revision row that also names a change order
    NewRevisionWithChangeOrder,
    MissingChangeOrder,
    /// Part repeated on the form without the `dup` marker
    UnmarkedDuplicate,
    /// `dup` marker on a part seen for the first time
    FalseDuplicate,
    /// The same released part claimed by two different change orders
    InconsistentRelease,
    MissingDescription,
    VolumeNameTooLong,
    MissingFirstMedia,
    FormRevision,
    MissingEcoNumber,
    ReleasedCountMismatch,
    ReserveLogLoad,
    ReserveLogDuplicate,
    ReserveLogConflict,
    MissingFromReserveLog,
    ReserveLogSequence,
    /// Reserved against this change order but absent from the form
    UnusedReservation,
    EcoLogMissing,
    EcoLogPrimaryPart,
}

/// A cell on the configuration-items tab (`C6`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub column: String,
    pub row: u32,
}

impl CellRef {
    pub fn new(column: impl Into<String>, row: u32) -> Self {
        Self {
            column: column.into(),
            row,
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub cell: Option<CellRef>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            cell: None,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            cell: None,
        }
    }

    /// Attach the cell the finding points at
    pub fn at(mut self, cell: CellRef) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

type Sink = Box<dyn FnMut(&Diagnostic)>;

/// Ordered collection of findings with an optional live sink
#[derive(Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    sink: Option<Sink>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect findings and also hand each one to `sink` as it arrives
    pub fn with_sink(sink: impl FnMut(&Diagnostic) + 'static) -> Self {
        Self {
            items: Vec::new(),
            sink: Some(Box::new(sink)),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if let Some(sink) = self.sink.as_mut() {
            sink(&diagnostic);
        }
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.push(diagnostic);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Number of findings of one kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("items", &self.items)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
