//! Core module - fundamental types and run configuration

pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod part;
pub mod revision;

pub use catalog::{CatalogError, PartCatalog};
pub use config::Config;
pub use diagnostics::{CellRef, Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use part::{is_valid_part_number, item_key, Part, PartError, PartNumber};
pub use revision::{is_valid_revision, Alphabet, RevisionCode, RevisionError};
