//! ECO form processing - reading, grouping and classifying configuration items

pub mod block;
pub mod classifier;
pub mod context;
pub mod form;
pub mod grouping;

pub use block::{ConfigurationItemBlock, EntryBuilder, LineEntry};
pub use classifier::{Extraction, ExtractionStats, IntroducedItem, RowClassifier};
pub use context::ValidationContext;
pub use form::{EcoForm, FormError, FormRow};
pub use grouping::{group_rows, WorkQueue};
