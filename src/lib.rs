//! cid: ECO form validator and CONTENTS_ID manifest generator
//!
//! Reads the configuration items listed on an engineering change order form,
//! checks them against the part number reserve log and the ECO log, and writes
//! one CONTENTS_ID manifest per media set.

pub mod cli;
pub mod core;
pub mod eco;
pub mod manifest;
pub mod sheet;
pub mod xref;
