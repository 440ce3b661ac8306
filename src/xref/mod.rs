//! Cross-reference validators - checks against the reserve log and the ECO log

pub mod eco_log;
pub mod reserve_log;

pub use eco_log::{check_primary_part, EcoLog, EcoLogError, EcoRecord, PartCategories};
pub use reserve_log::{ReserveLog, ReserveLogError, ReserveLogValidator};
