//! Valuation, depreciation and warranty tracking built on the hierarchy engine

pub mod depreciation;
pub mod integrity;
pub mod valuation;
pub mod warranty;

pub use depreciation::{straight_line, DepreciationPolicy};
pub use integrity::IntegrityReport;
pub use valuation::Valuation;
pub use warranty::WarrantyStatus;
