//! Historical expense reports.
//!
//! Extends the aggregation rules over arbitrary month, quarter and year
//! windows. A subscription only counts in periods that begin on or after its
//! start date.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ReportError;
pub use service::ReportEngine;
pub use types::*;
