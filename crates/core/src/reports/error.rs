//! Report error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Range spans more months than allowed.
    #[error("Date range too large: {months} months (max {max})")]
    RangeTooLarge {
        /// Requested months.
        months: u32,
        /// Allowed months.
        max: u32,
    },
}
