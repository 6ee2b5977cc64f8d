//! Payment-history analysis.
//!
//! Payment records are read-only inputs; this module derives the actual
//! spend series and flags duplicate charges for one billing period.

pub mod history;

pub use history::*;
