//! Aggregation of raw feed rows into per-country cumulative series.
//!
//! Rows are grouped by country code, ordered by date, folded into running
//! totals with derived rates, and compared against a reference country to
//! find the countries whose reporting dates line up.

pub mod aggregate;
pub mod comparable;
pub mod types;
pub mod utility;
