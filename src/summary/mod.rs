//! Summaries of a user's income and expenses over a period.

mod aggregation;
mod endpoint;

pub use endpoint::get_summary;
