//! Downloads of a user's transactions as CSV or JSON files.

mod csv;
mod endpoint;
mod json;

pub use endpoint::export_transactions;
