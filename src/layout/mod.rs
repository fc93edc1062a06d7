//! Persists the arrangement of each user's dashboard widgets.

mod handlers;
mod store;

pub use handlers::{get_layout_endpoint, save_layout_endpoint};
pub use store::create_layout_table;
