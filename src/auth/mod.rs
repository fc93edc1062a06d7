//! Registration, log-in and the bearer token checks for protected routes.

mod log_in;
mod middleware;
mod register;
mod token;

pub use log_in::log_in;
pub use middleware::{AuthUser, auth_guard};
pub use register::register_user;

#[cfg(test)]
pub use token::create_token;
