//! Error handling
//!
//! Defines error types and handling for the RyDrive server.

pub mod handlers;
pub mod types;

pub use handlers::{api_error_status, error_to_status, handle_error};
pub use types::*;
