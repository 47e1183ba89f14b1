//! Server core functionality
//!
//! This module contains the listener, the per-connection request loop and
//! the shared state handed to request handlers.

pub mod connection;
pub mod core;

pub use connection::handle_connection;
pub use core::{AppContext, Server};
