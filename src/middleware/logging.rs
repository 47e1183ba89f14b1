//! Logging middleware
//!
//! Provides request logging functionality.

use hyper::StatusCode;
use log::{info, warn};
use std::net::SocketAddr;

/// Log a client connection
pub fn log_connection(client_addr: &SocketAddr) {
    info!("Client connected: {}", client_addr);
}

/// Log a handled request with its response status
pub fn log_request(client_addr: &SocketAddr, method: &str, target: &str, status: StatusCode) {
    if status.is_client_error() || status.is_server_error() {
        warn!("{} \"{} {}\" {}", client_addr, method, target, status.as_u16());
    } else {
        info!("{} \"{} {}\" {}", client_addr, method, target, status.as_u16());
    }
}
