//! RyDrive - Entry Point
//!
//! A self-hosted file storage server: browse, upload, download and preview
//! files kept under a single storage directory.

use log::{error, info};

use rydrive::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default `info` level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Launching RyDrive server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };

    tokio::select! {
        _ = server.start() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Server stopped");
        }
    }
}
