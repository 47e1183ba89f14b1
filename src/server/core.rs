use log::{error, info};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::DriveError;
use crate::server::connection::handle_connection;
use crate::storage::StorageRoot;

/// State shared by every connection: fixed at startup, never mutated.
#[derive(Debug)]
pub struct AppContext {
    pub root: StorageRoot,
    pub config: ServerConfig,
}

pub struct Server {
    listener: TcpListener,
    context: Arc<AppContext>,
}

impl Server {
    /// Prepares the storage root and binds the listening socket.
    ///
    /// Both failures are fatal for the process.
    pub async fn bind(config: ServerConfig) -> Result<Self, DriveError> {
        let root = StorageRoot::open(&config.storage_root_path()).map_err(|e| {
            error!(
                "Failed to prepare storage root {}: {}",
                config.storage_root, e
            );
            e
        })?;

        let listen_addr = config.listen_addr();
        let listener = match TcpListener::bind(&listen_addr).await {
            Ok(listener) => {
                info!("Server bound to {}", listen_addr);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", listen_addr, e);
                return Err(DriveError::Io(e));
            }
        };

        Ok(Self {
            listener,
            context: Arc::new(AppContext { root, config }),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever, one task per connection.
    pub async fn start(self) {
        match self.local_addr() {
            Ok(addr) => info!(
                "RyDrive serving http://{} from {}",
                addr,
                self.context.root.path().display()
            ),
            Err(e) => error!("Listener has no local address: {}", e),
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let context = Arc::clone(&self.context);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        handle_connection(stream, addr, context).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}
