//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds a socket and spawns a Connection task for each
//! incoming client, keyed by its remote address.

use crate::network::Connection;
use crate::state::{Hub, Identity};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument};

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    hub: Arc<Hub>,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr, hub: Arc<Hub>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "Listener bound");
        Ok(Self { listener, hub })
    }

    /// The bound address. Useful when binding to port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections until accept fails.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(%addr, error = %e, "Failed to set TCP_NODELAY");
                    }

                    let identity = Identity::from(addr);
                    let connection = Connection::new(identity, stream, Arc::clone(&self.hub));
                    tokio::spawn(async move {
                        if let Err(e) = connection.run().await {
                            error!(%addr, error = %e, "Connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    return Err(e.into());
                }
            }
        }
    }
}
