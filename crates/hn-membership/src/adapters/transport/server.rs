use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::wire::{read_frame, write_frame, WireError};
use crate::domain::{GreetReply, GreetRequest};
use crate::ports::GreetHandler;

/// Inbound TCP server for the Liveness Protocol.
///
/// Binding and serving are separate steps so the bound address is known
/// (and can be registered) before the first connection is accepted.
pub struct GreetServer {
    listener: TcpListener,
}

impl GreetServer {
    /// Bind the listening socket.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the address cannot be bound.
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Answer greets with `handler` until `shutdown` turns `true`.
    ///
    /// Each connection is served on its own task, so a slow peer never
    /// blocks others. Open connections are closed on shutdown as well.
    pub async fn serve(self, handler: Arc<dyn GreetHandler>, mut shutdown: watch::Receiver<bool>) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "Greet server listening");
        }

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let handler = Arc::clone(&handler);
                        tokio::spawn(serve_connection(stream, remote, handler, shutdown.clone()));
                    }
                    Err(e) => warn!(error = %e, "Failed to accept connection"),
                },
                _ = shutdown.changed() => {
                    info!("Greet server shutting down");
                    return;
                }
            }
        }
    }
}

/// Answer greets on one connection until the peer hangs up.
async fn serve_connection(
    mut stream: TcpStream,
    remote: SocketAddr,
    handler: Arc<dyn GreetHandler>,
    mut shutdown: watch::Receiver<bool>,
) {
    let _ = stream.set_nodelay(true);
    loop {
        let frame = tokio::select! {
            biased;
            _ = shutdown.changed() => {
                debug!(%remote, "Closing connection on shutdown");
                return;
            }
            frame = read_frame::<_, GreetRequest>(&mut stream) => frame,
        };
        let request: GreetRequest = match frame {
            Ok(request) => request,
            Err(WireError::Closed) => {
                debug!(%remote, "Peer closed connection");
                return;
            }
            Err(e) => {
                warn!(%remote, error = %e, "Dropping connection after bad frame");
                return;
            }
        };

        let reply: GreetReply = handler.greet(request);
        if let Err(e) = write_frame(&mut stream, &reply).await {
            warn!(%remote, error = %e, "Failed to send greet reply");
            return;
        }
    }
}
