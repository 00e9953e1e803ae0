use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use super::wire::{read_frame, write_frame};
use crate::domain::{GreetReply, GreetRequest, PeerError};
use crate::ports::{PeerChannel, PeerConnector};

/// Opens TCP channels to peers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpPeerConnector;

impl TcpPeerConnector {
    /// Create a connector.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PeerConnector for TcpPeerConnector {
    type Channel = TcpPeerChannel;

    async fn connect(&self, address: &str) -> Result<TcpPeerChannel, PeerError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| PeerError::connect_failed(address, e))?;
        let _ = stream.set_nodelay(true);
        Ok(TcpPeerChannel {
            address: address.to_string(),
            stream: Mutex::new(stream),
        })
    }
}

/// A long-lived TCP connection to one peer.
///
/// Calls on the same channel are serialized; each greet is one request
/// frame followed by one reply frame.
#[derive(Debug)]
pub struct TcpPeerChannel {
    address: String,
    stream: Mutex<TcpStream>,
}

impl TcpPeerChannel {
    /// Address this channel is connected to.
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl PeerChannel for TcpPeerChannel {
    async fn greet(&self, caller: &str) -> Result<GreetReply, PeerError> {
        let mut stream = self.stream.lock().await;
        write_frame(&mut *stream, &GreetRequest::new(caller))
            .await
            .map_err(|e| PeerError::greet_failed(&self.address, e))?;
        read_frame(&mut *stream)
            .await
            .map_err(|e| PeerError::greet_failed(&self.address, e))
    }
}
