//! Framed wire codec.
//!
//! # Wire Protocol
//!
//! Every message is one frame:
//! - Bytes 0-3: payload length, big-endian `u32`
//! - Remaining: `bincode` payload
//!
//! Frames larger than [`MAX_FRAME_LEN`] are rejected on both ends.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest accepted payload (64 KiB).
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Errors from reading or writing frames.
#[derive(Debug, Error)]
pub enum WireError {
    /// Socket-level failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection between frames.
    #[error("connection closed")]
    Closed,

    /// Declared or encoded length above [`MAX_FRAME_LEN`].
    #[error("frame of {len} bytes exceeds maximum of {MAX_FRAME_LEN}")]
    FrameTooLarge {
        /// Offending length.
        len: usize,
    },

    /// Payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Encode `message` and write it as one frame.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = bincode::serialize(message)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge { len: payload.len() });
    }
    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame and decode it.
///
/// Returns [`WireError::Closed`] on a clean end of stream before the length
/// prefix.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, WireError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(WireError::Closed),
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge { len });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(bincode::deserialize(&payload)?)
}
