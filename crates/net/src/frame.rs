//! Length-prefixed frame encoding/decoding
//!
//! Wire format: [4-byte big-endian length][JSON payload]
//! Maximum frame size: 1MB (sanity limit)
//!
//! Frames carry raw payloads. Decoding the JSON inside is left to the
//! caller so a malformed message can be skipped without dropping the
//! connection.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Maximum allowed frame size (1MB)
pub const MAX_FRAME_SIZE: u32 = 1024 * 1024;

fn map_eof(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::ConnectionClosed
    } else {
        Error::Io(e)
    }
}

/// Read a length-prefixed frame from a stream
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(map_eof)?;

    let len = u32::from_be_bytes(len_buf);
    if len == 0 {
        return Err(Error::EmptyFrame);
    }
    if len > MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge(len as usize));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await.map_err(map_eof)?;
    Ok(payload)
}

/// Write a length-prefixed frame to a stream
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_FRAME_SIZE)
        .ok_or(Error::FrameTooLarge(payload.len()))?;

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    // Flush to ensure delivery
    writer.flush().await?;

    Ok(())
}
