// SPDX-License-Identifier: MIT

//! Length-prefixed JSON framing (`spec.md` §4.1).
//!
//! Each message on the wire is a 4-byte big-endian length prefix followed by
//! that many bytes of UTF-8 JSON. `read_message`/`write_message` operate on
//! the frame only; callers encode/decode the JSON payload themselves via
//! [`encode`]/[`decode`].

use crate::error::ProtocolError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// `(1<<32)-1` is reserved and always rejected, per the boundary behavior
/// pinned in `spec.md` §8 ("length prefix exactly equals `(1<<32)-1`").
/// Treating it as the max-size sentinel rather than a legal length keeps the
/// accept/reject choice the spec requires without imposing a separate,
/// smaller frame cap.
pub const MAX_MESSAGE_LEN: u32 = u32::MAX - 1;

/// Serialize `value` to its raw JSON bytes. No length prefix is added — see
/// [`write_message`] for the framed form.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize a message body previously produced by [`read_message`].
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(body)?)
}

/// Write `body` with its 4-byte big-endian length prefix.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    body: &[u8],
) -> Result<(), ProtocolError> {
    let len = u32::try_from(body.len()).map_err(|_| ProtocolError::MessageTooLarge {
        len: MAX_MESSAGE_LEN,
    })?;
    if len >= MAX_MESSAGE_LEN {
        return Err(ProtocolError::MessageTooLarge { len });
    }
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed message body. Blocks (asynchronously) until the
/// full body has arrived; a premature EOF mid-header or mid-body surfaces as
/// [`ProtocolError::ConnectionClosed`].
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len == 0 {
        return Err(ProtocolError::EmptyBody);
    }
    if len >= MAX_MESSAGE_LEN {
        return Err(ProtocolError::MessageTooLarge { len });
    }

    let mut body = vec![0u8; len as usize];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ProtocolError::ConnectionClosed,
            _ => ProtocolError::Io(e),
        })?;
    Ok(body)
}

/// Encode and write a value in one step.
pub async fn send<W: AsyncWrite + Unpin, T: Serialize>(
    writer: &mut W,
    value: &T,
) -> Result<(), ProtocolError> {
    write_message(writer, &encode(value)?).await
}

/// Read and decode a value in one step.
pub async fn receive<R: AsyncRead + Unpin, T: DeserializeOwned>(
    reader: &mut R,
) -> Result<T, ProtocolError> {
    decode(&read_message(reader).await?)
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
