//! Native-messaging frame codec.
//!
//! Every message is a 32-bit length in native byte order followed by that
//! many bytes of UTF-8 JSON.

// ============================================================================
// Imports
// ============================================================================

use std::io::{Error as IoError, ErrorKind};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Largest frame accepted from the host (the browser's own limit).
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

// ============================================================================
// Reading
// ============================================================================

/// Reads one raw frame body.
///
/// Returns `Ok(None)` on a clean end of stream before the length prefix.
///
/// # Errors
///
/// - [`Error::Protocol`] if the declared length exceeds [`MAX_FRAME_LEN`]
/// - [`Error::Io`] if the stream ends mid-prefix or mid-frame, or the read
///   fails
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 4];
    let mut filled = 0;
    while filled < prefix.len() {
        match reader.read(&mut prefix[filled..]).await? {
            0 if filled == 0 => return Ok(None),
            0 => {
                return Err(IoError::new(
                    ErrorKind::UnexpectedEof,
                    format!("truncated length prefix ({filled} of 4 bytes)"),
                )
                .into());
            }
            n => filled += n,
        }
    }

    let len = u32::from_ne_bytes(prefix) as usize;
    if len > MAX_FRAME_LEN {
        return Err(Error::protocol(format!(
            "Frame too large: {len} bytes (max {MAX_FRAME_LEN})"
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Reads and decodes one JSON frame.
///
/// # Errors
///
/// As [`read_frame`], plus [`Error::Json`] if the body does not decode.
pub async fn read_json<R, T>(reader: &mut R) -> Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    match read_frame(reader).await? {
        Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
        None => Ok(None),
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Encodes `message` as JSON and writes it as one frame.
///
/// # Errors
///
/// - [`Error::Json`] if serialization fails
/// - [`Error::Protocol`] if the body does not fit the length prefix
/// - [`Error::Io`] if the write fails
pub async fn write_json<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(message)?;
    let len = u32::try_from(body.len())
        .map_err(|_| Error::protocol(format!("Frame too large: {} bytes", body.len())))?;

    writer.write_all(&len.to_ne_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_frame_layout() {
        let mut buf = Vec::new();
        write_json(&mut buf, &json!({"v": 1})).await.expect("write");

        let body = br#"{"v":1}"#;
        assert_eq!(&buf[..4], &(body.len() as u32).to_ne_bytes());
        assert_eq!(&buf[4..], body);
    }

    #[tokio::test]
    async fn test_reads_consecutive_frames() {
        let mut buf = Vec::new();
        write_json(&mut buf, &json!({"n": 1})).await.expect("write");
        write_json(&mut buf, &json!({"n": 2})).await.expect("write");

        let mut reader = buf.as_slice();
        let first: Value = read_json(&mut reader).await.expect("read").expect("frame");
        let second: Value = read_json(&mut reader).await.expect("read").expect("frame");
        assert_eq!(first["n"], 1);
        assert_eq!(second["n"], 2);
        assert!(read_frame(&mut reader).await.expect("eof").is_none());
    }

    #[tokio::test]
    async fn test_rejects_oversize_frame() {
        let prefix = ((MAX_FRAME_LEN + 1) as u32).to_ne_bytes();
        let mut reader = &prefix[..];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_truncated_prefix_is_io_error() {
        let mut reader: &[u8] = &[1, 0];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_empty_stream_is_clean_eof() {
        let mut reader: &[u8] = &[];
        assert!(read_frame(&mut reader).await.expect("eof").is_none());
    }

    #[tokio::test]
    async fn test_truncated_body_is_io_error() {
        let mut buf = 10u32.to_ne_bytes().to_vec();
        buf.extend_from_slice(b"{}");
        let mut reader = buf.as_slice();
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_json_error() {
        let mut buf = 3u32.to_ne_bytes().to_vec();
        buf.extend_from_slice(b"{x}");
        let mut reader = buf.as_slice();
        let err = read_json::<_, Value>(&mut reader).await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
