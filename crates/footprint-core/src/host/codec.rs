//! Native messaging framing: a 32-bit native-endian length followed by UTF-8 JSON.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame the browser will send to a host
pub const MAX_INBOUND_FRAME: usize = 64 * 1024 * 1024;

/// Largest frame the browser accepts from a host
pub const MAX_OUTBOUND_FRAME: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Whether the stream is still aligned on a frame boundary after this error
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Json(_))
    }
}

/// Read one frame, `Ok(None)` on a clean end of stream
///
/// # Errors
///
/// Returns an error on I/O failure, an oversized length prefix, or undecodable JSON.
/// Only [`FrameError::Json`] leaves the stream usable.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, FrameError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut prefix = [0u8; 4];
    match reader.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let size = usize::try_from(u32::from_ne_bytes(prefix)).unwrap_or(usize::MAX);
    if size > MAX_INBOUND_FRAME {
        return Err(FrameError::TooLarge {
            size,
            limit: MAX_INBOUND_FRAME,
        });
    }

    let mut body = vec![0u8; size];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}

/// Write one frame and flush it
///
/// # Errors
///
/// Returns an error if the message does not serialize, exceeds
/// [`MAX_OUTBOUND_FRAME`], or the write fails. Oversized frames are not written.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(message)?;
    let size = u32::try_from(body.len())
        .ok()
        .filter(|_| body.len() <= MAX_OUTBOUND_FRAME)
        .ok_or(FrameError::TooLarge {
            size: body.len(),
            limit: MAX_OUTBOUND_FRAME,
        })?;

    writer.write_all(&size.to_ne_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_frame_layout() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &json!({"a": 1})).await.unwrap();

        let body = br#"{"a":1}"#;
        assert_eq!(&buf[..4], &(body.len() as u32).to_ne_bytes());
        assert_eq!(&buf[4..], body);

        let mut reader = buf.as_slice();
        let decoded: Option<Value> = read_frame(&mut reader).await.unwrap();
        assert_eq!(decoded, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_clean_eof() {
        let mut reader: &[u8] = &[];
        let decoded: Option<Value> = read_frame(&mut reader).await.unwrap();
        assert_eq!(decoded, None);
    }

    #[tokio::test]
    async fn test_truncated_body_is_io_error() {
        let mut buf = 10u32.to_ne_bytes().to_vec();
        buf.extend_from_slice(b"{}");
        let mut reader = buf.as_slice();
        let err = read_frame::<_, Value>(&mut reader).await.unwrap_err();
        assert!(matches!(err, FrameError::Io(_)));
        assert!(!err.is_recoverable());
    }

    #[tokio::test]
    async fn test_oversized_prefix_rejected() {
        let buf = u32::MAX.to_ne_bytes();
        let mut reader = buf.as_slice();
        let err = read_frame::<_, Value>(&mut reader).await.unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_malformed_json_keeps_stream_aligned() {
        let mut buf = 3u32.to_ne_bytes().to_vec();
        buf.extend_from_slice(b"{{{");
        write_frame(&mut buf, &json!(true)).await.unwrap();

        let mut reader = buf.as_slice();
        let err = read_frame::<_, Value>(&mut reader).await.unwrap_err();
        assert!(err.is_recoverable());
        let next: Option<Value> = read_frame(&mut reader).await.unwrap();
        assert_eq!(next, Some(json!(true)));
    }

    #[tokio::test]
    async fn test_oversized_outbound_not_written() {
        let mut buf = Vec::new();
        let text = "x".repeat(MAX_OUTBOUND_FRAME);
        let err = write_frame(&mut buf, &json!({ "text": text })).await.unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { .. }));
        assert!(buf.is_empty());
    }
}
