//! One write/read/compare cycle over an open connection.

use bytes::BytesMut;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use super::frame::{self, DELIM};
use crate::context::ProbeContext;
use crate::dialer::with_timeout;

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub action: &'static str,
    pub success: bool,
}

/// Send `payload` as one frame, read the echoed frame and compare.
///
/// I/O errors and mismatches are logged and reported as a failed outcome;
/// they are never returned to the caller. The stream is left open.
pub async fn probe<S>(
    ctx: &ProbeContext,
    action: &'static str,
    payload: &[u8],
    stream: &mut S,
    limit: Option<Duration>,
) -> ProbeOutcome
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let success = match with_timeout(limit, write_and_read(stream, payload)).await {
        Ok(response) if frame::echo_matches(payload, &response) => {
            info!(app = %ctx.app, port = ctx.port, action, "OK");
            true
        }
        Ok(response) => {
            warn!(
                app = %ctx.app,
                port = ctx.port,
                action,
                expected_len = payload.len(),
                actual_len = response.len(),
                "FAIL: echo mismatch"
            );
            false
        }
        Err(e) => {
            warn!(app = %ctx.app, port = ctx.port, action, reason = %e, "FAIL");
            false
        }
    };

    ProbeOutcome { action, success }
}

/// Write `payload || DELIM`, flush, then read up to and excluding the next
/// delimiter.
async fn write_and_read<S>(stream: &mut S, payload: &[u8]) -> io::Result<BytesMut>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(&frame::encode(payload)).await?;
    stream.flush().await?;

    let mut buffer = BytesMut::with_capacity(payload.len() + 1);
    let mut scanned = 0;

    loop {
        if let Some(pos) = frame::find_delim(&buffer[scanned..]) {
            buffer.truncate(scanned + pos);
            return Ok(buffer);
        }
        scanned = buffer.len();

        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "connection closed after {} bytes without {:?} delimiter",
                    buffer.len(),
                    DELIM as char
                ),
            ));
        }
    }
}
