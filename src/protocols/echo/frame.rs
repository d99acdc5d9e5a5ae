//! Echo frame encoding and matching.

use bytes::{BufMut, BytesMut};

/// Frame delimiter.
pub const DELIM: u8 = b'\n';

/// Encode a request frame: `payload || DELIM`.
pub fn encode(payload: &[u8]) -> BytesMut {
    let mut frame = BytesMut::with_capacity(payload.len() + 1);
    frame.put_slice(payload);
    frame.put_u8(DELIM);
    frame
}

/// Find the delimiter in buffer, returning its position.
pub fn find_delim(buffer: &[u8]) -> Option<usize> {
    buffer.iter().position(|&b| b == DELIM)
}

/// Compare a sent payload against the echoed one.
///
/// Letters are compared ignoring ASCII case; every other byte must match
/// exactly.
pub fn echo_matches(sent: &[u8], received: &[u8]) -> bool {
    sent.eq_ignore_ascii_case(received)
}
