//! Length-prefixed framing for stream transports.
//!
//! Each frame is a big-endian `u32` payload length followed by the payload.

use crate::error::{ProtocolError, ProtocolResult};

/// Length of the frame header.
pub const FRAME_HEADER_LEN: usize = 4;

/// Largest payload a frame may carry.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Prefixes `payload` with its length.
pub fn encode_frame(payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(payload.len()));
    }
    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Returns the payload length announced by a frame header.
pub fn frame_len(header: [u8; FRAME_HEADER_LEN]) -> ProtocolResult<usize> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    Ok(len)
}
