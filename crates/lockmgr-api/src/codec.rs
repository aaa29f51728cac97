//! Framing codec for coordinator records
//!
//! Each record travels as a u32 big-endian length prefix followed by a
//! self-describing JSON body. One record in, one record out; the client
//! layer treats this module as an opaque encode/decode boundary.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Upper bound on a single frame body. Coordinator records are tiny;
/// anything larger means a corrupted or hostile stream.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

const LEN_PREFIX: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("record failed to serialize: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("malformed record body: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    Oversized(usize),
}

/// Encode one record into a complete wire frame.
pub fn encode<T: Serialize>(record: &T) -> Result<Bytes, CodecError> {
    let body = serde_json::to_vec(record).map_err(CodecError::Serialize)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(CodecError::Oversized(body.len()));
    }

    let mut frame = BytesMut::with_capacity(LEN_PREFIX + body.len());
    frame.put_u32(body.len() as u32);
    frame.put_slice(&body);
    Ok(frame.freeze())
}

/// Decode the next complete record out of `buf`, if one has arrived.
///
/// Returns `Ok(None)` when the buffer holds only a partial frame; the
/// caller should read more bytes and try again. A malformed body consumes
/// its frame, so the stream stays decodable afterwards.
pub fn decode<T: DeserializeOwned>(buf: &mut BytesMut) -> Result<Option<T>, CodecError> {
    if buf.len() < LEN_PREFIX {
        return Ok(None);
    }

    let body_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if body_len > MAX_FRAME_LEN {
        return Err(CodecError::Oversized(body_len));
    }
    if buf.len() < LEN_PREFIX + body_len {
        return Ok(None);
    }

    buf.advance(LEN_PREFIX);
    let body = buf.split_to(body_len);
    let record = serde_json::from_slice(&body).map_err(CodecError::Malformed)?;
    Ok(Some(record))
}
