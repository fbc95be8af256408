//! TLV codec for event notification bodies
//!
//! Every notification body is a single TLV frame:
//! ```text
//! ┌──────────┬──────────┬─────────────────┐
//! │ Type ID  │ Length   │ Payload         │
//! │ (u16 LE) │ (u32 LE) │ (zerocopy)      │
//! └──────────┴──────────┴─────────────────┘
//! ```
//!
//! The type ID lets a dispatcher reject a body that was encoded for a
//! different method before reading the payload.

use crate::EventPayload;
use zerocopy::{AsBytes, FromBytes};

/// Header size: 2 bytes (type_id) + 4 bytes (length) = 6 bytes
pub const HEADER_SIZE: usize = 6;

/// Maximum payload size (16MB)
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Codec errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("Message too small: need {need} bytes, got {got}")]
    MessageTooSmall { need: usize, got: usize },

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Unexpected payload type: expected {expected}, got {got}")]
    TypeMismatch { expected: u16, got: u16 },

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Length mismatch: header says {expected}, buffer has {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Encode a payload to a TLV frame
pub fn encode_payload<M: EventPayload>(payload: &M) -> CodecResult<Vec<u8>> {
    let bytes = payload.as_bytes();

    if bytes.len() > MAX_PAYLOAD_SIZE {
        return Err(CodecError::PayloadTooLarge {
            size: bytes.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let mut tlv = Vec::with_capacity(HEADER_SIZE + bytes.len());
    tlv.extend_from_slice(&M::TYPE_ID.to_le_bytes());
    tlv.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    tlv.extend_from_slice(bytes);

    Ok(tlv)
}

/// TLV header parsed from wire format
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TlvHeader {
    pub type_id: u16,
    pub length: u32,
}

/// Parse TLV header from bytes
///
/// Returns header and offset to payload start. Trailing bytes after the
/// payload are rejected; a body is exactly one frame.
pub fn parse_header(bytes: &[u8]) -> CodecResult<(TlvHeader, usize)> {
    if bytes.len() < HEADER_SIZE {
        return Err(CodecError::MessageTooSmall {
            need: HEADER_SIZE,
            got: bytes.len(),
        });
    }

    let type_id = u16::from_le_bytes([bytes[0], bytes[1]]);
    let length = u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);

    if length as usize > MAX_PAYLOAD_SIZE {
        return Err(CodecError::PayloadTooLarge {
            size: length as usize,
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let payload_end = HEADER_SIZE + length as usize;
    if bytes.len() < payload_end {
        return Err(CodecError::MessageTooSmall {
            need: payload_end,
            got: bytes.len(),
        });
    }
    if bytes.len() > payload_end {
        return Err(CodecError::LengthMismatch {
            expected: length as usize,
            actual: bytes.len() - HEADER_SIZE,
        });
    }

    Ok((TlvHeader { type_id, length }, HEADER_SIZE))
}

/// Decode a TLV frame into a specific payload type
pub fn decode_payload<M: EventPayload>(bytes: &[u8]) -> CodecResult<M> {
    let (header, payload_offset) = parse_header(bytes)?;

    if header.type_id != M::TYPE_ID {
        return Err(CodecError::TypeMismatch {
            expected: M::TYPE_ID,
            got: header.type_id,
        });
    }

    let payload = &bytes[payload_offset..payload_offset + header.length as usize];

    M::read_from(payload).ok_or_else(|| {
        CodecError::DeserializationFailed(format!(
            "Failed to deserialize {}-byte payload (type {})",
            payload.len(),
            M::TYPE_ID
        ))
    })
}
