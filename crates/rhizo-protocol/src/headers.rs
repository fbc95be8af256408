//! Message headers for one-way remoting messages
//!
//! `RemotingHeaders` is what the transport hands over with every inbound
//! message. Actor-specific routing information travels as one named entry
//! (`ACTOR_HEADER_NAME`) inside it, encoded as:
//!
//! ```text
//! ┌──────────────┬─────────────┬─────────┬──────────────────┐
//! │ Interface ID │ Method ID   │ Kind    │ Actor ID payload │
//! │ (i32 LE)     │ (i32 LE)    │ (u8)    │ (per kind)       │
//! └──────────────┴─────────────┴─────────┴──────────────────┘
//!
//! kind 0 = Long   payload: i64 LE
//! kind 1 = Guid   payload: u128 LE
//! kind 2 = Named  payload: u32 LE length + UTF-8 bytes
//! ```
//!
//! Event notifications always address a Guid actor id: the subscription's
//! correlation token.

use crate::ids::{ActorId, CorrelationToken, EventInterfaceId, MethodId};
use std::collections::HashMap;
use thiserror::Error;

/// Name of the remoting header entry that carries `ActorMessageHeaders`
pub const ACTOR_HEADER_NAME: &str = "rhizo.actor";

const KIND_LONG: u8 = 0;
const KIND_GUID: u8 = 1;
const KIND_NAMED: u8 = 2;

/// Fixed prefix: interface id + method id + kind
const FIXED_SIZE: usize = 9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeaderError {
    #[error("Message carries no actor header")]
    Missing,

    #[error("Actor header truncated: need {need} bytes, got {got}")]
    Truncated { need: usize, got: usize },

    #[error("Unknown actor id kind: {0}")]
    UnknownActorIdKind(u8),

    #[error("Actor name is not valid UTF-8")]
    InvalidName,

    #[error("Actor header has {0} trailing bytes")]
    TrailingBytes(usize),
}

/// Generic headers of a remoting message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemotingHeaders {
    pub interface_id: i32,
    pub method_id: i32,
    headers: HashMap<String, Vec<u8>>,
}

impl RemotingHeaders {
    pub fn new(interface_id: i32, method_id: i32) -> Self {
        Self {
            interface_id,
            method_id,
            headers: HashMap::new(),
        }
    }

    /// Add (or replace) a named header entry
    pub fn add_header(&mut self, name: impl Into<String>, value: Vec<u8>) {
        self.headers.insert(name.into(), value);
    }

    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers.get(name).map(Vec::as_slice)
    }

    /// Headers for an event notification addressed to a subscription
    ///
    /// This is what the publishing side sends: the target actor id is the
    /// subscription's token, not the publishing actor.
    pub fn event_notification(
        token: CorrelationToken,
        interface_id: EventInterfaceId,
        method_id: MethodId,
    ) -> Self {
        ActorMessageHeaders {
            actor_id: token.to_actor_id(),
            interface_id,
            method_id,
        }
        .into_remoting_headers()
    }
}

/// Actor routing information extracted from `RemotingHeaders`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorMessageHeaders {
    pub actor_id: ActorId,
    pub interface_id: EventInterfaceId,
    pub method_id: MethodId,
}

impl ActorMessageHeaders {
    /// Extract actor headers; fails if the message is not an actor message
    pub fn from_remoting_headers(headers: &RemotingHeaders) -> Result<Self, HeaderError> {
        let bytes = headers
            .header(ACTOR_HEADER_NAME)
            .ok_or(HeaderError::Missing)?;
        Self::decode(bytes)
    }

    pub fn into_remoting_headers(self) -> RemotingHeaders {
        let mut headers = RemotingHeaders::new(self.interface_id.as_i32(), self.method_id.as_i32());
        headers.add_header(ACTOR_HEADER_NAME, self.encode());
        headers
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FIXED_SIZE + 16);
        buf.extend_from_slice(&self.interface_id.as_i32().to_le_bytes());
        buf.extend_from_slice(&self.method_id.as_i32().to_le_bytes());

        match &self.actor_id {
            ActorId::Long(id) => {
                buf.push(KIND_LONG);
                buf.extend_from_slice(&id.to_le_bytes());
            }
            ActorId::Guid(id) => {
                buf.push(KIND_GUID);
                buf.extend_from_slice(&id.to_le_bytes());
            }
            ActorId::Named(name) => {
                buf.push(KIND_NAMED);
                buf.extend_from_slice(&(name.len() as u32).to_le_bytes());
                buf.extend_from_slice(name.as_bytes());
            }
        }

        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, HeaderError> {
        let fixed = take(bytes, 0, FIXED_SIZE)?;
        let interface_id = i32::from_le_bytes([fixed[0], fixed[1], fixed[2], fixed[3]]);
        let method_id = i32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let kind = fixed[8];

        let (actor_id, end) = match kind {
            KIND_LONG => {
                let raw = take(bytes, FIXED_SIZE, 8)?;
                let mut id = [0u8; 8];
                id.copy_from_slice(raw);
                (ActorId::Long(i64::from_le_bytes(id)), FIXED_SIZE + 8)
            }
            KIND_GUID => {
                let raw = take(bytes, FIXED_SIZE, 16)?;
                let mut id = [0u8; 16];
                id.copy_from_slice(raw);
                (ActorId::Guid(u128::from_le_bytes(id)), FIXED_SIZE + 16)
            }
            KIND_NAMED => {
                let raw = take(bytes, FIXED_SIZE, 4)?;
                let len = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
                let name = take(bytes, FIXED_SIZE + 4, len)?;
                let name = std::str::from_utf8(name).map_err(|_| HeaderError::InvalidName)?;
                (ActorId::Named(name.to_string()), FIXED_SIZE + 4 + len)
            }
            other => return Err(HeaderError::UnknownActorIdKind(other)),
        };

        if bytes.len() > end {
            return Err(HeaderError::TrailingBytes(bytes.len() - end));
        }

        Ok(Self {
            actor_id,
            interface_id: EventInterfaceId::from_i32(interface_id),
            method_id: MethodId::from_i32(method_id),
        })
    }
}

fn take(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], HeaderError> {
    let end = offset.checked_add(len).ok_or(HeaderError::Truncated {
        need: usize::MAX,
        got: bytes.len(),
    })?;
    bytes.get(offset..end).ok_or(HeaderError::Truncated {
        need: end,
        got: bytes.len(),
    })
}
