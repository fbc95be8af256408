use crate::config::ConfigError;
use rhizo_protocol::EventInterfaceId;
use thiserror::Error;

/// Errors surfaced to client code.
///
/// Dispatch-path failures never show up here; the router absorbs them
/// (see `router::DropReason`).
#[derive(Error, Debug)]
pub enum EventsError {
    #[error("Event interface {name} (id {interface_id}) has no registered dispatcher")]
    UnknownEventInterface {
        name: &'static str,
        interface_id: EventInterfaceId,
    },

    #[error("Request/response messages are not supported by the event callback client")]
    RequestResponseUnsupported,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EventsError>;
