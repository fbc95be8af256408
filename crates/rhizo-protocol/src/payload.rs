use std::fmt::Debug;
use zerocopy::{AsBytes, FromBytes};

/// Argument type carried in the body of an event notification.
///
/// Payloads must be:
/// - Zero-copy serializable (zerocopy)
/// - Send + Sync (handed to subscribers on transport threads)
/// - Tagged with a type ID that is unique within an event interface
pub trait EventPayload: AsBytes + FromBytes + Send + Sync + Debug + Copy + 'static {
    /// Payload type ID (for TLV encoding)
    const TYPE_ID: u16;
}

/// Helper macro to implement EventPayload trait
#[macro_export]
macro_rules! impl_payload {
    ($type:ty, $id:expr) => {
        impl $crate::payload::EventPayload for $type {
            const TYPE_ID: u16 = $id;
        }
    };
}
