pub mod codec;
pub mod headers;
pub mod ids;
pub mod interface;
pub mod payload;

pub use codec::{decode_payload, encode_payload, CodecError};
pub use headers::{ActorMessageHeaders, HeaderError, RemotingHeaders, ACTOR_HEADER_NAME};
pub use ids::{ActorId, CorrelationToken, EventInterfaceId, MethodId};
pub use interface::EventInterface;
pub use payload::EventPayload;
