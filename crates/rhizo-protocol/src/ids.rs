//! Identifier types carried on the wire for actor event notifications.
//!
//! - `EventInterfaceId`: which event interface a notification belongs to
//! - `MethodId`: which method of that interface to invoke
//! - `ActorId`: the target actor of a message (Long, Guid or Named)
//! - `CorrelationToken`: per-subscription routing key, sent as a Guid actor id

use std::fmt;

/// Stable identifier of an event interface.
///
/// Computed from the interface's stable name with a 32-bit FNV-1a hash,
/// so both ends of a connection agree on the id without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventInterfaceId(pub i32);

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

impl EventInterfaceId {
    /// Compute the id for an interface name
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(FNV_PRIME);
            i += 1;
        }
        Self(hash as i32)
    }

    pub const fn from_i32(id: i32) -> Self {
        Self(id)
    }

    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for EventInterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a method within an event interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub i32);

impl MethodId {
    pub const fn from_i32(id: i32) -> Self {
        Self(id)
    }

    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an actor instance.
///
/// Actors are addressed by a 64-bit number, a 128-bit guid, or a name.
/// Event notifications reuse the Guid form to carry a `CorrelationToken`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActorId {
    Long(i64),
    Guid(u128),
    Named(String),
}

impl ActorId {
    /// Create a random Long actor ID
    pub fn new() -> Self {
        Self::Long(rand::random())
    }

    pub fn from_long(id: i64) -> Self {
        Self::Long(id)
    }

    pub fn from_guid(id: u128) -> Self {
        Self::Guid(id)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// The guid value, if this is a Guid actor id
    pub fn guid_id(&self) -> Option<u128> {
        match self {
            Self::Guid(id) => Some(*id),
            _ => None,
        }
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long(id) => write!(f, "{}", id),
            Self::Guid(id) => write!(f, "{:032x}", id),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Correlation token minted once per subscription.
///
/// The publishing actor is told to address notifications for the
/// subscription to `ActorId::Guid(token)`; the receiving side recovers the
/// token from the target actor id with `CorrelationToken::from_actor_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationToken(u128);

impl CorrelationToken {
    /// Generate a new random token
    pub fn new() -> Self {
        Self(rand::random())
    }

    pub fn from_u128(id: u128) -> Self {
        Self(id)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// The synthetic actor id that carries this token on the wire
    pub fn to_actor_id(&self) -> ActorId {
        ActorId::Guid(self.0)
    }

    /// Recover a token from a target actor id; only Guid ids carry one
    pub fn from_actor_id(actor_id: &ActorId) -> Option<Self> {
        actor_id.guid_id().map(Self)
    }
}

impl Default for CorrelationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_id_is_stable() {
        let a = EventInterfaceId::from_name("Sample.CounterEvents");
        let b = EventInterfaceId::from_name("Sample.CounterEvents");
        assert_eq!(a, b);
        assert_ne!(a, EventInterfaceId::from_name("Sample.ChatEvents"));
    }

    #[test]
    fn test_interface_id_fnv_vectors() {
        // FNV-1a 32-bit reference values
        assert_eq!(EventInterfaceId::from_name("").0 as u32, 0x811c9dc5);
        assert_eq!(EventInterfaceId::from_name("a").0 as u32, 0xe40c292c);
    }

    #[test]
    fn test_interface_id_usable_in_const() {
        const ID: EventInterfaceId = EventInterfaceId::from_name("x");
        assert_eq!(ID, EventInterfaceId::from_name("x"));
    }

    #[test]
    fn test_actor_id_creation() {
        let id1 = ActorId::new();
        let id2 = ActorId::new();
        assert_ne!(id1, id2);

        assert_eq!(ActorId::from_long(42), ActorId::Long(42));
        assert_eq!(ActorId::named("cart-7"), ActorId::Named("cart-7".to_string()));
    }

    #[test]
    fn test_actor_id_display() {
        assert_eq!(ActorId::from_long(-5).to_string(), "-5");
        assert_eq!(
            ActorId::from_guid(0x123456789abcdef0).to_string(),
            "0000000000000000123456789abcdef0"
        );
        assert_eq!(ActorId::named("cart-7").to_string(), "cart-7");
    }

    #[test]
    fn test_token_travels_as_guid_actor_id() {
        let token = CorrelationToken::new();
        let actor_id = token.to_actor_id();

        assert_eq!(actor_id.guid_id(), Some(token.as_u128()));
        assert_eq!(CorrelationToken::from_actor_id(&actor_id), Some(token));
    }

    #[test]
    fn test_non_guid_actor_id_carries_no_token() {
        assert_eq!(CorrelationToken::from_actor_id(&ActorId::from_long(1)), None);
        assert_eq!(CorrelationToken::from_actor_id(&ActorId::named("a")), None);
    }

    #[test]
    fn test_token_creation() {
        assert_ne!(CorrelationToken::new(), CorrelationToken::new());
        assert_eq!(CorrelationToken::from_u128(42).as_u128(), 42);
    }
}
