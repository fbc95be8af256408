use crate::ids::EventInterfaceId;

/// An event interface: the set of notifications an actor may publish.
///
/// Implemented for the subscriber-facing trait object (for example
/// `dyn CounterEvents`), so the interface type doubles as the type of the
/// subscriber instances that receive its events.
///
/// # Example
///
/// ```
/// use rhizo_protocol::{impl_event_interface, EventInterface, EventInterfaceId};
///
/// pub trait CounterEvents: Send + Sync {
///     fn on_increment(&self, amount: u64);
/// }
///
/// impl_event_interface!(dyn CounterEvents, "Sample.CounterEvents");
///
/// assert_eq!(
///     <dyn CounterEvents>::interface_id(),
///     EventInterfaceId::from_name("Sample.CounterEvents")
/// );
/// ```
pub trait EventInterface: Send + Sync + 'static {
    /// Stable, fully qualified interface name
    const NAME: &'static str;

    /// Identifier used on the wire and as the dispatcher table key
    fn interface_id() -> EventInterfaceId {
        EventInterfaceId::from_name(Self::NAME)
    }
}

/// Helper macro to implement EventInterface
///
/// The optional fourth argument pins the interface id instead of deriving
/// it from the name.
#[macro_export]
macro_rules! impl_event_interface {
    ($type:ty, $name:expr) => {
        impl $crate::interface::EventInterface for $type {
            const NAME: &'static str = $name;
        }
    };
    ($type:ty, $name:expr, $id:expr) => {
        impl $crate::interface::EventInterface for $type {
            const NAME: &'static str = $name;

            fn interface_id() -> $crate::ids::EventInterfaceId {
                $crate::ids::EventInterfaceId::from_i32($id)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    trait ChatEvents: Send + Sync {
        fn on_message(&self, len: u32);
    }

    trait CounterEvents: Send + Sync {
        fn on_increment(&self, amount: u64);
    }

    impl_event_interface!(dyn ChatEvents, "Sample.ChatEvents");
    impl_event_interface!(dyn CounterEvents, "Sample.CounterEvents", 7);

    #[test]
    fn test_interface_id_from_name() {
        assert_eq!(<dyn ChatEvents>::NAME, "Sample.ChatEvents");
        assert_eq!(
            <dyn ChatEvents>::interface_id(),
            EventInterfaceId::from_name("Sample.ChatEvents")
        );
    }

    #[test]
    fn test_pinned_interface_id() {
        assert_eq!(<dyn CounterEvents>::interface_id(), EventInterfaceId(7));
    }
}
