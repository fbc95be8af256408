//! Subscription records and the keys that identify them.

use rhizo_protocol::{ActorId, CorrelationToken, EventInterface, EventInterfaceId};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Object identity of a subscriber instance: the address of its shared
/// allocation.
///
/// Two value-equal instances in different allocations are different
/// subscribers. A subscription keeps a `Weak` to the instance, which keeps
/// the allocation reserved, so the address cannot be reused by another
/// instance while the subscription exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    pub fn of<E: ?Sized>(instance: &Arc<E>) -> Self {
        Self(Arc::as_ptr(instance) as *const () as usize)
    }
}

/// (owning actor, event interface, subscriber instance)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberKey {
    actor_id: ActorId,
    interface_id: EventInterfaceId,
    instance: InstanceId,
}

impl SubscriberKey {
    pub fn new(actor_id: ActorId, interface_id: EventInterfaceId, instance: InstanceId) -> Self {
        Self {
            actor_id,
            interface_id,
            instance,
        }
    }

    pub fn actor_id(&self) -> &ActorId {
        &self.actor_id
    }

    pub fn interface_id(&self) -> EventInterfaceId {
        self.interface_id
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }
}

/// Type-erased, non-owning reference to a subscriber instance.
///
/// Holds a `Weak<E>` for the instance's event interface `E`; dispatchers
/// for `E` recover it with `downcast`.
pub struct SubscriberRef {
    target: Box<dyn Any + Send + Sync>,
}

impl SubscriberRef {
    pub fn new<E: EventInterface + ?Sized>(instance: &Arc<E>) -> Self {
        Self {
            target: Box::new(Arc::downgrade(instance)),
        }
    }

    pub fn downcast<E: EventInterface + ?Sized>(&self) -> Option<&Weak<E>> {
        self.target.downcast_ref::<Weak<E>>()
    }
}

impl fmt::Debug for SubscriberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRef").finish_non_exhaustive()
    }
}

/// A live (or formerly live) subscription.
///
/// Cheap to clone; clones share the same record, including its active
/// flag. The token and key never change after creation.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

struct SubscriptionInner {
    token: CorrelationToken,
    key: SubscriberKey,
    subscriber: SubscriberRef,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(
        token: CorrelationToken,
        key: SubscriberKey,
        subscriber: SubscriberRef,
    ) -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                token,
                key,
                subscriber,
                active: AtomicBool::new(true),
            }),
        }
    }

    pub fn token(&self) -> CorrelationToken {
        self.inner.token
    }

    pub fn key(&self) -> &SubscriberKey {
        &self.inner.key
    }

    pub fn interface_id(&self) -> EventInterfaceId {
        self.inner.key.interface_id
    }

    pub fn subscriber(&self) -> &SubscriberRef {
        &self.inner.subscriber
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    pub(crate) fn deactivate(&self) {
        self.inner.active.store(false, Ordering::Release);
    }

    /// Whether two handles refer to the same subscription record
    pub fn same_record(&self, other: &Subscription) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.inner.token)
            .field("key", &self.inner.key)
            .field("active", &self.is_active())
            .finish()
    }
}
