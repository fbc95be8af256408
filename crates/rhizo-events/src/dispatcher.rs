//! Event dispatchers and the table that maps interface ids to them.
//!
//! A dispatcher knows one event interface: how to decode the body of each
//! of its methods and how to call that method on a subscriber instance.
//! `InterfaceDispatcher` builds one from typed method registrations:
//!
//! ```rust,ignore
//! let dispatcher = InterfaceDispatcher::<dyn CounterEvents>::builder()
//!     .method(1, "on_increment", |s, msg: Increment| {
//!         s.on_increment(msg.amount);
//!         Ok(())
//!     })
//!     .build();
//!
//! table.register([dispatcher.into_shared()]);
//! ```

use crate::subscription::SubscriberRef;
use dashmap::DashMap;
use rhizo_protocol::{
    decode_payload, CodecError, EventInterface, EventInterfaceId, EventPayload, MethodId,
};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Decoded method argument, handed from `decode_body` to `dispatch`
pub type EventArgs = Box<dyn Any + Send>;

/// Failures inside a dispatcher. Only ever seen by the router.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unknown method id {0}")]
    UnknownMethod(MethodId),

    #[error("Body decode failed: {0}")]
    Decode(#[from] CodecError),

    #[error("Decoded arguments do not match method {0}")]
    ArgumentMismatch(MethodId),

    #[error("Subscriber does not implement the dispatcher's event interface")]
    SubscriberMismatch,

    #[error("Subscriber instance has been dropped")]
    SubscriberGone,

    #[error("Handler failed: {0}")]
    Handler(#[source] anyhow::Error),
}

/// Decodes notification bodies and invokes methods for one event interface.
pub trait EventDispatcher: Send + Sync + 'static {
    fn interface_id(&self) -> EventInterfaceId;

    fn interface_name(&self) -> &'static str;

    /// Name of `method_id`, if this dispatcher knows it
    fn method_name(&self, method_id: MethodId) -> Option<&'static str>;

    /// Decode a notification body into the argument of `method_id`
    fn decode_body(&self, method_id: MethodId, body: &[u8]) -> Result<EventArgs, DispatchError>;

    /// Invoke `method_id` on the subscriber with previously decoded arguments
    fn dispatch(
        &self,
        subscriber: &SubscriberRef,
        method_id: MethodId,
        args: EventArgs,
    ) -> Result<(), DispatchError>;
}

type Invoker<E> = Box<dyn Fn(&E, EventArgs) -> Result<(), DispatchError> + Send + Sync>;

struct Method<E: ?Sized> {
    name: &'static str,
    decode: fn(&[u8]) -> Result<EventArgs, CodecError>,
    invoke: Invoker<E>,
}

/// Dispatcher for event interface `E`, built from typed method handlers.
pub struct InterfaceDispatcher<E: EventInterface + ?Sized> {
    interface_id: EventInterfaceId,
    methods: HashMap<MethodId, Method<E>>,
}

impl<E: EventInterface + ?Sized> InterfaceDispatcher<E> {
    pub fn builder() -> InterfaceDispatcherBuilder<E> {
        InterfaceDispatcherBuilder {
            methods: HashMap::new(),
        }
    }

    pub fn into_shared(self) -> Arc<dyn EventDispatcher> {
        Arc::new(self)
    }
}

impl<E: EventInterface + ?Sized> EventDispatcher for InterfaceDispatcher<E> {
    fn interface_id(&self) -> EventInterfaceId {
        self.interface_id
    }

    fn interface_name(&self) -> &'static str {
        E::NAME
    }

    fn method_name(&self, method_id: MethodId) -> Option<&'static str> {
        self.methods.get(&method_id).map(|m| m.name)
    }

    fn decode_body(&self, method_id: MethodId, body: &[u8]) -> Result<EventArgs, DispatchError> {
        let method = self
            .methods
            .get(&method_id)
            .ok_or(DispatchError::UnknownMethod(method_id))?;
        Ok((method.decode)(body)?)
    }

    fn dispatch(
        &self,
        subscriber: &SubscriberRef,
        method_id: MethodId,
        args: EventArgs,
    ) -> Result<(), DispatchError> {
        let method = self
            .methods
            .get(&method_id)
            .ok_or(DispatchError::UnknownMethod(method_id))?;
        let instance = subscriber
            .downcast::<E>()
            .ok_or(DispatchError::SubscriberMismatch)?
            .upgrade()
            .ok_or(DispatchError::SubscriberGone)?;
        (method.invoke)(&*instance, args)
    }
}

impl<E: EventInterface + ?Sized> fmt::Debug for InterfaceDispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.iter().map(|(id, m)| (id.0, m.name)).collect();
        methods.sort_unstable();
        f.debug_struct("InterfaceDispatcher")
            .field("interface", &E::NAME)
            .field("interface_id", &self.interface_id)
            .field("methods", &methods)
            .finish()
    }
}

pub struct InterfaceDispatcherBuilder<E: EventInterface + ?Sized> {
    methods: HashMap<MethodId, Method<E>>,
}

impl<E: EventInterface + ?Sized> InterfaceDispatcherBuilder<E> {
    /// Register a method taking payload `M`
    ///
    /// Registering the same method id twice replaces the earlier handler.
    pub fn method<M, F>(mut self, method_id: i32, name: &'static str, handler: F) -> Self
    where
        M: EventPayload,
        F: Fn(&E, M) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let method_id = MethodId::from_i32(method_id);
        let invoke: Invoker<E> = Box::new(move |instance: &E, args: EventArgs| {
            let msg = args
                .downcast::<M>()
                .map_err(|_| DispatchError::ArgumentMismatch(method_id))?;
            handler(instance, *msg).map_err(DispatchError::Handler)
        });

        self.methods.insert(
            method_id,
            Method {
                name,
                decode: decode_args::<M>,
                invoke,
            },
        );
        self
    }

    pub fn build(self) -> InterfaceDispatcher<E> {
        InterfaceDispatcher {
            interface_id: E::interface_id(),
            methods: self.methods,
        }
    }
}

fn decode_args<M: EventPayload>(body: &[u8]) -> Result<EventArgs, CodecError> {
    Ok(Box::new(decode_payload::<M>(body)?))
}

/// Interface id → dispatcher map, filled once at startup.
///
/// The first dispatcher registered for an id wins; later registrations for
/// the same id are ignored. There is no removal.
#[derive(Default)]
pub struct DispatcherTable {
    map: DashMap<EventInterfaceId, Arc<dyn EventDispatcher>>,
}

impl DispatcherTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<I>(&self, dispatchers: I)
    where
        I: IntoIterator<Item = Arc<dyn EventDispatcher>>,
    {
        for dispatcher in dispatchers {
            let interface_id = dispatcher.interface_id();
            let name = dispatcher.interface_name();
            let mut inserted = false;
            self.map.entry(interface_id).or_insert_with(|| {
                inserted = true;
                dispatcher
            });

            if inserted {
                tracing::debug!(interface = name, %interface_id, "Registered event dispatcher");
            } else {
                tracing::debug!(
                    interface = name,
                    %interface_id,
                    "Dispatcher already registered for interface, keeping the first"
                );
            }
        }
    }

    pub fn lookup(&self, interface_id: EventInterfaceId) -> Option<Arc<dyn EventDispatcher>> {
        self.map.get(&interface_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, interface_id: EventInterfaceId) -> bool {
        self.map.contains_key(&interface_id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
