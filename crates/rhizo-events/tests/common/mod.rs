//! Common test utilities: a Counter event interface, its dispatcher and a
//! recording subscriber.

#![allow(dead_code)]

use rhizo_events::{EventDispatcher, EventSubscriberManager, InterfaceDispatcher};
use rhizo_protocol::{
    encode_payload, impl_event_interface, impl_payload, CorrelationToken, EventInterface,
    MethodId, RemotingHeaders,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

pub const ON_INCREMENT: i32 = 1;
pub const ON_RESET: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct Increment {
    pub amount: i64,
}

impl_payload!(Increment, 1);

#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct Reset {
    pub value: i64,
}

impl_payload!(Reset, 2);

pub trait CounterEvents: Send + Sync {
    fn on_increment(&self, amount: i64);
    fn on_reset(&self, value: i64);
}

impl_event_interface!(dyn CounterEvents, "Sample.Counter.CounterEvents", 7);

pub trait PresenceEvents: Send + Sync {
    fn on_joined(&self, user: u64);
}

impl_event_interface!(dyn PresenceEvents, "Sample.Presence.PresenceEvents");

#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct Joined {
    pub user: u64,
}

impl_payload!(Joined, 1);

/// Subscriber that records every call it receives
#[derive(Default)]
pub struct RecordingCounter {
    pub calls: Mutex<Vec<(&'static str, i64)>>,
    pub invocations: AtomicU64,
}

impl RecordingCounter {
    pub fn calls(&self) -> Vec<(&'static str, i64)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn invocation_count(&self) -> u64 {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl CounterEvents for RecordingCounter {
    fn on_increment(&self, amount: i64) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(("on_increment", amount));
    }

    fn on_reset(&self, value: i64) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(("on_reset", value));
    }
}

impl PresenceEvents for RecordingCounter {
    fn on_joined(&self, user: u64) {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(("on_joined", user as i64));
    }
}

pub fn counter_dispatcher() -> Arc<dyn EventDispatcher> {
    InterfaceDispatcher::<dyn CounterEvents>::builder()
        .method(ON_INCREMENT, "on_increment", |s, msg: Increment| {
            s.on_increment(msg.amount);
            Ok(())
        })
        .method(ON_RESET, "on_reset", |s, msg: Reset| {
            s.on_reset(msg.value);
            Ok(())
        })
        .build()
        .into_shared()
}

pub fn presence_dispatcher() -> Arc<dyn EventDispatcher> {
    InterfaceDispatcher::<dyn PresenceEvents>::builder()
        .method(1, "on_joined", |s, msg: Joined| {
            s.on_joined(msg.user);
            Ok(())
        })
        .build()
        .into_shared()
}

/// Manager with the Counter and Presence dispatchers registered
pub fn manager() -> EventSubscriberManager {
    init_tracing();
    let manager = EventSubscriberManager::new();
    manager.register_event_dispatchers([counter_dispatcher(), presence_dispatcher()]);
    manager
}

/// What a publishing actor sends for an increment event
pub fn increment_message(token: CorrelationToken, amount: i64) -> (RemotingHeaders, Vec<u8>) {
    let headers = RemotingHeaders::event_notification(
        token,
        <dyn CounterEvents>::interface_id(),
        MethodId(ON_INCREMENT),
    );
    (headers, encode_payload(&Increment { amount }).unwrap())
}

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
