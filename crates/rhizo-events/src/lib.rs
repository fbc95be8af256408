//! Actor event subscriptions for remoting clients.
//!
//! A client registers subscriber instances against an actor and an event
//! interface; the transport hands every inbound one-way message to the
//! `EventRouter`, which finds the subscription by the correlation token in
//! the message's target actor id and invokes the subscriber inline.
//!
//! - `DispatcherTable`: interface id → dispatcher, filled at startup
//! - `SubscriptionIndex`: live subscriptions by key and by token
//! - `EventRouter`: best-effort, at-most-once delivery; drops are silent
//! - `EventSubscriberManager`: the three wired together

pub mod callback;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod index;
pub mod manager;
pub mod metrics;
pub mod router;
pub mod subscription;

pub use callback::CallbackClient;
pub use config::{ConfigError, LogLevel, RegistryConfig};
pub use dispatcher::{
    DispatchError, DispatcherTable, EventArgs, EventDispatcher, InterfaceDispatcher,
    InterfaceDispatcherBuilder,
};
pub use error::{EventsError, Result};
pub use index::SubscriptionIndex;
pub use manager::EventSubscriberManager;
pub use metrics::RouterMetrics;
pub use router::{DropReason, EventRouter};
pub use subscription::{InstanceId, SubscriberKey, SubscriberRef, Subscription};
