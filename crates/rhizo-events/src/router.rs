//! Inline router for inbound one-way event notifications.
//!
//! ## Architecture
//! ```text
//! transport thread → handle_one_way_message(headers, body)
//!     └─► route()
//!           ├─► ActorMessageHeaders::from_remoting_headers  (not an actor message → drop)
//!           ├─► DispatcherTable::lookup(interface_id)        (no dispatcher → drop)
//!           ├─► CorrelationToken::from_actor_id             (not a token → drop)
//!           ├─► SubscriptionIndex::lookup_by_token          (unknown token → drop)
//!           ├─► interface id / active checks                (mismatch, inactive → drop)
//!           ├─► EventDispatcher::decode_body                (decode failure → drop)
//!           └─► EventDispatcher::dispatch                   (handler failure → drop)
//! ```
//!
//! A subscription whose instance has been dropped is removed from the
//! index the first time a notification reaches it.
//!
//! `route` reports every drop as a `DropReason`. `handle_one_way_message`
//! is the only place a `DropReason` (or a handler panic) is discarded:
//! nothing escapes onto the transport thread.

use crate::config::LogLevel;
use crate::dispatcher::{DispatchError, DispatcherTable};
use crate::index::SubscriptionIndex;
use crate::metrics::RouterMetrics;
use rhizo_protocol::{
    ActorId, ActorMessageHeaders, CorrelationToken, EventInterfaceId, HeaderError, RemotingHeaders,
};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Why a notification was dropped
#[derive(Error, Debug)]
pub enum DropReason {
    #[error("not an actor message: {0}")]
    NotActorMessage(HeaderError),

    #[error("no dispatcher for interface {0}")]
    NoDispatcher(EventInterfaceId),

    #[error("target actor {0} does not carry a correlation token")]
    NotAToken(ActorId),

    #[error("no subscription for token {0}")]
    UnknownToken(CorrelationToken),

    #[error("subscription is for interface {subscription}, message is for {message}")]
    InterfaceMismatch {
        subscription: EventInterfaceId,
        message: EventInterfaceId,
    },

    #[error("subscription {0} was unregistered")]
    InactiveSubscription(CorrelationToken),

    #[error("body decode failed: {0}")]
    DecodeFailed(DispatchError),

    #[error("subscriber instance has been dropped")]
    SubscriberGone,

    #[error("invocation failed: {0}")]
    InvokeFailed(DispatchError),

    #[error("subscriber handler panicked")]
    HandlerPanicked,
}

impl DropReason {
    /// Stable labels, indexed by `DropReason::index`
    pub const LABELS: [&'static str; 10] = [
        "not_actor_message",
        "no_dispatcher",
        "not_a_token",
        "unknown_token",
        "interface_mismatch",
        "inactive_subscription",
        "decode_failed",
        "subscriber_gone",
        "invoke_failed",
        "handler_panicked",
    ];

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::NotActorMessage(_) => 0,
            Self::NoDispatcher(_) => 1,
            Self::NotAToken(_) => 2,
            Self::UnknownToken(_) => 3,
            Self::InterfaceMismatch { .. } => 4,
            Self::InactiveSubscription(_) => 5,
            Self::DecodeFailed(_) => 6,
            Self::SubscriberGone => 7,
            Self::InvokeFailed(_) => 8,
            Self::HandlerPanicked => 9,
        }
    }

    /// Short stable label for logs and metrics
    pub fn as_label(&self) -> &'static str {
        Self::LABELS[self.index()]
    }
}

/// Routes inbound one-way messages to registered subscribers.
///
/// Cheap to clone; clones share the dispatcher table, the subscription
/// index and the metrics.
#[derive(Clone)]
pub struct EventRouter {
    dispatchers: Arc<DispatcherTable>,
    subscriptions: Arc<SubscriptionIndex>,
    metrics: RouterMetrics,
    drop_log_level: LogLevel,
}

impl EventRouter {
    pub fn new(
        dispatchers: Arc<DispatcherTable>,
        subscriptions: Arc<SubscriptionIndex>,
        drop_log_level: LogLevel,
    ) -> Self {
        Self {
            dispatchers,
            subscriptions,
            metrics: RouterMetrics::new(),
            drop_log_level,
        }
    }

    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    /// Deliver one inbound notification, or drop it silently
    ///
    /// Runs inline on the calling transport thread. A slow handler blocks
    /// that thread.
    pub fn handle_one_way_message(&self, headers: &RemotingHeaders, body: &[u8]) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.route(headers, body)))
            .unwrap_or(Err(DropReason::HandlerPanicked));

        match outcome {
            Ok(()) => self.metrics.record_delivered(),
            Err(reason) => {
                self.metrics.record_drop(&reason);
                self.log_drop(headers, &reason);
            }
        }
    }

    fn route(&self, headers: &RemotingHeaders, body: &[u8]) -> Result<(), DropReason> {
        let actor_headers = ActorMessageHeaders::from_remoting_headers(headers)
            .map_err(DropReason::NotActorMessage)?;
        let interface_id = actor_headers.interface_id;
        let method_id = actor_headers.method_id;

        let dispatcher = self
            .dispatchers
            .lookup(interface_id)
            .ok_or(DropReason::NoDispatcher(interface_id))?;

        let token = CorrelationToken::from_actor_id(&actor_headers.actor_id)
            .ok_or_else(|| DropReason::NotAToken(actor_headers.actor_id.clone()))?;

        let subscription = self
            .subscriptions
            .lookup_by_token(token)
            .ok_or(DropReason::UnknownToken(token))?;

        if subscription.interface_id() != interface_id {
            return Err(DropReason::InterfaceMismatch {
                subscription: subscription.interface_id(),
                message: interface_id,
            });
        }

        // Unregistered between the lookup and now
        if !subscription.is_active() {
            return Err(DropReason::InactiveSubscription(token));
        }

        let args = dispatcher
            .decode_body(method_id, body)
            .map_err(DropReason::DecodeFailed)?;

        match dispatcher.dispatch(subscription.subscriber(), method_id, args) {
            Ok(()) => Ok(()),
            Err(DispatchError::SubscriberGone) => {
                self.subscriptions.remove_by_token(token);
                Err(DropReason::SubscriberGone)
            }
            Err(e) => {
                tracing::debug!(
                    interface = dispatcher.interface_name(),
                    method = dispatcher.method_name(method_id).unwrap_or("<unknown>"),
                    %token,
                    error = %e,
                    "Event handler failed"
                );
                Err(DropReason::InvokeFailed(e))
            }
        }
    }

    fn log_drop(&self, headers: &RemotingHeaders, reason: &DropReason) {
        let interface_id = headers.interface_id;
        let method_id = headers.method_id;
        let label = reason.as_label();

        macro_rules! log_at {
            ($macro:ident) => {
                tracing::$macro!(
                    interface_id,
                    method_id,
                    reason = label,
                    error = %reason,
                    "Dropped event notification"
                )
            };
        }

        match self.drop_log_level {
            LogLevel::Trace => log_at!(trace),
            LogLevel::Debug => log_at!(debug),
            LogLevel::Info => log_at!(info),
            LogLevel::Warn => log_at!(warn),
        }
    }
}
