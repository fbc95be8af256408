use crate::callback::CallbackClient;
use crate::config::RegistryConfig;
use crate::dispatcher::{DispatcherTable, EventDispatcher};
use crate::error::Result;
use crate::index::SubscriptionIndex;
use crate::metrics::RouterMetrics;
use crate::router::EventRouter;
use crate::subscription::Subscription;
use async_trait::async_trait;
use rhizo_protocol::{ActorId, EventInterface, RemotingHeaders};
use std::sync::{Arc, OnceLock};

/// Client-side actor event subscriptions: dispatcher table, subscription
/// index and the router that the transport calls back into.
///
/// Construct one at startup, register the generated dispatchers, and hand
/// `router()` (or the manager itself, as a `CallbackClient`) to the
/// transport. `global()` gives a lazily created process-wide instance for
/// callers that cannot thread one through.
///
/// # Example
///
/// ```rust,ignore
/// let manager = EventSubscriberManager::new();
/// manager.register_event_dispatchers([counter_dispatcher().into_shared()]);
///
/// let instance: Arc<dyn CounterEvents> = Arc::new(MyCounterView::default());
/// let subscription = manager.register_subscriber(actor_id.clone(), &instance)?;
/// // tell the actor to publish to subscription.token().to_actor_id()
///
/// manager.unregister_subscriber(actor_id, &instance)?;
/// ```
pub struct EventSubscriberManager {
    dispatchers: Arc<DispatcherTable>,
    subscriptions: Arc<SubscriptionIndex>,
    router: EventRouter,
}

static GLOBAL: OnceLock<EventSubscriberManager> = OnceLock::new();

impl EventSubscriberManager {
    /// Create a manager with default configuration
    pub fn new() -> Self {
        let dispatchers = Arc::new(DispatcherTable::new());
        let subscriptions = Arc::new(SubscriptionIndex::new(Arc::clone(&dispatchers)));
        Self::assemble(dispatchers, subscriptions, &RegistryConfig::default())
    }

    /// Create a manager with custom configuration
    pub fn with_config(config: RegistryConfig) -> Result<Self> {
        let dispatchers = Arc::new(DispatcherTable::new());
        let subscriptions = Arc::new(SubscriptionIndex::with_config(
            Arc::clone(&dispatchers),
            &config,
        )?);
        Ok(Self::assemble(dispatchers, subscriptions, &config))
    }

    fn assemble(
        dispatchers: Arc<DispatcherTable>,
        subscriptions: Arc<SubscriptionIndex>,
        config: &RegistryConfig,
    ) -> Self {
        let router = EventRouter::new(
            Arc::clone(&dispatchers),
            Arc::clone(&subscriptions),
            config.drop_log_level,
        );
        Self {
            dispatchers,
            subscriptions,
            router,
        }
    }

    /// Process-wide instance, created with default configuration on first use
    pub fn global() -> &'static EventSubscriberManager {
        GLOBAL.get_or_init(Self::new)
    }

    /// Register the generated dispatchers for this process
    ///
    /// Dispatchers for an interface id that is already known are ignored.
    pub fn register_event_dispatchers<I>(&self, dispatchers: I)
    where
        I: IntoIterator<Item = Arc<dyn EventDispatcher>>,
    {
        self.dispatchers.register(dispatchers);
    }

    pub fn register_subscriber<E: EventInterface + ?Sized>(
        &self,
        actor_id: ActorId,
        instance: &Arc<E>,
    ) -> Result<Subscription> {
        self.subscriptions.register_subscriber(actor_id, instance)
    }

    /// Returns `true` if a live subscription was removed
    pub fn unregister_subscriber<E: EventInterface + ?Sized>(
        &self,
        actor_id: ActorId,
        instance: &Arc<E>,
    ) -> Result<bool> {
        Ok(self.try_unregister_subscriber(actor_id, instance)?.is_some())
    }

    /// Like `unregister_subscriber`, returning the removed subscription
    pub fn try_unregister_subscriber<E: EventInterface + ?Sized>(
        &self,
        actor_id: ActorId,
        instance: &Arc<E>,
    ) -> Result<Option<Subscription>> {
        self.subscriptions.unregister_subscriber(actor_id, instance)
    }

    pub fn is_registered<E: EventInterface + ?Sized>(
        &self,
        actor_id: ActorId,
        instance: &Arc<E>,
    ) -> bool {
        self.subscriptions.is_registered(actor_id, instance)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn dispatcher_count(&self) -> usize {
        self.dispatchers.len()
    }

    /// Router to wire into the transport's callback path
    pub fn router(&self) -> EventRouter {
        self.router.clone()
    }

    pub fn metrics(&self) -> &RouterMetrics {
        self.router.metrics()
    }
}

impl Default for EventSubscriberManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallbackClient for EventSubscriberManager {
    fn one_way_message(&self, headers: &RemotingHeaders, body: &[u8]) {
        self.router.handle_one_way_message(headers, body);
    }

    async fn request_response(&self, headers: &RemotingHeaders, body: &[u8]) -> Result<Vec<u8>> {
        self.router.request_response(headers, body).await
    }
}
