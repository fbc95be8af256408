//! Subscription index keyed by subscriber and by correlation token.
//!
//! ## Rules
//! - At most one live subscription per `SubscriberKey`
//! - A subscription is in `by_token` exactly when it is in `by_key`
//! - Mutations take the `by_key` shard first, then the `by_token` shard;
//!   readers only touch `by_token`, so there is no lock-order inversion
//! - Tokens are never reused: a fresh random token is drawn until it is
//!   vacant in `by_token`
//! - `remove_by_token` reclaims dropped subscribers through the same
//!   `by_key` entry, and only if it still holds the record found by token

use crate::config::RegistryConfig;
use crate::dispatcher::DispatcherTable;
use crate::error::{EventsError, Result};
use crate::subscription::{InstanceId, SubscriberKey, SubscriberRef, Subscription};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rhizo_protocol::{ActorId, CorrelationToken, EventInterface, EventInterfaceId};
use std::hash::Hash;
use std::sync::Arc;

pub struct SubscriptionIndex {
    dispatchers: Arc<DispatcherTable>,
    by_key: DashMap<SubscriberKey, Subscription>,
    by_token: DashMap<CorrelationToken, Subscription>,
}

impl SubscriptionIndex {
    pub fn new(dispatchers: Arc<DispatcherTable>) -> Self {
        Self {
            dispatchers,
            by_key: DashMap::new(),
            by_token: DashMap::new(),
        }
    }

    pub fn with_config(dispatchers: Arc<DispatcherTable>, config: &RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dispatchers,
            by_key: build_map(config),
            by_token: build_map(config),
        })
    }

    /// Register `instance` for events of `E` published by `actor_id`
    ///
    /// Returns the existing subscription if this exact (actor, interface,
    /// instance) is already registered.
    pub fn register_subscriber<E: EventInterface + ?Sized>(
        &self,
        actor_id: ActorId,
        instance: &Arc<E>,
    ) -> Result<Subscription> {
        let key = self.key_for::<E>(actor_id, instance)?;

        match self.by_key.entry(key) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let subscription = self.insert_by_token(entry.key().clone(), instance);
                entry.insert(subscription.clone());

                tracing::debug!(
                    interface = E::NAME,
                    actor_id = %subscription.key().actor_id(),
                    token = %subscription.token(),
                    "Registered event subscriber"
                );
                Ok(subscription)
            }
        }
    }

    /// Remove the subscription of `instance` for events of `E` from `actor_id`
    ///
    /// The removed subscription is marked inactive before either index
    /// entry is released.
    pub fn unregister_subscriber<E: EventInterface + ?Sized>(
        &self,
        actor_id: ActorId,
        instance: &Arc<E>,
    ) -> Result<Option<Subscription>> {
        let key = self.key_for::<E>(actor_id, instance)?;

        let removed = match self.by_key.entry(key) {
            Entry::Occupied(entry) => {
                let subscription = entry.get().clone();
                subscription.deactivate();
                self.by_token.remove(&subscription.token());
                entry.remove();
                Some(subscription)
            }
            Entry::Vacant(_) => None,
        };

        if let Some(subscription) = &removed {
            tracing::debug!(
                interface = E::NAME,
                actor_id = %subscription.key().actor_id(),
                token = %subscription.token(),
                "Unregistered event subscriber"
            );
        }
        Ok(removed)
    }

    /// Remove the subscription registered under `token`
    ///
    /// Used when the subscriber instance is gone and its key can no longer
    /// be rebuilt by the client. Does nothing if the token was already
    /// unregistered, or if its key now belongs to a newer subscription.
    pub fn remove_by_token(&self, token: CorrelationToken) -> Option<Subscription> {
        let stale = self.lookup_by_token(token)?;

        let removed = match self.by_key.entry(stale.key().clone()) {
            Entry::Occupied(entry) if entry.get().same_record(&stale) => {
                stale.deactivate();
                self.by_token.remove(&token);
                entry.remove();
                Some(stale)
            }
            _ => None,
        };

        if let Some(subscription) = &removed {
            tracing::debug!(
                actor_id = %subscription.key().actor_id(),
                token = %token,
                "Removed subscription of dropped subscriber"
            );
        }
        removed
    }

    pub fn lookup_by_token(&self, token: CorrelationToken) -> Option<Subscription> {
        self.by_token.get(&token).map(|entry| entry.value().clone())
    }

    pub fn is_registered<E: EventInterface + ?Sized>(
        &self,
        actor_id: ActorId,
        instance: &Arc<E>,
    ) -> bool {
        let key = SubscriberKey::new(actor_id, E::interface_id(), InstanceId::of(instance));
        self.by_key.contains_key(&key)
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    fn key_for<E: EventInterface + ?Sized>(
        &self,
        actor_id: ActorId,
        instance: &Arc<E>,
    ) -> Result<SubscriberKey> {
        let interface_id = self.ensure_interface::<E>()?;
        Ok(SubscriberKey::new(actor_id, interface_id, InstanceId::of(instance)))
    }

    fn ensure_interface<E: EventInterface + ?Sized>(&self) -> Result<EventInterfaceId> {
        let interface_id = E::interface_id();
        if self.dispatchers.contains(interface_id) {
            Ok(interface_id)
        } else {
            Err(EventsError::UnknownEventInterface {
                name: E::NAME,
                interface_id,
            })
        }
    }

    /// Mint a subscription under a token not present in `by_token`
    fn insert_by_token<E: EventInterface + ?Sized>(
        &self,
        key: SubscriberKey,
        instance: &Arc<E>,
    ) -> Subscription {
        let subscriber = SubscriberRef::new(instance);
        loop {
            let token = CorrelationToken::new();
            if let Entry::Vacant(slot) = self.by_token.entry(token) {
                let subscription = Subscription::new(token, key, subscriber);
                slot.insert(subscription.clone());
                return subscription;
            }
        }
    }

    #[cfg(test)]
    fn indices_consistent(&self) -> bool {
        self.by_key.len() == self.by_token.len()
            && self.by_key.iter().all(|entry| {
                self.by_token
                    .get(&entry.value().token())
                    .is_some_and(|t| t.value().same_record(entry.value()))
            })
    }
}

fn build_map<K: Eq + Hash, V>(config: &RegistryConfig) -> DashMap<K, V> {
    match config.shard_amount {
        Some(shards) => DashMap::with_capacity_and_shard_amount(config.initial_capacity, shards),
        None => DashMap::with_capacity(config.initial_capacity),
    }
}
