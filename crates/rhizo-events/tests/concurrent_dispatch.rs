//! Registration churn racing with inbound dispatch on transport threads.

mod common;

use common::*;
use rhizo_events::CallbackClient;
use rhizo_protocol::{ActorId, CorrelationToken};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 200;

#[test]
fn test_concurrent_registrations_are_distinct() {
    let manager = manager();
    let barrier = Barrier::new(THREADS);

    let registered: Vec<Vec<(CorrelationToken, Arc<dyn CounterEvents>)>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let manager = &manager;
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    (0..PER_THREAD)
                        .map(|i| {
                            let instance: Arc<dyn CounterEvents> =
                                Arc::new(RecordingCounter::default());
                            let actor = ActorId::from_long((t * PER_THREAD + i) as i64);
                            let token = manager
                                .register_subscriber(actor, &instance)
                                .unwrap()
                                .token();
                            // Held until the end so no address is reused
                            (token, instance)
                        })
                        .collect()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let distinct: HashSet<_> = registered.iter().flatten().map(|(token, _)| *token).collect();
    assert_eq!(distinct.len(), THREADS * PER_THREAD);
    assert_eq!(manager.subscription_count(), THREADS * PER_THREAD);
}

#[test]
fn test_racing_registrations_of_same_pair_share_token() {
    let manager = manager();
    let instance: Arc<dyn CounterEvents> = Arc::new(RecordingCounter::default());
    let barrier = Barrier::new(THREADS);

    let tokens: Vec<CorrelationToken> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let (manager, instance, barrier) = (&manager, &instance, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    manager
                        .register_subscriber(ActorId::named("shared"), instance)
                        .unwrap()
                        .token()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(tokens.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(manager.subscription_count(), 1);
}

#[test]
fn test_dispatch_during_churn() {
    let manager = manager();
    let stable = Arc::new(RecordingCounter::default());
    let stable_instance: Arc<dyn CounterEvents> = stable.clone();
    let stable_token = manager
        .register_subscriber(ActorId::named("stable"), &stable_instance)
        .unwrap()
        .token();

    let churned = Arc::new(RecordingCounter::default());
    let churned_instance: Arc<dyn CounterEvents> = churned.clone();
    let stop = AtomicBool::new(false);
    let router = manager.router();

    let dispatched_per_thread = thread::scope(|s| {
        let churn = s.spawn(|| {
            let mut retired = Vec::new();
            for _ in 0..500 {
                let subscription = manager
                    .register_subscriber(ActorId::named("churn"), &churned_instance)
                    .unwrap();
                retired.push(subscription.token());
                assert!(manager
                    .unregister_subscriber(ActorId::named("churn"), &churned_instance)
                    .unwrap());
            }
            stop.store(true, Ordering::SeqCst);
            retired
        });

        let dispatchers: Vec<_> = (0..4)
            .map(|_| {
                let (router, stop) = (&router, &stop);
                s.spawn(move || {
                    let mut sent = 0u64;
                    while !stop.load(Ordering::SeqCst) {
                        let (headers, body) = increment_message(stable_token, 1);
                        router.one_way_message(&headers, &body);
                        sent += 1;
                    }
                    sent
                })
            })
            .collect();

        let retired = churn.join().unwrap();
        let sent: Vec<u64> = dispatchers.into_iter().map(|h| h.join().unwrap()).collect();
        (retired, sent)
    });

    let (retired, sent) = dispatched_per_thread;
    let total_sent: u64 = sent.iter().sum();

    // Every message for the stable subscription was delivered exactly once
    assert_eq!(stable.invocation_count(), total_sent);

    // Every churned token is dead and distinct
    let distinct: HashSet<_> = retired.iter().copied().collect();
    assert_eq!(distinct.len(), retired.len());
    for token in retired {
        let (headers, body) = increment_message(token, 1);
        manager.one_way_message(&headers, &body);
    }
    assert_eq!(churned.invocation_count(), 0);

    assert_eq!(manager.subscription_count(), 1);
    assert!(manager.is_registered(ActorId::named("stable"), &stable_instance));
    assert!(!manager.is_registered(ActorId::named("churn"), &churned_instance));
}
