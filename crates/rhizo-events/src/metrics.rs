//! Delivery counters for the event router
//!
//! Drops are never surfaced to callers, so these counters are the way to
//! observe them without a log subscriber installed.

use crate::router::DropReason;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Delivered / dropped counts, shared by every clone of a router.
#[derive(Clone, Default)]
pub struct RouterMetrics {
    inner: Arc<RouterMetricsInner>,
}

#[derive(Default)]
struct RouterMetricsInner {
    delivered_total: AtomicU64,

    /// One counter per `DropReason::LABELS` entry
    dropped: [AtomicU64; DropReason::LABELS.len()],
}

impl RouterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_delivered(&self) {
        self.inner.delivered_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self, reason: &DropReason) {
        self.inner.dropped[reason.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered_total(&self) -> u64 {
        self.inner.delivered_total.load(Ordering::Relaxed)
    }

    /// Drops recorded under `label` (see `DropReason::as_label`)
    pub fn dropped(&self, label: &str) -> u64 {
        DropReason::LABELS
            .iter()
            .position(|l| *l == label)
            .map(|i| self.inner.dropped[i].load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn dropped_total(&self) -> u64 {
        self.inner
            .dropped
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    fn dropped_snapshot(&self) -> Vec<(&'static str, u64)> {
        DropReason::LABELS
            .iter()
            .zip(self.inner.dropped.iter())
            .map(|(label, c)| (*label, c.load(Ordering::Relaxed)))
            .filter(|(_, n)| *n > 0)
            .collect()
    }

    pub fn print_summary(&self) {
        tracing::info!(
            delivered_total = self.delivered_total(),
            dropped_total = self.dropped_total(),
            dropped = ?self.dropped_snapshot(),
            "Event router metrics summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhizo_protocol::{CorrelationToken, EventInterfaceId};

    #[test]
    fn test_counts_by_reason() {
        let metrics = RouterMetrics::new();
        metrics.record_delivered();
        metrics.record_drop(&DropReason::NoDispatcher(EventInterfaceId(3)));
        metrics.record_drop(&DropReason::UnknownToken(CorrelationToken::new()));
        metrics.record_drop(&DropReason::UnknownToken(CorrelationToken::new()));

        assert_eq!(metrics.delivered_total(), 1);
        assert_eq!(metrics.dropped("no_dispatcher"), 1);
        assert_eq!(metrics.dropped("unknown_token"), 2);
        assert_eq!(metrics.dropped("handler_panicked"), 0);
        assert_eq!(metrics.dropped("not_a_label"), 0);
        assert_eq!(metrics.dropped_total(), 3);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = RouterMetrics::new();
        let clone = metrics.clone();
        clone.record_drop(&DropReason::HandlerPanicked);

        assert_eq!(metrics.dropped("handler_panicked"), 1);
        assert_eq!(metrics.dropped_snapshot(), vec![("handler_panicked", 1)]);
    }

    #[test]
    fn test_print_summary_emits_counts() {
        let metrics = RouterMetrics::new();
        metrics.record_delivered();
        metrics.record_drop(&DropReason::SubscriberGone);

        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        tracing::subscriber::with_default(subscriber, || metrics.print_summary());

        assert_eq!(metrics.dropped_snapshot(), vec![("subscriber_gone", 1)]);
    }
}
