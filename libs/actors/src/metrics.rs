//! Actor metrics
//!
//! Relaxed atomic counters updated on the hot path and read as a snapshot.
//! None of these influence behavior; dropped envelopes and stale responses are
//! only visible here and in debug logs.

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-actor counters
#[derive(Debug, Default)]
pub struct ActorMetrics {
    /// Envelopes handed to the transport (requests, responses, cancels)
    pub envelopes_sent: AtomicU64,
    /// Envelopes accepted by `receive`
    pub envelopes_received: AtomicU64,
    /// Envelopes dropped for missing id or foreign target
    pub envelopes_dropped: AtomicU64,
    /// Responses with no pending callback
    pub stale_responses: AtomicU64,
    /// Cancel notices that removed a queued task or fired a hook
    pub cancels_applied: AtomicU64,
    /// Cancel notices sent for our own requests
    pub cancels_sent: AtomicU64,
    /// Handler invocations (including "not found" completions)
    pub handlers_dispatched: AtomicU64,
    /// Handlers that panicked during dispatch
    pub handler_panics: AtomicU64,
}

impl ActorMetrics {
    pub fn record_sent(&self) {
        self.envelopes_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_received(&self) {
        self.envelopes_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.envelopes_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_response(&self) {
        self.stale_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancel_applied(&self) {
        self.cancels_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancel_sent(&self) {
        self.cancels_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch(&self) {
        self.handlers_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_panic(&self) {
        self.handler_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Get statistics snapshot
    pub fn stats(&self) -> ActorStats {
        ActorStats {
            envelopes_sent: self.envelopes_sent.load(Ordering::Relaxed),
            envelopes_received: self.envelopes_received.load(Ordering::Relaxed),
            envelopes_dropped: self.envelopes_dropped.load(Ordering::Relaxed),
            stale_responses: self.stale_responses.load(Ordering::Relaxed),
            cancels_applied: self.cancels_applied.load(Ordering::Relaxed),
            cancels_sent: self.cancels_sent.load(Ordering::Relaxed),
            handlers_dispatched: self.handlers_dispatched.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
        }
    }
}

/// Actor statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorStats {
    pub envelopes_sent: u64,
    pub envelopes_received: u64,
    pub envelopes_dropped: u64,
    pub stale_responses: u64,
    pub cancels_applied: u64,
    pub cancels_sent: u64,
    pub handlers_dispatched: u64,
    pub handler_panics: u64,
}

impl ActorStats {
    /// Share of received envelopes that were dropped as unroutable
    pub fn drop_rate(&self) -> Option<f64> {
        let seen = self.envelopes_received + self.envelopes_dropped;
        if seen > 0 {
            Some(self.envelopes_dropped as f64 / seen as f64)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = ActorMetrics::default();
        metrics.record_sent();
        metrics.record_sent();
        metrics.record_received();
        metrics.record_dropped();
        metrics.record_stale_response();

        let stats = metrics.stats();
        assert_eq!(stats.envelopes_sent, 2);
        assert_eq!(stats.envelopes_received, 1);
        assert_eq!(stats.stale_responses, 1);
        assert_eq!(stats.drop_rate(), Some(0.5));
    }

    #[test]
    fn test_empty_drop_rate() {
        assert_eq!(ActorStats::default().drop_rate(), None);
    }
}
