//! Plain-counter metrics, in the teacher's style: no tracing/logging crate,
//! just snapshot-able counters, atomic where multiple threads contribute.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters accumulated by a [`crate::System`] and its workers.
#[derive(Debug, Default)]
pub struct Metrics {
    messages_sent: AtomicU64,
    messages_disposed: AtomicU64,
    batches_recycled: AtomicU64,
    pool_allocations: AtomicU64,
    handler_errors: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_sent(&self, n: u64) {
        self.messages_sent.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_disposed(&self, n: u64) {
        self.messages_disposed.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn add_batch_recycled(&self) {
        self.batches_recycled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_pool_allocation(&self) {
        self.pool_allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_handler_error(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_disposed: self.messages_disposed.load(Ordering::Relaxed),
            batches_recycled: self.batches_recycled.load(Ordering::Relaxed),
            pool_allocations: self.pool_allocations.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`Metrics`], cheap to pass around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_sent: u64,
    pub messages_disposed: u64,
    pub batches_recycled: u64,
    pub pool_allocations: u64,
    pub handler_errors: u64,
}

impl MetricsSnapshot {
    /// `sentCount - disposedCount`, per `spec.md` §4.7's quiescence counter.
    #[inline]
    pub fn pending(&self) -> u64 {
        self.messages_sent.saturating_sub(self.messages_disposed)
    }
}
