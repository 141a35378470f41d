//! Pooled, reference-counted message batches (`spec.md` §3, §4.2).
//!
//! A `Batch<T>` is built once by a [`crate::Writer`] and then shared — one
//! clone of the surrounding `Arc` per recipient — across however many
//! deliveries it has. `release_counter` counts completed deliveries; when it
//! reaches `recipients.len()`, the `Arc` handed back to
//! [`crate::pool::BatchPool::release`] is (by construction) the last living
//! clone, so the pool can reclaim the inner `Batch` for reuse without a fresh
//! allocation.

use crate::id::ActorId;
use crate::invariants::debug_assert_release_bounded;
use crate::pool::BatchPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A pooled record: one producer's batch of messages fanned out to an
/// ordered list of recipients.
pub struct Batch<T> {
    pub(crate) source: ActorId,
    pub(crate) channel: i64,
    pub(crate) recipients: Vec<ActorId>,
    pub(crate) messages: Vec<T>,
    release_counter: AtomicUsize,
    /// `ceil(log2(capacity))` class this batch's message `Vec` was sized for.
    pub(crate) pool_key: u32,
    /// The pool this batch is recycled back into once fully released. `None`
    /// only in the instant between allocation and [`BatchPool::acquire_from`]
    /// stamping it in.
    pub(crate) origin_pool: Option<Arc<BatchPool<T>>>,
}

/// Shared handle to an in-flight batch. Cloned once per recipient at
/// writer-close time; each clone is consumed exactly once by
/// [`crate::pool::BatchPool::release`].
pub type BatchRef<T> = Arc<Batch<T>>;

impl<T> Batch<T> {
    pub(crate) fn new_empty(pool_key: u32) -> Self {
        Self {
            source: ActorId::UNDEFINED,
            channel: 0,
            recipients: Vec::new(),
            messages: Vec::new(),
            release_counter: AtomicUsize::new(0),
            pool_key,
            origin_pool: None,
        }
    }

    pub fn source(&self) -> ActorId {
        self.source
    }

    pub fn channel(&self) -> i64 {
        self.channel
    }

    pub fn recipients(&self) -> &[ActorId] {
        &self.recipients
    }

    pub fn messages(&self) -> &[T] {
        &self.messages
    }

    /// Records one completed delivery. Returns `true` when this was the
    /// final outstanding delivery (the batch is now eligible for recycling).
    pub(crate) fn record_release(&self) -> bool {
        let previous = self.release_counter.fetch_add(1, Ordering::AcqRel);
        let released = previous + 1;
        debug_assert_release_bounded!(released, self.recipients.len());
        released == self.recipients.len()
    }

    /// Resets state for reuse from the pool. Only called when the caller
    /// holds the sole `Arc` to this batch (via `Arc::get_mut`).
    pub(crate) fn reset_for_reuse(&mut self, source: ActorId, channel: i64) {
        self.source = source;
        self.channel = channel;
        self.recipients.clear();
        self.messages.clear();
        *self.release_counter.get_mut() = 0;
    }
}
