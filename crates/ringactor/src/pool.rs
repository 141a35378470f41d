//! Per-`(T, capacity-class)` batch pools (`spec.md` §4.2).
//!
//! Each pool is itself an SPSC [`RingBufferChain`]: the delivering side
//! (drained on the main thread, per `spec.md` §5's queue topology) is the
//! sole producer pushing reclaimed batches back in; the owning producer
//! outbox's thread is the sole consumer popping a batch out to reuse. This
//! gives steady-state zero-allocation batching without ever exposing a lock.

use crate::batch::{Batch, BatchRef};
use crate::chain::RingBufferChain;
use crate::id::ActorId;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Number of capacity classes kept (`ceil(log2(n))` for `n` up to ~16M
/// messages in a single batch — comfortably beyond any realistic batch).
const CLASS_COUNT: usize = 24;

/// `ceil(log2(max(n, 1)))`, the capacity class a batch of `n` messages falls into.
pub(crate) fn capacity_class(n: usize) -> u32 {
    let n = n.max(1);
    (usize::BITS - (n - 1).leading_zeros()).min(CLASS_COUNT as u32 - 1)
}

/// A pool of reusable [`Batch<T>`] values, partitioned by capacity class.
pub struct BatchPool<T> {
    classes: Vec<RingBufferChain<BatchRef<T>>>,
}

impl<T> BatchPool<T> {
    pub fn new() -> Self {
        Self { classes: (0..CLASS_COUNT).map(|_| RingBufferChain::with_initial_capacity(4)).collect() }
    }

    /// Acquires a batch sized for at least `message_count` messages, reusing
    /// a recycled batch from the pool if one is available. Returns whether
    /// the batch came from a fresh allocation (`true`) or was recycled.
    fn acquire(&self, message_count: usize) -> (BatchRef<T>, bool) {
        let class = capacity_class(message_count);
        match self.classes[class as usize].pop() {
            Some(batch) => (batch, false),
            None => (Arc::new(Batch::new_empty(class)), true),
        }
    }

    /// Acquires a batch and stamps it with `pool` as its recycle destination.
    /// The only public entry point to acquisition — every `Batch<T>` must
    /// know where to release itself. Returns whether this was a fresh
    /// allocation, for the caller's `Metrics::add_pool_allocation` bookkeeping.
    pub(crate) fn acquire_from(pool: &Arc<BatchPool<T>>, message_count: usize) -> (BatchRef<T>, bool) {
        let (mut batch, fresh) = pool.acquire(message_count);
        if let Some(inner) = Arc::get_mut(&mut batch) {
            inner.origin_pool = Some(Arc::clone(pool));
        }
        (batch, fresh)
    }

    /// Records one completed delivery against `batch`. When this was the
    /// last outstanding delivery, the batch is reset and returned to its
    /// capacity class for reuse. Returns whether the batch was recycled.
    pub fn release(&self, mut batch: BatchRef<T>) -> bool {
        if batch.record_release() {
            let class = batch.pool_key;
            if let Some(inner) = Arc::get_mut(&mut batch) {
                inner.reset_for_reuse(ActorId::UNDEFINED, 0);
            }
            self.classes[class as usize].push(batch);
            true
        } else {
            false
        }
    }
}

impl<T> Default for BatchPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A type-indexed map from `T` to its `BatchPool<T>`, recovered at each use
/// site via downcast (`spec.md` §9: "a mapping from a type identity token to
/// a type-erased pool handle").
#[derive(Default)]
pub(crate) struct PoolRegistry {
    pools: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl PoolRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get_or_create<T: Send + Sync + 'static>(&mut self) -> Arc<BatchPool<T>> {
        Arc::clone(
            self.pools
                .entry(TypeId::of::<T>())
                .or_insert_with(|| Box::new(Arc::new(BatchPool::<T>::new())))
                .downcast_ref::<Arc<BatchPool<T>>>()
                .expect("pool keyed by TypeId always downcasts to its own type"),
        )
    }
}
