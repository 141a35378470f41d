//! The type-erasure boundary.
//!
//! Every queue in the system (an actor's inbox chain, a worker's send and
//! completion queues) carries a single non-generic element type regardless
//! of how many distinct message types `T` flow through it. `spec.md` §9
//! describes two valid strategies for this; we take the "type identity
//! token recovered at use sites" route: batches are stored as
//! `Arc<dyn Any + Send + Sync>`, and both the releasing pool and the
//! dispatching handler recover the concrete `Batch<T>` via `downcast`/
//! `downcast_ref` — `std::sync::Arc`'s own `downcast` (stable, no custom
//! vtable trickery) is all that's needed.

use crate::batch::Batch;
use crate::id::ActorId;
use crate::metrics::Metrics;
use std::any::Any;
use std::sync::Arc;

pub(crate) type ErasedBatch = Arc<dyn Any + Send + Sync>;

/// Releases one delivery's worth of a batch back to its originating pool.
/// Generated once per `T` in [`crate::writer::Writer::close`] — a plain,
/// non-capturing function pointer, monomorphized for the writer's type.
/// Takes `&Metrics` rather than capturing one so the pointer stays a bare
/// `fn`, not a boxed closure.
pub(crate) type ReleaseFn = fn(ErasedBatch, &Metrics);

pub(crate) fn release_fn_for<T: Send + Sync + 'static>() -> ReleaseFn {
    fn release_impl<T: Send + Sync + 'static>(erased: ErasedBatch, metrics: &Metrics) {
        let typed: Arc<Batch<T>> = erased.downcast().expect("release fn only ever sees its own T");
        let pool = typed.origin_pool.clone().expect("acquired batches always carry their origin pool");
        if pool.release(typed) {
            metrics.add_batch_recycled();
        }
    }
    release_impl::<T>
}

/// One queued hop: a batch bound for `dest`, plus enough to release it when
/// delivery completes. This is `QueuedDelivery`/`SendRequest`/`Completion`
/// from `spec.md` §3 unified into one element type, since all three queues
/// in `spec.md` §5's topology table carry the same shape of payload.
pub(crate) struct Delivery {
    pub(crate) dest: ActorId,
    pub(crate) source: ActorId,
    pub(crate) channel: i64,
    pub(crate) batch: ErasedBatch,
    pub(crate) release: ReleaseFn,
    pub(crate) error: Option<crate::error::HandlerError>,
}

pub(crate) fn erase<T: Send + Sync + 'static>(batch: Arc<Batch<T>>) -> ErasedBatch {
    batch
}
