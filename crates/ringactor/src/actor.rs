//! A single addressable actor: a mailbox, a handler table, and a mutual
//! exclusion guard (`spec.md` §4.4).
//!
//! An actor's inbox chain has exactly one producer (the main thread, which
//! is the only thread that ever routes a [`Delivery`] into a destination
//! actor — see `spec.md` §4.7) and exactly one consumer (the actor's owning
//! worker thread, or main itself for a foreground actor). `owner_flag` is a
//! belt-and-braces CAS guard against `run` somehow being entered twice
//! concurrently for the same actor (`INV-OWN-01`); under the single-owner
//! assignment this session settled on (`SPEC_FULL.md` §C), it should never
//! actually contend.

use crate::chain::RingBufferChain;
use crate::erased::Delivery;
use crate::id::ActorId;
use crate::inbox::Inbox;
use crate::invariants::debug_assert_owner_acquired;
use crate::outbox::Outbox;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub struct Actor {
    id: ActorId,
    inbox_chain: RingBufferChain<Delivery>,
    handlers: Inbox,
    owner_flag: AtomicBool,
    processed_count: AtomicU64,
    dispose: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Actor {
    pub fn new(id: ActorId, handlers: Inbox) -> Self {
        Self {
            id,
            inbox_chain: RingBufferChain::new(),
            handlers,
            owner_flag: AtomicBool::new(false),
            processed_count: AtomicU64::new(0),
            dispose: None,
        }
    }

    pub fn with_dispose(mut self, dispose: impl FnOnce() + Send + Sync + 'static) -> Self {
        self.dispose = Some(Box::new(dispose));
        self
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn processed_count(&self) -> u64 {
        self.processed_count.load(Ordering::Relaxed)
    }

    /// Queues one delivery for this actor. Called only from the main thread.
    pub(crate) fn enqueue(&self, delivery: Delivery) {
        self.inbox_chain.push(delivery);
    }

    /// Processes up to `process_limit` queued deliveries (unbounded if
    /// `None`), dispatching each through the handler table and emitting one
    /// completion per delivery via `emit_completion`. Returns the number of
    /// deliveries processed this call.
    pub(crate) fn run(
        &self,
        outbox: &Outbox,
        process_limit: Option<usize>,
        mut emit_completion: impl FnMut(Delivery),
    ) -> usize {
        let acquired = self.owner_flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire).is_ok();
        debug_assert_owner_acquired!(acquired);
        if !acquired {
            return 0;
        }
        let _owner_guard = OwnerGuard { flag: &self.owner_flag };
        let _scope = outbox.enter_scope(self.id);

        let mut processed = 0usize;
        loop {
            if process_limit.is_some_and(|limit| processed >= limit) {
                break;
            }
            let Some(delivery) = self.inbox_chain.pop() else { break };

            // `Inbox::receive` catches a handler panic per registered
            // handler, where the concrete payload type is still known, so
            // there's nothing left to unwind-guard at this dispatch boundary.
            let error = match self.handlers.receive(&delivery.batch, delivery.source, self.id, delivery.channel, outbox) {
                Ok(_handled) => None,
                Err(handler_error) => Some(handler_error),
            };

            emit_completion(Delivery { error, ..delivery });
            processed += 1;
            self.processed_count.fetch_add(1, Ordering::Relaxed);
        }
        processed
    }

    /// Drains and returns every delivery still queued for this actor,
    /// without dispatching them — used when tearing the actor down so its
    /// in-flight batches can still be released.
    pub(crate) fn drain_remaining(&self) -> Vec<Delivery> {
        let mut out = Vec::new();
        while let Some(delivery) = self.inbox_chain.pop() {
            out.push(delivery);
        }
        out
    }

    /// Consumes the actor, running its dispose hook if one was registered.
    pub(crate) fn dispose(mut self) {
        if let Some(hook) = self.dispose.take() {
            hook();
        }
    }
}

struct OwnerGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
