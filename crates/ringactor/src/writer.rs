//! Scoped batch builder (`spec.md` §4.3).
//!
//! A `Writer<T>` accumulates recipients and messages, then on `close()`
//! acquires a batch from its type's pool, moves its state in, and fans one
//! `Delivery` per recipient onto the owning outbox's send queue. Writers are
//! handed out from (and returned to) a per-type free list owned by the
//! [`crate::outbox::Outbox`] that created them, so steady-state sends don't
//! allocate a fresh `Writer` each time.

use crate::chain::RingBufferChain;
use crate::erased::{erase, release_fn_for, Delivery};
use crate::id::ActorId;
use crate::metrics::Metrics;
use crate::pool::BatchPool;
use std::sync::Arc;

pub struct Writer<T> {
    pool: Arc<BatchPool<T>>,
    send_queue: Arc<RingBufferChain<Delivery>>,
    metrics: Arc<Metrics>,
    source: ActorId,
    channel: i64,
    recipients: Vec<ActorId>,
    messages: Vec<T>,
    closed: bool,
}

impl<T: Send + Sync + 'static> Writer<T> {
    pub(crate) fn new(
        pool: Arc<BatchPool<T>>,
        send_queue: Arc<RingBufferChain<Delivery>>,
        metrics: Arc<Metrics>,
        source: ActorId,
    ) -> Self {
        Self { pool, send_queue, metrics, source, channel: 0, recipients: Vec::new(), messages: Vec::new(), closed: false }
    }

    /// Reopens a writer pulled from the free list for a new send, under a
    /// (possibly different) default source.
    pub(crate) fn reopen(&mut self, source: ActorId) {
        debug_assert!(self.closed, "writer handed back to the free list without being closed");
        self.source = source;
        self.channel = 0;
        self.recipients.clear();
        self.messages.clear();
        self.closed = false;
    }

    /// Retargets which send queue a (possibly reused) writer dispatches
    /// onto, e.g. when the owning outbox is shutting down and further sends
    /// should drain into a queue nobody reads instead of the live one.
    pub(crate) fn rebind_sink(&mut self, sink: Arc<RingBufferChain<Delivery>>) {
        self.send_queue = sink;
    }

    pub fn set_channel(&mut self, channel: i64) -> &mut Self {
        self.channel = channel;
        self
    }

    pub fn set_source(&mut self, source: ActorId) -> &mut Self {
        self.source = source;
        self
    }

    pub fn add_recipient(&mut self, recipient: ActorId) -> &mut Self {
        self.recipients.push(recipient);
        self
    }

    pub fn add_recipients(&mut self, recipients: impl IntoIterator<Item = ActorId>) -> &mut Self {
        self.recipients.extend(recipients);
        self
    }

    pub fn add_message(&mut self, message: T) -> &mut Self {
        self.messages.push(message);
        self
    }

    pub fn add_messages(&mut self, messages: impl IntoIterator<Item = T>) -> &mut Self {
        self.messages.extend(messages);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Closes the writer: acquires a batch sized for the accumulated
    /// messages, fans one [`Delivery`] per recipient onto the owning
    /// outbox's send queue, and marks the writer closed. A writer closed
    /// with zero recipients is silently dropped (`spec.md` §4.3) — no batch
    /// is ever allocated for it.
    ///
    /// Closing an already-closed writer is a programmer error: debug builds
    /// assert, release builds no-op.
    pub fn close(&mut self) {
        if self.closed {
            debug_assert!(false, "writer already closed");
            return;
        }
        self.closed = true;

        if self.recipients.is_empty() {
            self.messages.clear();
            return;
        }

        let message_count = self.messages.len();
        let (mut batch, fresh) = BatchPool::acquire_from(&self.pool, message_count);
        if fresh {
            self.metrics.add_pool_allocation();
        }
        let recipients = {
            let inner = Arc::get_mut(&mut batch).expect("freshly acquired batch has no other owners");
            inner.source = self.source;
            inner.channel = self.channel;
            inner.recipients = std::mem::take(&mut self.recipients);
            inner.messages = std::mem::take(&mut self.messages);
            inner.recipients().to_vec()
        };

        let release = release_fn_for::<T>();
        let source = self.source;
        let channel = self.channel;
        let erased = erase(batch);
        for dest in recipients {
            self.send_queue.push(Delivery {
                dest,
                source,
                channel,
                batch: Arc::clone(&erased),
                release,
                error: None,
            });
            self.metrics.add_sent(1);
        }
    }
}

impl<T> Drop for Writer<T> {
    fn drop(&mut self) {
        debug_assert!(self.closed || self.recipients.is_empty(), "writer dropped without closing a pending send");
    }
}

