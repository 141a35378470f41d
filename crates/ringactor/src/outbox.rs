//! Producer-side handle for sending messages (`spec.md` §4.3).
//!
//! Each worker thread, and the main thread, owns exactly one `Outbox` for
//! its whole lifetime. `begin_send::<T>()` hands out a [`Writer<T>`] — fresh,
//! or pulled from a per-type free list — scoped under whatever source
//! `enter_scope` last pushed. That scope is the "small stack of outbox
//! references" from the design notes collapsed down to the degenerate case
//! that actually occurs here: one outbox, one thread, source swapped in and
//! restored around each actor dispatch so a handler's `mail.outbox.begin_send`
//! defaults to the actor it was delivered to.

use crate::chain::RingBufferChain;
use crate::erased::Delivery;
use crate::id::ActorId;
use crate::metrics::Metrics;
use crate::pool::PoolRegistry;
use crate::writer::Writer;
use std::any::{Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

pub struct Outbox {
    send_queue: Arc<RingBufferChain<Delivery>>,
    /// Sends issued after shutdown land here instead of the live queue —
    /// nobody drains it, so they're dropped once the outbox itself is.
    null_sink: Arc<RingBufferChain<Delivery>>,
    metrics: Arc<Metrics>,
    pools: RefCell<PoolRegistry>,
    writers: RefCell<HashMap<TypeId, Box<dyn Any>>>,
    current_source: Cell<ActorId>,
    shutdown: Cell<bool>,
}

impl Outbox {
    pub(crate) fn new(send_queue: Arc<RingBufferChain<Delivery>>, metrics: Arc<Metrics>) -> Self {
        Self {
            send_queue,
            null_sink: Arc::new(RingBufferChain::new()),
            metrics,
            pools: RefCell::new(PoolRegistry::new()),
            writers: RefCell::new(HashMap::new()),
            current_source: Cell::new(ActorId::UNDEFINED),
            shutdown: Cell::new(false),
        }
    }

    /// Hands out a writer for `T`, reusing one from this outbox's per-type
    /// free list when available, defaulted to the currently scoped source.
    pub fn begin_send<T: Send + Sync + 'static>(&self) -> Writer<T> {
        let pool = self.pools.borrow_mut().get_or_create::<T>();
        let source = self.current_source.get();
        let sink = if self.shutdown.get() { Arc::clone(&self.null_sink) } else { Arc::clone(&self.send_queue) };

        let mut writers = self.writers.borrow_mut();
        let free_list = writers
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Vec::<Writer<T>>::new()))
            .downcast_mut::<Vec<Writer<T>>>()
            .expect("writer free list keyed by TypeId always downcasts to its own type");

        match free_list.pop() {
            Some(mut writer) => {
                writer.reopen(source);
                writer.rebind_sink(sink);
                writer
            }
            None => Writer::new(pool, sink, Arc::clone(&self.metrics), source),
        }
    }

    /// Convenience: begin a send, add one recipient and one message, close,
    /// and recycle the writer — the common case when a caller doesn't need
    /// the full `Writer` builder (e.g. a one-shot reply).
    pub fn send_one<T: Send + Sync + 'static>(&self, dest: ActorId, message: T) {
        let mut writer = self.begin_send::<T>();
        writer.add_recipient(dest);
        writer.add_message(message);
        writer.close();
        self.recycle(writer);
    }

    /// Convenience: one recipient, a batch of messages.
    pub fn send_all<T: Send + Sync + 'static>(&self, dest: ActorId, messages: impl IntoIterator<Item = T>) {
        let mut writer = self.begin_send::<T>();
        writer.add_recipient(dest);
        writer.add_messages(messages);
        writer.close();
        self.recycle(writer);
    }

    /// Returns a closed writer to its type's free list for reuse.
    pub fn recycle<T: Send + Sync + 'static>(&self, writer: Writer<T>) {
        debug_assert!(writer.is_closed(), "recycled writer was never closed");
        let mut writers = self.writers.borrow_mut();
        let free_list = writers
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Vec::<Writer<T>>::new()))
            .downcast_mut::<Vec<Writer<T>>>()
            .expect("writer free list keyed by TypeId always downcasts to its own type");
        free_list.push(writer);
    }

    /// Pushes `source` as the scope's current source, restoring the previous
    /// one when the guard drops. Entered once per actor dispatch.
    pub(crate) fn enter_scope(&self, source: ActorId) -> ScopeGuard<'_> {
        let previous = self.current_source.replace(source);
        ScopeGuard { outbox: self, previous }
    }

    pub(crate) fn send_queue(&self) -> &Arc<RingBufferChain<Delivery>> {
        &self.send_queue
    }

    pub(crate) fn mark_shutdown(&self) {
        self.shutdown.set(true);
    }
}

pub(crate) struct ScopeGuard<'a> {
    outbox: &'a Outbox,
    previous: ActorId,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.outbox.current_source.set(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_with_no_recipients_is_silently_dropped() {
        let outbox = Outbox::new(Arc::new(RingBufferChain::new()), Arc::new(crate::metrics::Metrics::new()));
        let mut writer = outbox.begin_send::<u32>();
        writer.add_message(1);
        writer.close();
        assert!(outbox.send_queue.pop().is_none());
    }

    #[test]
    fn closed_writer_fans_one_delivery_per_recipient() {
        let outbox = Outbox::new(Arc::new(RingBufferChain::new()), Arc::new(crate::metrics::Metrics::new()));
        let mut writer = outbox.begin_send::<u32>();
        writer.add_recipient(ActorId(1));
        writer.add_recipient(ActorId(2));
        writer.add_message(42);
        writer.close();

        let first = outbox.send_queue.pop().expect("first delivery");
        let second = outbox.send_queue.pop().expect("second delivery");
        assert_eq!(first.dest, ActorId(1));
        assert_eq!(second.dest, ActorId(2));
        assert!(outbox.send_queue.pop().is_none());
    }

    #[test]
    fn scope_restores_previous_source_on_drop() {
        let outbox = Outbox::new(Arc::new(RingBufferChain::new()), Arc::new(crate::metrics::Metrics::new()));
        outbox.current_source.set(ActorId(7));
        {
            let _guard = outbox.enter_scope(ActorId(9));
            assert_eq!(outbox.current_source.get(), ActorId(9));
        }
        assert_eq!(outbox.current_source.get(), ActorId(7));
    }
}
