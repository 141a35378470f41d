//! Unbounded SPSC queue built by chaining geometrically doubling
//! [`RingBuffer`]s.
//!
//! Per `spec.md` §4.1: the producer fills the current write node; when full,
//! it allocates a successor with double the capacity, links it with a
//! `Release` store, then enqueues into the new node. The consumer drains the
//! current read node; when empty, it checks for a linked successor
//! (`Acquire` load) and advances into it. A node is only reclaimed once the
//! consumer has moved past it — the producer never revisits an earlier node,
//! so there is no concurrent access to a freed node.

use crate::ring::RingBuffer;
use std::cell::UnsafeCell;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicPtr, Ordering};

/// Default initial node capacity, per `spec.md` §4.1.
pub const DEFAULT_INITIAL_CAPACITY: usize = 32;

struct Node<T> {
    ring: RingBuffer<T>,
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn new(capacity: usize) -> Box<Self> {
        Box::new(Self {
            ring: RingBuffer::new(capacity),
            next: AtomicPtr::new(std::ptr::null_mut()),
        })
    }
}

/// An unbounded single-producer/single-consumer queue.
///
/// Only one thread may call [`push`](Self::push) and only one (possibly
/// different) thread may call [`pop`](Self::pop) — the same SPSC contract as
/// [`RingBuffer`], just without a fixed capacity.
pub struct RingBufferChain<T> {
    // Owned and mutated only by the producer thread.
    write_node: UnsafeCell<NonNull<Node<T>>>,
    // Owned and mutated only by the consumer thread.
    read_node: UnsafeCell<NonNull<Node<T>>>,
}

// Safety: `write_node` is touched only from `push` (producer), `read_node`
// only from `pop` (consumer). The two may run concurrently on different
// threads but never touch each other's cell; the underlying `Node::ring` is
// itself a correctly synchronized SPSC ring, and `next` is published with
// `Release`/read with `Acquire`.
unsafe impl<T: Send> Send for RingBufferChain<T> {}
unsafe impl<T: Send> Sync for RingBufferChain<T> {}

impl<T> RingBufferChain<T> {
    pub fn new() -> Self {
        Self::with_initial_capacity(DEFAULT_INITIAL_CAPACITY)
    }

    pub fn with_initial_capacity(capacity: usize) -> Self {
        let node = NonNull::from(Box::leak(Node::new(capacity)));
        Self {
            write_node: UnsafeCell::new(node),
            read_node: UnsafeCell::new(node),
        }
    }

    /// Enqueues `item`, growing the chain (doubling capacity) if the current
    /// write node is full. Never fails.
    pub fn push(&self, item: T) {
        // SAFETY: only the producer thread accesses `write_node`.
        let write_node = unsafe { *self.write_node.get() };
        let node = unsafe { write_node.as_ref() };

        match node.ring.try_push(item) {
            Ok(()) => {}
            Err(item) => {
                let new_capacity = node.ring.capacity() * 2;
                let mut new_node = Node::new(new_capacity);
                // A fresh node always has room for one item.
                new_node.ring.try_push(item).ok().expect("fresh node has capacity");
                let new_ptr = NonNull::from(Box::leak(new_node));

                // Publish the link before any consumer can observe it.
                node.next.store(new_ptr.as_ptr(), Ordering::Release);
                // SAFETY: only the producer thread accesses `write_node`.
                unsafe {
                    *self.write_node.get() = new_ptr;
                }
            }
        }
    }

    /// Dequeues one item, advancing across node boundaries as needed.
    /// Returns `None` only when the whole chain is currently empty.
    pub fn pop(&self) -> Option<T> {
        loop {
            // SAFETY: only the consumer thread accesses `read_node`.
            let read_node = unsafe { *self.read_node.get() };
            let node = unsafe { read_node.as_ref() };

            if let Some(item) = node.ring.try_pop() {
                return Some(item);
            }

            let next = node.next.load(Ordering::Acquire);
            let Some(next) = NonNull::new(next) else {
                return None;
            };

            // The current node is fully drained (`try_pop` returned `None`
            // and a successor exists, so no more items will ever land here)
            // and the consumer is the sole remaining owner — reclaim it.
            unsafe {
                *self.read_node.get() = next;
                drop(Box::from_raw(read_node.as_ptr()));
            }
        }
    }

    /// Returns the capacities of each node currently in the chain, from the
    /// (consumer's) current read node onward. Diagnostic/testing use only —
    /// call only when no producer/consumer activity races the traversal.
    pub fn node_capacities(&self) -> Vec<usize> {
        let mut out = Vec::new();
        // SAFETY: diagnostic traversal; caller guarantees exclusive access.
        let mut current = unsafe { *self.read_node.get() };
        loop {
            let node = unsafe { current.as_ref() };
            out.push(node.ring.capacity());
            match NonNull::new(node.next.load(Ordering::Acquire)) {
                Some(next) => current = next,
                None => break,
            }
        }
        out
    }
}

impl<T> Default for RingBufferChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for RingBufferChain<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` guarantees no other access is live.
        let mut current = Some(unsafe { *self.read_node.get() });
        while let Some(ptr) = current {
            let mut node = unsafe { Box::from_raw(ptr.as_ptr()) };
            current = NonNull::new(*node.next.get_mut());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_within_and_across_nodes() {
        let chain = RingBufferChain::<u32>::with_initial_capacity(2);
        for i in 1..=40u32 {
            chain.push(i);
        }
        let mut out = Vec::new();
        while let Some(v) = chain.pop() {
            out.push(v);
        }
        assert_eq!(out, (1..=40u32).collect::<Vec<_>>());
    }

    #[test]
    fn grows_geometrically_from_initial_capacity() {
        let chain = RingBufferChain::<u32>::with_initial_capacity(2);
        for i in 1..=40u32 {
            chain.push(i);
        }
        let caps = chain.node_capacities();
        assert!(caps.len() >= 5, "expected >=5 nodes, got {caps:?}");
        assert_eq!(&caps[..5], &[2, 4, 8, 16, 32]);
    }

    #[test]
    fn empty_chain_pops_none() {
        let chain = RingBufferChain::<u32>::new();
        assert_eq!(chain.pop(), None);
    }

    #[test]
    fn interleaved_push_pop() {
        let chain = RingBufferChain::<u32>::with_initial_capacity(4);
        chain.push(1);
        chain.push(2);
        assert_eq!(chain.pop(), Some(1));
        chain.push(3);
        chain.push(4);
        chain.push(5);
        assert_eq!(chain.pop(), Some(2));
        assert_eq!(chain.pop(), Some(3));
        assert_eq!(chain.pop(), Some(4));
        assert_eq!(chain.pop(), Some(5));
        assert_eq!(chain.pop(), None);
    }

    #[test]
    fn drops_pending_items() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DROPS: AtomicUsize = AtomicUsize::new(0);
        struct Counted;
        impl Drop for Counted {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        let chain = RingBufferChain::<Counted>::with_initial_capacity(2);
        for _ in 0..10 {
            chain.push(Counted);
        }
        chain.pop();
        chain.pop();
        drop(chain);
        assert_eq!(DROPS.load(Ordering::SeqCst), 10);
    }
}
