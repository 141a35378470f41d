//! Fixed-capacity single-producer/single-consumer ring buffer.
//!
//! This is the leaf building block in `spec.md` §4.1: one producer calls
//! [`RingBuffer::try_push`], one consumer calls [`RingBuffer::try_pop`]. No
//! locks, no CAS loops — the SPSC contract lets head/tail be owned one side
//! each, published with `Release`/`Acquire` so the item written at a slot is
//! visible to the consumer strictly after the tail bump is visible.
//!
//! # Memory ordering
//!
//! - Producer: bump `tail` with `Release` after writing the slot. Reads its
//!   own cached view of `head` with no synchronization; refreshes it with an
//!   `Acquire` load only when the cache says the ring might be full.
//! - Consumer: bump `head` with `Release` after reading the slot. Reads its
//!   own cached view of `tail` with no synchronization; refreshes it with an
//!   `Acquire` load only when the cache says the ring might be empty.
//!
//! Sequence numbers are unbounded `u64`s rather than wrapped indices — the
//! buffer index is `sequence & mask`, computed only at slot-access time. This
//! sidesteps ABA entirely; wrap-around after 2^64 pushes isn't a practical
//! concern.

use crate::invariants::{
    debug_assert_bounded_count, debug_assert_head_not_past_tail, debug_assert_monotonic,
};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};

/// A single-producer/single-consumer bounded queue, capacity a power of two.
pub struct RingBuffer<T> {
    tail: CachePadded<AtomicU64>,
    cached_head: CachePadded<UnsafeCell<u64>>,
    head: CachePadded<AtomicU64>,
    cached_tail: CachePadded<UnsafeCell<u64>>,
    mask: usize,
    buffer: UnsafeCell<Box<[MaybeUninit<T>]>>,
}

// Safety: the SPSC protocol above ensures the buffer is never aliased
// mutably; `T: Send` is all that crosses the producer/consumer boundary.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T> RingBuffer<T> {
    /// Creates a ring with the given capacity, rounded up to a power of two.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        let mut buffer = Vec::with_capacity(capacity);
        buffer.resize_with(capacity, MaybeUninit::uninit);

        Self {
            tail: CachePadded::new(AtomicU64::new(0)),
            cached_head: CachePadded::new(UnsafeCell::new(0)),
            head: CachePadded::new(AtomicU64::new(0)),
            cached_tail: CachePadded::new(UnsafeCell::new(0)),
            mask: capacity - 1,
            buffer: UnsafeCell::new(buffer.into_boxed_slice()),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Relaxed);
        tail.wrapping_sub(head) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Relaxed) == self.head.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Attempts to enqueue `item`. Fails (returning `item` back) only when full.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let tail = self.tail.load(Ordering::Relaxed);

        // SAFETY: cached_head is only ever written by the producer (this path).
        let cached_head = unsafe { *self.cached_head.get() };
        if tail.wrapping_sub(cached_head) as usize >= self.capacity() {
            // Slow path: refresh from the consumer's published head.
            let head = self.head.load(Ordering::Acquire);
            // SAFETY: same single-writer justification as above; the Acquire
            // load just performed synchronizes with the consumer's Release.
            unsafe {
                *self.cached_head.get() = head;
            }
            if tail.wrapping_sub(head) as usize >= self.capacity() {
                return Err(item);
            }
        }

        let idx = (tail as usize) & self.mask;
        // SAFETY: slot `idx` lies in [tail, tail+capacity) which the consumer
        // has not reached yet (checked above), so only the producer touches it.
        unsafe {
            let buf = &mut *self.buffer.get();
            buf[idx] = MaybeUninit::new(item);
        }

        let new_tail = tail.wrapping_add(1);
        debug_assert_monotonic!("tail", tail, new_tail);
        debug_assert_bounded_count!(
            new_tail.wrapping_sub(self.head.load(Ordering::Relaxed)) as usize,
            self.capacity()
        );
        self.tail.store(new_tail, Ordering::Release);
        Ok(())
    }

    /// Attempts to dequeue one item. Returns `None` only when empty.
    pub fn try_pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);

        // SAFETY: cached_tail is only ever written by the consumer (this path).
        let mut cached_tail = unsafe { *self.cached_tail.get() };
        if head == cached_tail {
            cached_tail = self.tail.load(Ordering::Acquire);
            // SAFETY: same single-writer justification; this Acquire load
            // synchronizes with the producer's Release store on tail.
            unsafe {
                *self.cached_tail.get() = cached_tail;
            }
            if head == cached_tail {
                return None;
            }
        }

        let idx = (head as usize) & self.mask;
        // SAFETY: slot `idx` was published by the producer (tail advanced past
        // it, observed via the Acquire load above) and only the consumer reads it.
        let item = unsafe {
            let buf = &*self.buffer.get();
            buf[idx].assume_init_read()
        };

        let new_head = head.wrapping_add(1);
        debug_assert_monotonic!("head", head, new_head);
        debug_assert_head_not_past_tail!(new_head, cached_tail);
        self.head.store(new_head, Ordering::Release);
        Some(item)
    }
}

impl<T> Drop for RingBuffer<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        let count = tail.wrapping_sub(head) as usize;
        let buf = self.buffer.get_mut();
        for i in 0..count {
            let idx = (head as usize).wrapping_add(i) & self.mask;
            // SAFETY: slots in [head, tail) are initialized and not yet dropped.
            unsafe {
                ptr::drop_in_place(buf[idx].as_mut_ptr());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_roundtrip() {
        let ring = RingBuffer::<u64>::new(4);
        assert!(ring.try_push(1).is_ok());
        assert!(ring.try_push(2).is_ok());
        assert_eq!(ring.try_pop(), Some(1));
        assert_eq!(ring.try_pop(), Some(2));
        assert_eq!(ring.try_pop(), None);
    }

    #[test]
    fn full_rejects_and_returns_item() {
        let ring = RingBuffer::<u64>::new(2);
        assert!(ring.try_push(1).is_ok());
        assert!(ring.try_push(2).is_ok());
        assert_eq!(ring.try_push(3), Err(3));
        assert_eq!(ring.try_pop(), Some(1));
        assert!(ring.try_push(3).is_ok());
    }

    #[test]
    fn rounds_capacity_up_to_power_of_two() {
        let ring = RingBuffer::<u64>::new(5);
        assert_eq!(ring.capacity(), 8);
    }

    #[test]
    fn drops_remaining_items() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DROPS: AtomicUsize = AtomicUsize::new(0);
        struct Counted;
        impl Drop for Counted {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        let ring = RingBuffer::<Counted>::new(4);
        ring.try_push(Counted).unwrap();
        ring.try_push(Counted).unwrap();
        drop(ring);
        assert_eq!(DROPS.load(Ordering::SeqCst), 2);
    }
}
