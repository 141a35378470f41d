//! Loom-based concurrency tests.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! These model the two invariants that are load-bearing under concurrency —
//! INV-OWN-01 (an actor is driven by at most one thread at a time) and
//! INV-BATCH-01 (a batch is recycled by exactly one of its releasers) — with
//! loom's primitives standing in for `std::sync::atomic`, since loom needs to
//! own every atomic operation in the model to explore interleavings.

#![cfg(feature = "loom")]

use loom::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use loom::sync::Arc;
use loom::thread;

/// INV-OWN-01: a CAS-guarded flag, the same shape as `Actor::owner_flag`,
/// never admits two threads to its critical section at once.
#[test]
fn loom_owner_flag_excludes_concurrent_entry() {
    loom::model(|| {
        let owner_flag = Arc::new(AtomicBool::new(false));
        let overlap_detected = Arc::new(AtomicBool::new(false));
        let in_critical_section = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let owner_flag = Arc::clone(&owner_flag);
            let overlap_detected = Arc::clone(&overlap_detected);
            let in_critical_section = Arc::clone(&in_critical_section);
            handles.push(thread::spawn(move || {
                if owner_flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire).is_ok() {
                    if in_critical_section.swap(true, Ordering::AcqRel) {
                        overlap_detected.store(true, Ordering::SeqCst);
                    }
                    in_critical_section.store(false, Ordering::Release);
                    owner_flag.store(false, Ordering::Release);
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert!(!overlap_detected.load(Ordering::SeqCst), "INV-OWN-01 violated: overlapping owner_flag holders");
    });
}

/// INV-BATCH-01: a batch with `recipients` outstanding releases is recycled
/// by exactly one of the threads that call release, no matter the
/// interleaving — the same protocol as `Batch::record_release`.
#[test]
fn loom_batch_release_exactly_once() {
    loom::model(|| {
        const RECIPIENTS: usize = 2;
        let release_counter = Arc::new(AtomicUsize::new(0));
        let recycled_count = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..RECIPIENTS {
            let release_counter = Arc::clone(&release_counter);
            let recycled_count = Arc::clone(&recycled_count);
            handles.push(thread::spawn(move || {
                let previous = release_counter.fetch_add(1, Ordering::AcqRel);
                if previous + 1 == RECIPIENTS {
                    recycled_count.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(recycled_count.load(Ordering::SeqCst), 1, "INV-BATCH-01: batch recycled {} times, expected exactly 1", recycled_count.load(Ordering::SeqCst));
    });
}
