//! Adaptive spin/yield backoff, re-exported from `crossbeam-utils`.
//!
//! `try_push`/`try_pop` never spin internally — an empty or full ring just
//! returns immediately and lets the caller decide whether to retry. This is
//! exposed for callers who *do* want to poll a ring or a worker's queue in a
//! loop (e.g. a custom pump loop outside [`crate::System`]) without busy-
//! waiting at full tilt.

pub use crossbeam_utils::Backoff;
