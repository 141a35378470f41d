//! Debug assertion macros for the runtime's invariants.
//!
//! Zero overhead in release builds (`#[cfg(debug_assertions)]`). Mirrors the
//! `INV-*` tagging convention so assertion failures can be traced back to the
//! specific invariant in `spec.md` §8.

// =============================================================================
// INV-SEQ-01 / INV-SEQ-02: bounded, monotonic ring counters
// =============================================================================

/// `0 <= (tail - head) <= capacity`, checked after a commit.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "INV-SEQ-01 violated: count {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

/// `head <= tail`, checked after advancing head.
macro_rules! debug_assert_head_not_past_tail {
    ($new_head:expr, $tail:expr) => {
        debug_assert!(
            $new_head <= $tail,
            "INV-SEQ-01 violated: advancing head {} beyond tail {}",
            $new_head,
            $tail
        )
    };
}

/// A sequence counter only ever increases.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "INV-SEQ-02 violated: {} decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

// =============================================================================
// INV-BATCH-01: release-exactly-once
// =============================================================================

/// A batch's release counter never exceeds its recipient count.
macro_rules! debug_assert_release_bounded {
    ($released:expr, $recipients:expr) => {
        debug_assert!(
            $released <= $recipients,
            "INV-BATCH-01 violated: released {} times, only {} recipients",
            $released,
            $recipients
        )
    };
}

// =============================================================================
// INV-OWN-01: single-owner actor execution
// =============================================================================

/// `Actor::run` only proceeds after winning the owner-flag CAS.
macro_rules! debug_assert_owner_acquired {
    ($acquired:expr) => {
        debug_assert!($acquired, "INV-OWN-01 violated: entered run() without owning the actor")
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_head_not_past_tail;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_owner_acquired;
pub(crate) use debug_assert_release_bounded;
