//! Envelope id allocation
//!
//! One counter for the whole process: every actor draws from it so no two
//! concurrently pending requests sent from this context share an id.

use std::sync::atomic::{AtomicU64, Ordering};

static ENVELOPE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique, non-zero envelope id
pub fn next_envelope_id() -> u64 {
    ENVELOPE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}
