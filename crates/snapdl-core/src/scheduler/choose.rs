//! Worker count selection.

/// An explicit count wins (at least 1); otherwise one worker per item.
pub fn choose_worker_count(explicit: Option<usize>, items: usize) -> usize {
    match explicit {
        Some(n) => n.max(1),
        None => items.max(1),
    }
}
