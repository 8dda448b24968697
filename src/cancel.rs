//! Cooperative cancellation signal
//!
//! A single shared flag set by the invoking side (typically a UI thread)
//! and polled by the copier at safe points, before each directory entry.
//! There is no forced preemption: a file copy in progress runs to
//! completion or failure before the flag is consulted again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag, cheap to clone across threads.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag(Arc::new(AtomicBool::new(false)))
    }

    /// Request cancellation of the operation polling this flag.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Re-arm the flag for a new operation.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
