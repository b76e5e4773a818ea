//! Run-scoped cancellation for network operations.
//!
//! A token is flipped either explicitly (Ctrl-C) or by reaching its deadline.
//! The git adapter polls it from transfer callbacks, so a clone or push that
//! is in flight stops at the next progress report.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that is only cancelled explicitly
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also cancels itself once `timeout` has elapsed
    pub fn with_timeout(timeout: Duration) -> Self {
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::SeqCst) {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
