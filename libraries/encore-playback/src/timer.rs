//! Delay timer
//!
//! Fires a task after a delay, on a background thread. Only one scheduled
//! task is live at a time: scheduling a new one (or cancelling) invalidates
//! whatever was pending via a generation counter, so a sleeping thread
//! whose wait has been superseded simply exits without running its task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Cancellable single-shot delay timer
#[derive(Debug, Default)]
pub struct DelayTimer {
    generation: Arc<AtomicU64>,
}

impl DelayTimer {
    /// A timer with nothing scheduled
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run after `delay`, invalidating any previously
    /// scheduled task
    ///
    /// The task receives the generation it was scheduled under, so callers
    /// holding shared state can re-verify currency after reacquiring their
    /// locks (the generation check here races with cancellation).
    pub fn schedule<F>(&self, delay: Duration, task: F) -> u64
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let counter = Arc::clone(&self.generation);

        thread::spawn(move || {
            thread::sleep(delay);
            if counter.load(Ordering::SeqCst) == generation {
                task(generation);
            }
        });

        generation
    }

    /// Invalidate any scheduled task
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether the given generation is still the live one
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}
