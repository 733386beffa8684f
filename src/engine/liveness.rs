use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared stop flag for one session.
///
/// Background refills and retry loops cannot abort an in-flight request, so they
/// check this flag before every attempt and before applying a result instead.
#[derive(Debug, Clone)]
pub struct Liveness {
    stopped: Arc<AtomicBool>,
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.stopped.load(Ordering::Acquire)
    }

    /// Marks the session as stopped. Irreversible.
    pub fn kill(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}
