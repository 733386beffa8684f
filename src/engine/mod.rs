//! Session core: prefetching, decision dispatch and the session state machine.
//!
//! Everything here is independent of the terminal. The backend is reached
//! through [`CandidateSource`] and [`DecisionSink`], and the screen through
//! [`Presenter`].

pub mod candidate;
pub mod controller;
pub mod dispatcher;
pub mod liveness;
pub mod presenter;
pub mod queue;
pub mod retry;
pub mod source;
pub mod state;

#[cfg(test)]
pub mod testing;

pub use candidate::{Candidate, Decision, DisplaySlot, Verdict};
pub use controller::{DecisionOutcome, SessionController};
pub use dispatcher::{Ack, ActionDispatcher, DecisionSink, DispatchOutcome, RejectReason};
pub use liveness::Liveness;
pub use presenter::Presenter;
pub use queue::PrefetchQueue;
pub use retry::{Backoff, OperationKind, RetryConfig, RetryContext, RetryError, RetryPolicy};
pub use source::CandidateSource;
pub use state::{InvalidTransition, SessionEvent, SessionState};

/// Tunables for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Buffered candidates below which a background refill starts.
    pub low_water_mark: usize,
    pub fetch_retry: RetryConfig,
    pub submit_retry: RetryConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            low_water_mark: 2,
            fetch_retry: RetryConfig::fetch(),
            submit_retry: RetryConfig::submit(),
        }
    }
}
