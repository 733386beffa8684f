use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::error::CandidateError;

use super::candidate::Candidate;
use super::liveness::Liveness;
use super::retry::{OperationKind, RetryError, RetryPolicy};
use super::source::CandidateSource;

#[derive(Debug, Default)]
struct QueueState {
    buffer: VecDeque<Candidate>,
    /// Single-flight guard: a fetch (background or direct) is outstanding.
    refilling: bool,
    paused: bool,
    /// Failure of the most recent fetch, if it gave up. Cleared when a fetch is claimed.
    last_failure: Option<RetryError<CandidateError>>,
}

struct Shared<S> {
    source: S,
    retry: RetryPolicy,
    low_water_mark: usize,
    liveness: Liveness,
    state: Mutex<QueueState>,
    /// Woken whenever a fetch finishes, successfully or not.
    fetch_done: Notify,
}

impl<S> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the single-flight claim when a direct fetch ends, even if its
/// future is dropped, and wakes every waiter.
struct FetchClaim<'a, S>(&'a Shared<S>);

impl<S> Drop for FetchClaim<'_, S> {
    fn drop(&mut self) {
        self.0.lock().refilling = false;
        self.0.fetch_done.notify_waiters();
    }
}

/// Bounded lookahead buffer of candidates.
///
/// At most one fetch is outstanding at any time, whether it was started by a
/// background refill or by a caller that found the buffer empty.
pub struct PrefetchQueue<S> {
    shared: Arc<Shared<S>>,
}

impl<S: CandidateSource> PrefetchQueue<S> {
    pub fn new(source: S, retry: RetryPolicy, low_water_mark: usize, liveness: Liveness) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                retry,
                low_water_mark: low_water_mark.max(1),
                liveness,
                state: Mutex::new(QueueState::default()),
                fetch_done: Notify::new(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.shared.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn low_water_mark(&self) -> usize {
        self.shared.low_water_mark
    }

    pub fn is_refilling(&self) -> bool {
        self.shared.lock().refilling
    }

    /// Pops the head of the buffer, or `None` if the caller has to fetch.
    pub fn try_take_next(&self) -> Option<Candidate> {
        self.shared.lock().buffer.pop_front()
    }

    /// Starts a background refill unless one is running, the buffer is already
    /// at the low-water mark, refills are paused, or the session has stopped.
    pub fn schedule_refill(&self) {
        {
            let mut state = self.shared.lock();
            if !self.shared.liveness.is_alive()
                || state.paused
                || state.refilling
                || state.buffer.len() >= self.shared.low_water_mark
            {
                return;
            }
            state.refilling = true;
            state.last_failure = None;
        }

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { refill(shared).await });
    }

    /// Returns the next candidate: the buffered head if there is one, otherwise
    /// the result of the outstanding fetch, otherwise a direct fetch.
    ///
    /// Never starts a second fetch while one is in flight; it waits for the
    /// running one and takes its result from the buffer instead. If the fetch it
    /// waited on gave up, that failure is returned as is, so a caller never waits
    /// longer than one retry budget.
    pub async fn next_candidate(&self) -> Result<Candidate, RetryError<CandidateError>> {
        let kind = OperationKind::FetchCandidate;
        let mut waited = false;
        loop {
            if !self.shared.liveness.is_alive() {
                return Err(RetryError::Cancelled { kind });
            }

            // Register before inspecting state so a completion in between is not missed.
            let done = self.shared.fetch_done.notified();
            {
                let mut state = self.shared.lock();
                if let Some(candidate) = state.buffer.pop_front() {
                    return Ok(candidate);
                }
                if !state.refilling {
                    if let Some(err) = state.last_failure.clone().filter(|_| waited) {
                        tracing::debug!(error = %err, "in-flight fetch gave up");
                        return Err(err);
                    }
                    state.refilling = true;
                    state.last_failure = None;
                    break;
                }
            }
            tracing::debug!("buffer empty, waiting for in-flight fetch");
            done.await;
            waited = true;
        }

        let claim = FetchClaim(&self.shared);
        let source = &self.shared.source;
        let result = self
            .shared
            .retry
            .execute(kind, &self.shared.liveness, || source.fetch_candidate())
            .await;

        self.shared.lock().last_failure = result.as_ref().err().cloned();
        drop(claim);

        if !self.shared.liveness.is_alive() {
            return Err(RetryError::Cancelled { kind });
        }
        result
    }

    /// Pausing stops new refills from starting; an in-flight one still lands.
    pub fn set_paused(&self, paused: bool) {
        self.shared.lock().paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.shared.lock().paused
    }

    /// Drops every buffered candidate.
    pub fn discard(&self) {
        let dropped = {
            let mut state = self.shared.lock();
            let n = state.buffer.len();
            state.buffer.clear();
            n
        };
        self.shared.fetch_done.notify_waiters();
        tracing::debug!(dropped, "prefetch buffer discarded");
    }
}

/// Background refill loop: one fetch at a time until the buffer reaches the
/// low-water mark, the fetch fails for good, or refills are paused or stopped.
async fn refill<S: CandidateSource>(shared: Arc<Shared<S>>) {
    let kind = OperationKind::FetchCandidate;
    loop {
        let source = &shared.source;
        let result = shared
            .retry
            .execute(kind, &shared.liveness, || source.fetch_candidate())
            .await;

        let again = {
            let mut state = shared.lock();
            if !shared.liveness.is_alive() {
                state.refilling = false;
                state.buffer.clear();
                false
            } else {
                let succeeded = match result {
                    Ok(candidate) => {
                        tracing::debug!(
                            movie_id = candidate.id,
                            buffered = state.buffer.len() + 1,
                            "prefetched candidate"
                        );
                        state.buffer.push_back(candidate);
                        state.last_failure = None;
                        true
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "background refill failed");
                        state.last_failure = Some(err);
                        false
                    }
                };
                let again =
                    succeeded && !state.paused && state.buffer.len() < shared.low_water_mark;
                state.refilling = again;
                again
            }
        };

        shared.fetch_done.notify_waiters();
        if !again {
            return;
        }
    }
}
