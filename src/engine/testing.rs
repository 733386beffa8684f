//! Scripted collaborators shared by the engine and pairing tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{CandidateError, ErrorKind, SubmitError};
use crate::pairing::MatchEntry;

use super::candidate::{Candidate, Decision, Verdict};
use super::dispatcher::{Ack, DecisionSink};
use super::presenter::Presenter;
use super::source::CandidateSource;

pub fn candidate(id: u64) -> Candidate {
    Candidate {
        id,
        title: format!("Movie {id}"),
        poster_url: format!("https://image.tmdb.org/t/p/w500/{id}.jpg"),
        backdrop_url: None,
        overview: String::new(),
        rating: 7.0,
        release_year: Some(2001),
        genres: vec!["Drama".into()],
        trailer_url: None,
        details_pending: false,
    }
}

/// Polls `cond` until it holds. Sleeps between checks so paused-clock tests
/// can auto-advance.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(60), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Tracks calls and concurrency of a mock.
#[derive(Default)]
struct Counters {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Counters {
    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

struct SourceInner {
    script: Mutex<VecDeque<Result<Candidate, CandidateError>>>,
    /// Once the script runs out: generate fresh candidates, or report exhaustion.
    generate: bool,
    next_id: AtomicU64,
    latency: Mutex<Duration>,
    counters: Counters,
}

/// Candidate source that replays a script, then either keeps producing
/// numbered candidates (`always`) or reports `EmptyResult` (`from_script`).
#[derive(Clone)]
pub struct ScriptedSource {
    inner: Arc<SourceInner>,
}

impl ScriptedSource {
    fn build(script: Vec<Result<Candidate, CandidateError>>, generate: bool) -> Self {
        Self {
            inner: Arc::new(SourceInner {
                script: Mutex::new(script.into()),
                generate,
                next_id: AtomicU64::new(1),
                latency: Mutex::new(Duration::ZERO),
                counters: Counters::default(),
            }),
        }
    }

    pub fn always() -> Self {
        Self::build(Vec::new(), true)
    }

    pub fn from_script(script: Vec<Result<Candidate, CandidateError>>) -> Self {
        Self::build(script, false)
    }

    /// Queues `n` failures ahead of whatever comes next.
    pub fn then_fail_n(self, n: usize, err: CandidateError) -> Self {
        {
            let mut script = self.inner.script.lock().unwrap();
            for _ in 0..n {
                script.push_front(Err(err.clone()));
            }
        }
        self
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        *self.inner.latency.lock().unwrap() = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.inner.counters.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.inner.counters.max_in_flight.load(Ordering::SeqCst)
    }
}

impl CandidateSource for ScriptedSource {
    async fn fetch_candidate(&self) -> Result<Candidate, CandidateError> {
        let inner = &self.inner;
        inner.counters.enter();
        let latency = *inner.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let scripted = inner.script.lock().unwrap().pop_front();
        let result = match scripted {
            Some(result) => result,
            None if inner.generate => Ok(candidate(inner.next_id.fetch_add(1, Ordering::SeqCst))),
            None => Err(CandidateError::EmptyResult("script exhausted".into())),
        };
        inner.counters.leave();
        result
    }
}

struct SinkInner {
    /// Number of leading calls that fail; `usize::MAX` fails forever.
    failures: AtomicUsize,
    decisions: Mutex<Vec<Decision>>,
    counters: Counters,
}

/// Decision sink that counts writes. Yields once per call so concurrent
/// callers interleave the way real network writes do.
#[derive(Clone)]
pub struct CountingSink {
    inner: Arc<SinkInner>,
}

impl CountingSink {
    fn build(failures: usize) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                failures: AtomicUsize::new(failures),
                decisions: Mutex::new(Vec::new()),
                counters: Counters::default(),
            }),
        }
    }

    pub fn ok() -> Self {
        Self::build(0)
    }

    pub fn failing() -> Self {
        Self::build(usize::MAX)
    }

    pub fn calls(&self) -> usize {
        self.inner.counters.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.inner.counters.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn decisions(&self) -> Vec<Decision> {
        self.inner.decisions.lock().unwrap().clone()
    }
}

impl DecisionSink for CountingSink {
    async fn submit_decision(&self, decision: &Decision) -> Result<Ack, SubmitError> {
        let inner = &self.inner;
        inner.counters.enter();
        inner.decisions.lock().unwrap().push(decision.clone());
        tokio::task::yield_now().await;

        let fail = inner
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        inner.counters.leave();

        if fail {
            Err(SubmitError::Network("connection reset".into()))
        } else {
            Ok(Ack {
                message: Some(format!("Ação {} registrada com sucesso", decision.verdict.wire_tag())),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Candidate(u64),
    Submitting,
    Blocked(ErrorKind),
    Matches(Vec<MatchEntry>),
    Recorded(u64, Verdict),
}

/// Presenter that records every callback in order.
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    events: Arc<Mutex<Vec<Shown>>>,
}

impl RecordingPresenter {
    pub fn events(&self) -> Vec<Shown> {
        self.events.lock().unwrap().clone()
    }

    pub fn shown_ids(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Shown::Candidate(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn blocked(&self) -> Vec<ErrorKind> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Shown::Blocked(kind) => Some(kind),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Shown) {
        self.events.lock().unwrap().push(event);
    }
}

impl Presenter for RecordingPresenter {
    fn on_candidate_ready(&self, candidate: &Candidate) {
        self.push(Shown::Candidate(candidate.id));
    }

    fn on_submitting(&self) {
        self.push(Shown::Submitting);
    }

    fn on_advance_blocked(&self, kind: ErrorKind) {
        self.push(Shown::Blocked(kind));
    }

    fn on_match_list_ready(&self, matches: &[MatchEntry]) {
        self.push(Shown::Matches(matches.to_vec()));
    }

    fn on_decision_recorded(&self, candidate: &Candidate, verdict: Verdict) {
        self.push(Shown::Recorded(candidate.id, verdict));
    }
}
