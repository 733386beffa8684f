use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::Instrument;
use uuid::Uuid;

use crate::error::ErrorKind;

use super::EngineSettings;
use super::candidate::{Candidate, DisplaySlot, Verdict};
use super::dispatcher::{ActionDispatcher, DecisionSink, DispatchOutcome};
use super::liveness::Liveness;
use super::presenter::Presenter;
use super::queue::PrefetchQueue;
use super::retry::RetryPolicy;
use super::source::CandidateSource;
use super::state::{InvalidTransition, SessionEvent, SessionState};

/// Result of a user decision as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Nothing was on screen, or a decision was already being written.
    Ignored,
    /// The card was consumed and the session moved on to `state`.
    Advanced {
        acknowledged: bool,
        state: SessionState,
    },
    /// The session stopped while the decision was in flight.
    Stopped,
}

#[derive(Debug)]
struct ControllerState {
    state: SessionState,
    current: Option<DisplaySlot>,
    next_seq: u64,
    history: Vec<SessionState>,
}

impl ControllerState {
    fn apply(&mut self, event: SessionEvent) -> Result<SessionState, InvalidTransition> {
        let next = self.state.next(event)?;
        tracing::debug!(from = %self.state, to = %next, ?event, "session transition");
        self.history.push(self.state);
        self.state = next;
        Ok(next)
    }
}

/// Owns one swiping session: the prefetch queue, the display slot and the
/// decision dispatcher. The presentation layer talks only to this type.
///
/// All methods take `&self`, so input events can race each other; the state
/// machine decides which ones take effect.
pub struct SessionController<S, K, P> {
    id: Uuid,
    span: tracing::Span,
    queue: PrefetchQueue<S>,
    dispatcher: ActionDispatcher<K>,
    presenter: P,
    liveness: Liveness,
    inner: Mutex<ControllerState>,
}

impl<S, K, P> SessionController<S, K, P>
where
    S: CandidateSource,
    K: DecisionSink,
    P: Presenter,
{
    pub fn new(source: S, sink: K, presenter: P, settings: &EngineSettings) -> Self {
        let id = Uuid::new_v4();
        let liveness = Liveness::new();
        Self {
            id,
            span: tracing::info_span!("session", id = %id),
            queue: PrefetchQueue::new(
                source,
                RetryPolicy::new(settings.fetch_retry.clone()),
                settings.low_water_mark,
                liveness.clone(),
            ),
            dispatcher: ActionDispatcher::new(
                sink,
                RetryPolicy::new(settings.submit_retry.clone()),
                liveness.clone(),
            ),
            presenter,
            liveness,
            inner: Mutex::new(ControllerState {
                state: SessionState::Idle,
                current: None,
                next_seq: 0,
                history: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// States left so far, oldest first. The current state is not included.
    pub fn history(&self) -> Vec<SessionState> {
        self.lock().history.clone()
    }

    /// The candidate on screen, if any.
    pub fn current(&self) -> Option<Candidate> {
        self.lock().current.as_ref().map(|slot| slot.candidate.clone())
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn buffered(&self) -> usize {
        self.queue.len()
    }

    pub fn is_paused(&self) -> bool {
        self.queue.is_paused()
    }

    /// Idle → Loading → Displaying (or Error).
    pub async fn start(&self) -> Result<SessionState, InvalidTransition> {
        self.lock().apply(SessionEvent::Start)?;
        tracing::info!(parent: &self.span, "session started");
        Ok(self.load_next().instrument(self.span.clone()).await)
    }

    /// Error → Loading → Displaying (or Error again).
    pub async fn retry(&self) -> Result<SessionState, InvalidTransition> {
        self.lock().apply(SessionEvent::Retry)?;
        tracing::info!(parent: &self.span, "retrying after error");
        Ok(self.load_next().instrument(self.span.clone()).await)
    }

    /// Registers `verdict` against the candidate on screen right now and moves
    /// on once the write settles, whether or not the server confirmed it.
    pub async fn on_decision(&self, verdict: Verdict) -> DecisionOutcome {
        self.decide(verdict).instrument(self.span.clone()).await
    }

    async fn decide(&self, verdict: Verdict) -> DecisionOutcome {
        let slot = {
            let mut inner = self.lock();
            if !inner.state.accepts_decisions() {
                tracing::debug!(state = %inner.state, %verdict, "decision ignored");
                return DecisionOutcome::Ignored;
            }
            if let Err(err) = inner.apply(SessionEvent::DecisionIssued) {
                tracing::error!(%err, "decision not applied");
                return DecisionOutcome::Ignored;
            }
            inner.current.clone()
        };

        self.presenter.on_submitting();
        let outcome = self.dispatcher.submit(slot.as_ref(), verdict).await;

        if let (DispatchOutcome::Acknowledged { .. }, Some(slot)) = (&outcome, &slot) {
            self.presenter.on_decision_recorded(&slot.candidate, verdict);
        }

        {
            let mut inner = self.lock();
            if !self.liveness.is_alive() || inner.state.is_terminal() {
                return DecisionOutcome::Stopped;
            }
            if !outcome.should_advance() {
                // Only reachable if the dispatcher refused; keep the card up.
                if let Err(err) = inner.apply(SessionEvent::DecisionRejected) {
                    tracing::error!(%err, "could not restore display");
                }
                return DecisionOutcome::Ignored;
            }
            if let Err(err) = inner.apply(SessionEvent::DecisionSettled) {
                tracing::error!(%err, "could not settle decision");
                return DecisionOutcome::Ignored;
            }
            inner.current = None;
        }

        let acknowledged = matches!(outcome, DispatchOutcome::Acknowledged { .. });
        let state = self.load_next().await;
        if state.is_terminal() {
            return DecisionOutcome::Stopped;
        }
        DecisionOutcome::Advanced {
            acknowledged,
            state,
        }
    }

    /// Loading → Displaying or Error. Takes from the buffer when it can,
    /// otherwise fetches directly; refills the buffer once a card is up.
    async fn load_next(&self) -> SessionState {
        let result = match self.queue.try_take_next() {
            Some(candidate) => {
                tracing::debug!(movie_id = candidate.id, "served from prefetch buffer");
                Ok(candidate)
            }
            None => self.queue.next_candidate().await,
        };

        let mut inner = self.lock();
        if !self.liveness.is_alive() || inner.state.is_terminal() {
            return inner.state;
        }

        match result {
            Ok(candidate) => {
                if let Err(err) = inner.apply(SessionEvent::CandidateReady) {
                    tracing::error!(%err, "candidate arrived out of order");
                    return inner.state;
                }
                let seq = inner.next_seq;
                inner.next_seq += 1;
                inner.current = Some(DisplaySlot {
                    seq,
                    candidate: candidate.clone(),
                });
                drop(inner);

                tracing::info!(movie_id = candidate.id, title = %candidate.title, seq, "candidate displayed");
                self.presenter.on_candidate_ready(&candidate);
                self.queue.schedule_refill();
                SessionState::Displaying
            }
            Err(err) => {
                if let Err(transition) = inner.apply(SessionEvent::FetchExhausted) {
                    tracing::error!(%transition, "fetch failure arrived out of order");
                    return inner.state;
                }
                inner.current = None;
                drop(inner);

                let kind = ErrorKind::from(&err);
                tracing::error!(error = %err, %kind, "could not load a candidate");
                self.presenter.on_advance_blocked(kind);
                SessionState::Error
            }
        }
    }

    /// Stops background refills from starting. The card on screen and any
    /// decision in flight are unaffected.
    pub fn pause(&self) {
        self.queue.set_paused(true);
        tracing::info!(parent: &self.span, "prefetch paused");
    }

    pub fn resume(&self) {
        self.queue.set_paused(false);
        tracing::info!(parent: &self.span, "prefetch resumed");
        if matches!(
            self.state(),
            SessionState::Displaying | SessionState::Submitting
        ) {
            self.queue.schedule_refill();
        }
    }

    /// Ends the session. Retry loops and refills notice on their next check and
    /// discard whatever they were about to apply.
    pub fn stop(&self) {
        self.liveness.kill();
        {
            let mut inner = self.lock();
            // Stop is accepted from every state.
            let _ = inner.apply(SessionEvent::Stop);
            inner.current = None;
        }
        self.queue.discard();
        tracing::info!(parent: &self.span, "session stopped");
    }
}
