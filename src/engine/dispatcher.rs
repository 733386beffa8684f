use std::future::Future;
use std::sync::{Mutex, PoisonError};

use crate::backend::BackendClient;
use crate::backend::types::ActionRequest;
use crate::error::SubmitError;

use super::candidate::{Decision, DisplaySlot, Verdict};
use super::liveness::Liveness;
use super::retry::{OperationKind, RetryError, RetryPolicy};

/// Server acknowledgement of a recorded decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    pub message: Option<String>,
}

/// Remote write of a single decision.
pub trait DecisionSink: Send + Sync + 'static {
    fn submit_decision(
        &self,
        decision: &Decision,
    ) -> impl Future<Output = Result<Ack, SubmitError>> + Send;
}

impl DecisionSink for BackendClient {
    async fn submit_decision(&self, decision: &Decision) -> Result<Ack, SubmitError> {
        let req = ActionRequest {
            movie_id: decision.candidate_id,
            action: decision.verdict.wire_tag().to_string(),
        };
        let resp = self.send_action(&req).await?;
        if !resp.success {
            return Err(SubmitError::Rejected {
                status: 200,
                message: resp
                    .error
                    .unwrap_or_else(|| "server did not confirm the decision".to_string()),
            });
        }
        Ok(Ack {
            message: resp.message,
        })
    }
}

/// Why a submission was refused before reaching the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing is on screen to decide about.
    NoCandidate,
    /// A decision for display slot `seq` is still being written.
    AlreadyInFlight { seq: u64 },
}

/// What happened to a submitted decision.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Acknowledged { decision: Decision, ack: Ack },
    /// Every attempt failed. The candidate still counts as consumed.
    Abandoned { decision: Decision, attempts: u32 },
    Rejected(RejectReason),
    Cancelled,
}

impl DispatchOutcome {
    /// Whether the session should move on to the next candidate.
    pub fn should_advance(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::Acknowledged { .. } | DispatchOutcome::Abandoned { .. }
        )
    }
}

/// Clears the in-flight marker when the submission ends, even if its future is dropped.
struct InFlight<'a>(&'a Mutex<Option<u64>>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Serializes decisions against the displayed candidate.
///
/// Only one submission is in flight at a time. Repeated input while one is
/// running is dropped (and logged), never queued.
pub struct ActionDispatcher<K> {
    sink: K,
    retry: RetryPolicy,
    liveness: Liveness,
    in_flight: Mutex<Option<u64>>,
}

impl<K: DecisionSink> ActionDispatcher<K> {
    pub fn new(sink: K, retry: RetryPolicy, liveness: Liveness) -> Self {
        Self {
            sink,
            retry,
            liveness,
            in_flight: Mutex::new(None),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Submits `verdict` for the candidate in `slot`.
    ///
    /// Exhausted retries are swallowed here: the outcome is `Abandoned` and the
    /// caller advances anyway, so a dead decision endpoint never pins the user
    /// to one card.
    pub async fn submit(&self, slot: Option<&DisplaySlot>, verdict: Verdict) -> DispatchOutcome {
        let Some(slot) = slot else {
            tracing::debug!(%verdict, "decision ignored: no candidate on screen");
            return DispatchOutcome::Rejected(RejectReason::NoCandidate);
        };

        let _guard = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(seq) = *in_flight {
                tracing::debug!(%verdict, seq, "decision ignored: submission already in flight");
                return DispatchOutcome::Rejected(RejectReason::AlreadyInFlight { seq });
            }
            *in_flight = Some(slot.seq);
            InFlight(&self.in_flight)
        };

        let decision = Decision::new(slot.candidate.id, verdict);
        let sink = &self.sink;
        let result = self
            .retry
            .execute(OperationKind::SubmitDecision, &self.liveness, || {
                sink.submit_decision(&decision)
            })
            .await;

        match result {
            Ok(ack) => {
                tracing::info!(
                    movie_id = decision.candidate_id,
                    %verdict,
                    "decision recorded"
                );
                DispatchOutcome::Acknowledged { decision, ack }
            }
            Err(RetryError::Exhausted { attempts, last, .. }) => {
                tracing::warn!(
                    movie_id = decision.candidate_id,
                    %verdict,
                    attempts,
                    error = %last,
                    "decision abandoned, moving on"
                );
                DispatchOutcome::Abandoned { decision, attempts }
            }
            Err(RetryError::Cancelled { .. }) => DispatchOutcome::Cancelled,
        }
    }
}
