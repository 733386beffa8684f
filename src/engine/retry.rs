use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;

use super::liveness::Liveness;

/// Upper bound on a single backoff delay.
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Which remote operation a retry loop is protecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    FetchCandidate,
    SubmitDecision,
    ReconcileMatches,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::FetchCandidate => write!(f, "FETCH_CANDIDATE"),
            OperationKind::SubmitDecision => write!(f, "SUBMIT_DECISION"),
            OperationKind::ReconcileMatches => write!(f, "RECONCILE_MATCHES"),
        }
    }
}

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    #[default]
    Fixed,
    Linear,
    Exponential,
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay in milliseconds before the first retry.
    pub base_delay_ms: u64,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fetch()
    }
}

impl RetryConfig {
    /// Candidate fetches: ten attempts, one second apart.
    pub fn fetch() -> Self {
        Self {
            max_attempts: 10,
            base_delay_ms: 1000,
            backoff: Backoff::Fixed,
        }
    }

    /// Decision submissions give up sooner: the user is waiting on the card.
    pub fn submit() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            backoff: Backoff::Fixed,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    ///
    /// - `Fixed`: `base`
    /// - `Linear`: `base * attempt`
    /// - `Exponential`: `base * 2^(attempt - 1)`
    ///
    /// Capped at thirty seconds.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let millis = match self.backoff {
            Backoff::Fixed => self.base_delay_ms,
            Backoff::Linear => self.base_delay_ms.saturating_mul(u64::from(attempt)),
            Backoff::Exponential => {
                let factor = 2u64.checked_pow(attempt - 1).unwrap_or(u64::MAX);
                self.base_delay_ms.saturating_mul(factor)
            }
        };
        Duration::from_millis(millis).min(MAX_DELAY)
    }
}

/// Bookkeeping for one `execute` call. Lives only as long as the loop.
#[derive(Debug, Clone)]
pub struct RetryContext {
    pub kind: OperationKind,
    pub attempt: u32,
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryContext {
    fn new(kind: OperationKind, config: &RetryConfig) -> Self {
        Self {
            kind,
            attempt: 0,
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// Terminal outcome of a retry loop that did not succeed.
#[derive(Debug, Clone, Error)]
pub enum RetryError<E> {
    /// Every attempt failed; `last` is the final attempt's error.
    #[error("{kind} gave up after {attempts} attempts: {last}")]
    Exhausted {
        kind: OperationKind,
        attempts: u32,
        last: E,
    },

    /// The session stopped while the loop was running.
    #[error("{kind} cancelled because the session stopped")]
    Cancelled { kind: OperationKind },
}

impl<E> RetryError<E> {
    pub fn kind(&self) -> OperationKind {
        match self {
            RetryError::Exhausted { kind, .. } | RetryError::Cancelled { kind } => *kind,
        }
    }
}

/// Bounded retry wrapper shared by candidate fetches and decision submissions.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Runs `op` until it succeeds, attempts run out, or the session stops.
    ///
    /// Liveness is checked before every attempt and again after every backoff
    /// sleep, so a stopped session never starts another request.
    pub async fn execute<T, E, F, Fut>(
        &self,
        kind: OperationKind,
        liveness: &Liveness,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut ctx = RetryContext::new(kind, &self.config);

        loop {
            if !liveness.is_alive() {
                tracing::debug!(%kind, attempt = ctx.attempt, "retry loop cancelled");
                return Err(RetryError::Cancelled { kind });
            }

            ctx.attempt += 1;
            match op().await {
                Ok(value) => {
                    if ctx.attempt > 1 {
                        tracing::info!(%kind, attempt = ctx.attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if ctx.exhausted() => {
                    tracing::warn!(
                        %kind,
                        attempts = ctx.attempt,
                        error = %err,
                        "giving up"
                    );
                    return Err(RetryError::Exhausted {
                        kind,
                        attempts: ctx.attempt,
                        last: err,
                    });
                }
                Err(err) => {
                    let delay = self.config.delay_for_attempt(ctx.attempt);
                    tracing::warn!(
                        %kind,
                        attempt = ctx.attempt,
                        max_attempts = ctx.max_attempts,
                        base_delay_ms = ctx.base_delay.as_millis() as u64,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
