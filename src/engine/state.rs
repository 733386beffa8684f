use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle states of a swiping session.
///
/// A session flows: IDLE → LOADING → DISPLAYING → SUBMITTING → LOADING → ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Loading,
    Displaying,
    Submitting,
    /// A candidate could not be fetched; waits for a user-initiated retry.
    Error,
    /// Terminal. Reached only through `stop()`.
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "IDLE"),
            SessionState::Loading => write!(f, "LOADING"),
            SessionState::Displaying => write!(f, "DISPLAYING"),
            SessionState::Submitting => write!(f, "SUBMITTING"),
            SessionState::Error => write!(f, "ERROR"),
            SessionState::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Inputs that move a session between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    Start,
    CandidateReady,
    FetchExhausted,
    DecisionIssued,
    /// The decision was acknowledged or abandoned; either way the card is consumed.
    DecisionSettled,
    /// The dispatcher refused the decision; the card stays on screen.
    DecisionRejected,
    Retry,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} while {from}")]
pub struct InvalidTransition {
    pub from: SessionState,
    pub event: SessionEvent,
}

impl SessionState {
    /// Computes the state reached by applying `event`, or rejects the event.
    ///
    /// - `Stop` is accepted from every state and always lands in `Stopped`.
    /// - `Stopped` accepts nothing else.
    /// - `Error` only leaves through `Retry`.
    pub fn next(self, event: SessionEvent) -> Result<SessionState, InvalidTransition> {
        use self::SessionEvent as E;
        use self::SessionState as S;

        let next = match (self, event) {
            (_, E::Stop) => S::Stopped,
            (S::Idle, E::Start) => S::Loading,
            (S::Error, E::Retry) => S::Loading,
            (S::Loading, E::CandidateReady) => S::Displaying,
            (S::Loading, E::FetchExhausted) => S::Error,
            (S::Displaying, E::DecisionIssued) => S::Submitting,
            (S::Submitting, E::DecisionSettled) => S::Loading,
            (S::Submitting, E::DecisionRejected) => S::Displaying,
            (from, event) => return Err(InvalidTransition { from, event }),
        };
        Ok(next)
    }

    pub fn accepts_decisions(self) -> bool {
        self == SessionState::Displaying
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Stopped
    }
}
