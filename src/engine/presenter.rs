use crate::error::ErrorKind;
use crate::pairing::MatchEntry;

use super::candidate::{Candidate, Verdict};

/// Presentation collaborator the session core calls into.
///
/// Callbacks are synchronous and must not block; the core invokes them
/// outside of its internal locks.
pub trait Presenter: Send + Sync {
    /// A new card is on screen. Action controls are enabled again.
    fn on_candidate_ready(&self, candidate: &Candidate);

    /// A decision is being written. Action controls are suspended.
    fn on_submitting(&self);

    /// No candidate could be fetched; offer a retry.
    fn on_advance_blocked(&self, kind: ErrorKind);

    fn on_match_list_ready(&self, matches: &[MatchEntry]);

    /// The server confirmed a decision. Default is a no-op.
    fn on_decision_recorded(&self, _candidate: &Candidate, _verdict: Verdict) {}
}
