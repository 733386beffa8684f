use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A movie offered to the user for a decision.
///
/// Candidates are immutable once fetched. They move by value from the source
/// into the prefetch queue and from there into the display slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u64,
    pub title: String,
    /// Renderable poster URL. Never empty.
    pub poster_url: String,
    pub backdrop_url: Option<String>,
    pub overview: String,
    /// Average rating on a 0-10 scale; 0 means unknown.
    pub rating: f32,
    pub release_year: Option<u16>,
    pub genres: Vec<String>,
    pub trailer_url: Option<String>,
    /// Set when the server could not resolve the movie's details (genres).
    pub details_pending: bool,
}

impl Candidate {
    /// Rating as shown on the card: `8.4/10`, or `N/A` when unknown.
    pub fn rating_label(&self) -> String {
        if self.rating > 0.0 {
            format!("{:.1}/10", self.rating)
        } else {
            "N/A".to_string()
        }
    }
}

/// The user's decision on a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Like,
    Dislike,
    /// Sent on the wire as `indicate`.
    #[serde(rename = "indicate")]
    Recommend,
}

impl Verdict {
    /// Tag the decision endpoint expects.
    pub fn wire_tag(self) -> &'static str {
        match self {
            Verdict::Like => "like",
            Verdict::Dislike => "dislike",
            Verdict::Recommend => "indicate",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Verdict::Like => "liked",
            Verdict::Dislike => "disliked",
            Verdict::Recommend => "recommended",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Like => write!(f, "like"),
            Verdict::Dislike => write!(f, "dislike"),
            Verdict::Recommend => write!(f, "recommend"),
        }
    }
}

/// A verdict bound to the candidate it was issued against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub candidate_id: u64,
    pub verdict: Verdict,
    pub submitted_at: DateTime<Utc>,
}

impl Decision {
    pub fn new(candidate_id: u64, verdict: Verdict) -> Self {
        Self {
            candidate_id,
            verdict,
            submitted_at: Utc::now(),
        }
    }
}

/// The candidate currently on screen, tagged with a per-session sequence number.
///
/// The sequence number identifies the display slot, so a decision can be tied to
/// the exact showing the user acted on even if the same movie shows up again.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySlot {
    pub seq: u64,
    pub candidate: Candidate,
}
