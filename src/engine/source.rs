use std::future::Future;

use crate::backend::BackendClient;
use crate::backend::types::RandomMovieResponse;
use crate::error::CandidateError;

use super::candidate::Candidate;

/// Remote "give me one random candidate" call.
///
/// Implementations hold no session state; everything stateful lives in the
/// prefetch queue and the controller.
pub trait CandidateSource: Send + Sync + 'static {
    fn fetch_candidate(&self) -> impl Future<Output = Result<Candidate, CandidateError>> + Send;
}

impl CandidateSource for BackendClient {
    async fn fetch_candidate(&self) -> Result<Candidate, CandidateError> {
        let response = self.random_movie().await?;
        tracing::debug!(
            movie_id = ?response.id,
            category = ?response.category,
            server_attempts = ?response.attempts,
            total_seen = ?response.total_seen,
            "random movie received"
        );
        into_candidate(response)
    }
}

/// Validates a raw response into a renderable candidate.
///
/// A response without a poster is malformed rather than an empty success, so a
/// broken card is never displayed.
pub fn into_candidate(resp: RandomMovieResponse) -> Result<Candidate, CandidateError> {
    if !resp.success || resp.error.is_some() {
        let reason = resp
            .error
            .unwrap_or_else(|| "server reported no candidate".to_string());
        return Err(CandidateError::EmptyResult(reason));
    }

    let id = resp
        .id
        .ok_or_else(|| CandidateError::MalformedResult("missing id".into()))?;

    let poster_url = resp
        .poster_path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| CandidateError::MalformedResult(format!("movie {id} has no poster")))?;

    let title = resp
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| CandidateError::MalformedResult(format!("movie {id} has no title")))?;

    let details_pending = resp.genres.as_ref().is_none_or(|g| g.is_empty());

    Ok(Candidate {
        id,
        title,
        poster_url,
        backdrop_url: resp.backdrop_path.filter(|b| !b.is_empty()),
        overview: resp.overview.unwrap_or_default(),
        rating: resp.vote_average.unwrap_or(0.0),
        release_year: resp
            .release_year
            .as_deref()
            .and_then(|y| y.trim().parse().ok()),
        genres: resp.genres.unwrap_or_default(),
        trailer_url: resp.trailer_url.filter(|t| !t.is_empty()),
        details_pending,
    })
}
