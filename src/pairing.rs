//! Partner connection and match listing.
//!
//! Peripheral to the swiping session: a user pairs with one partner, and the
//! server turns mutual likes into matches when asked to reconcile.

use std::future::Future;

use thiserror::Error;

use crate::backend::types::{
    ConnectRequest, ConnectResponse, ConnectionsResponse, MatchRecord, MatchesResponse,
    ReconcileResponse,
};
use crate::backend::{BackendClient, BackendError, TmdbClient};
use crate::engine::{Liveness, OperationKind, Presenter, RetryConfig, RetryError, RetryPolicy};

/// The active partner of the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerConnection {
    pub partner_id: u64,
    pub partner_display_name: String,
}

/// One mutual like, as shown in the match list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEntry {
    pub candidate_id: String,
    pub partner_display_name: String,
    pub partner_id: Option<u64>,
    /// Filled in from TMDB when a details client is configured.
    pub title: Option<String>,
    pub poster_url: Option<String>,
}

impl From<MatchRecord> for MatchEntry {
    fn from(record: MatchRecord) -> Self {
        let candidate_id = match record.movie_id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        Self {
            candidate_id,
            partner_display_name: record.partner_username,
            partner_id: record.partner_id,
            title: None,
            poster_url: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum PairingError {
    #[error("invalid partner id: {0:?}")]
    InvalidTarget(String),

    #[error("connection refused: {0}")]
    Refused(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Server endpoints behind pairing and matches.
pub trait PairingBackend: Send + Sync {
    fn connections(&self) -> impl Future<Output = Result<ConnectionsResponse, BackendError>> + Send;

    fn connect(
        &self,
        req: &ConnectRequest,
    ) -> impl Future<Output = Result<ConnectResponse, BackendError>> + Send;

    /// Asks the server to recompute matches. Safe to repeat.
    fn reconcile(&self) -> impl Future<Output = Result<ReconcileResponse, BackendError>> + Send;

    fn match_list(&self) -> impl Future<Output = Result<MatchesResponse, BackendError>> + Send;
}

impl PairingBackend for BackendClient {
    async fn connections(&self) -> Result<ConnectionsResponse, BackendError> {
        BackendClient::connections(self).await
    }

    async fn connect(&self, req: &ConnectRequest) -> Result<ConnectResponse, BackendError> {
        BackendClient::connect(self, req).await
    }

    async fn reconcile(&self) -> Result<ReconcileResponse, BackendError> {
        let resp = self.reconcile_matches().await?;
        if !resp.success {
            return Err(BackendError::Status {
                status: 200,
                message: resp
                    .message
                    .unwrap_or_else(|| "reconciliation not confirmed".to_string()),
            });
        }
        Ok(resp)
    }

    async fn match_list(&self) -> Result<MatchesResponse, BackendError> {
        self.matches().await
    }
}

pub struct PairingService<B> {
    backend: B,
    retry: RetryPolicy,
    liveness: Liveness,
    details: Option<TmdbClient>,
}

impl<B: PairingBackend> PairingService<B> {
    pub fn new(backend: B, retry: RetryConfig) -> Self {
        Self {
            backend,
            retry: RetryPolicy::new(retry),
            liveness: Liveness::new(),
            details: None,
        }
    }

    /// Labels matches with title and poster looked up on TMDB.
    pub fn with_details(mut self, details: TmdbClient) -> Self {
        self.details = Some(details);
        self
    }

    /// Current partner, if any. The first connection the server reports is the active one.
    pub async fn connection_status(&self) -> Result<Option<PartnerConnection>, PairingError> {
        let resp = self.backend.connections().await?;
        Ok(resp.connections.into_iter().next().map(|c| PartnerConnection {
            partner_id: c.partner_id,
            partner_display_name: c.partner_username,
        }))
    }

    /// Requests a connection with `target`. Sent once: the server refuses duplicates,
    /// so a retry could only turn a success into a refusal.
    pub async fn connect(&self, target: &str) -> Result<PartnerConnection, PairingError> {
        let target = target.trim();
        if target.is_empty() || !target.chars().all(|c| c.is_ascii_digit()) {
            return Err(PairingError::InvalidTarget(target.to_string()));
        }

        let req = ConnectRequest {
            target_user_id: target.to_string(),
        };
        let resp = self.backend.connect(&req).await?;
        if !resp.success {
            let message = resp
                .message
                .unwrap_or_else(|| "server refused the connection".to_string());
            tracing::warn!(target, %message, "connection refused");
            return Err(PairingError::Refused(message));
        }

        let partner_id = resp
            .partner_id
            .or_else(|| target.parse().ok())
            .ok_or_else(|| PairingError::InvalidTarget(target.to_string()))?;
        let partner = PartnerConnection {
            partner_id,
            partner_display_name: resp.partner_username.unwrap_or_else(|| target.to_string()),
        };
        tracing::info!(partner_id, partner = %partner.partner_display_name, "connected");
        Ok(partner)
    }

    /// Reconciles, then loads the match list and hands it to `presenter`.
    ///
    /// A reconciliation that keeps failing is logged and skipped; the list the
    /// server already has is still shown.
    pub async fn refresh_matches(
        &self,
        presenter: &impl Presenter,
    ) -> Result<Vec<MatchEntry>, PairingError> {
        let backend = &self.backend;
        match self
            .retry
            .execute(OperationKind::ReconcileMatches, &self.liveness, || {
                backend.reconcile()
            })
            .await
        {
            Ok(resp) => tracing::debug!(message = ?resp.message, "matches reconciled"),
            Err(RetryError::Exhausted { attempts, last, .. }) => {
                tracing::warn!(attempts, error = %last, "reconciliation failed, loading existing matches");
            }
            Err(RetryError::Cancelled { .. }) => {}
        }

        let resp = backend.match_list().await?;
        if let Some(error) = resp.error.filter(|_| !resp.success) {
            return Err(PairingError::Refused(error));
        }
        let mut entries: Vec<MatchEntry> =
            resp.matches.into_iter().map(MatchEntry::from).collect();
        self.label(&mut entries).await;
        tracing::info!(count = entries.len(), "match list loaded");
        presenter.on_match_list_ready(&entries);
        Ok(entries)
    }

    // A failed lookup leaves the entry unlabelled; the id is still shown.
    async fn label(&self, entries: &mut [MatchEntry]) {
        let Some(details) = &self.details else {
            return;
        };
        for entry in entries.iter_mut() {
            match details.movie(&entry.candidate_id).await {
                Ok(movie) => {
                    entry.poster_url = movie.poster_url();
                    entry.title = Some(movie.title);
                }
                Err(err) => {
                    tracing::debug!(movie_id = %entry.candidate_id, error = %err, "no details for match");
                }
            }
        }
    }
}
