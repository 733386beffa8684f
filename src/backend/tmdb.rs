use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use super::client::decode;
use super::error::BackendError;

pub const DEFAULT_TMDB_URL: &str = "https://api.themoviedb.org/3";

const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w200";

/// Subset of TMDB's `GET /movie/{id}` used to label matches.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MovieDetails {
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl MovieDetails {
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{POSTER_BASE}{p}"))
    }
}

/// Read-only TMDB client. Matches only carry movie ids, so titles come from here.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            language: language.into(),
        })
    }

    pub async fn movie(&self, movie_id: &str) -> Result<MovieDetails, BackendError> {
        let response = self
            .client
            .get(format!("{}/movie/{movie_id}", self.base_url))
            .query(&[("api_key", &self.api_key), ("language", &self.language)])
            .send()
            .await?;
        decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TmdbClient {
        TmdbClient::new(server.uri(), "k3y", "pt-BR", Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn movie_sends_key_and_language() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/550"))
            .and(query_param("api_key", "k3y"))
            .and(query_param("language", "pt-BR"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 550,
                "title": "Clube da Luta",
                "poster_path": "/fc.jpg",
                "overview": "..."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let details = client_for(&server).movie("550").await.unwrap();
        assert_eq!(details.title, "Clube da Luta");
        assert_eq!(
            details.poster_url().as_deref(),
            Some("https://image.tmdb.org/t/p/w200/fc.jpg")
        );
    }

    #[tokio::test]
    async fn unknown_movie_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "status_message": "The resource you requested could not be found."
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).movie("1").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
