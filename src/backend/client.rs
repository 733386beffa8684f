use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::error::BackendError;
use super::types::{
    ActionRequest, ActionResponse, ConnectRequest, ConnectResponse, ConnectionsResponse,
    MatchesResponse, RandomMovieResponse, ReconcileResponse,
};

const API_PREFIX: &str = "/api/movies";

/// Longest server message kept in an error, matching the server's own truncation.
const MAX_ERROR_MESSAGE: usize = 200;

/// HTTP client for the movie matching backend.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted, so the
/// same client can serve as candidate source, decision sink and pairing backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    session_cookie: Option<String>,
}

impl BackendClient {
    pub fn new(
        base_url: impl Into<String>,
        session_cookie: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_cookie,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}/{path}", self.base_url)
    }

    fn with_session(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.session_cookie {
            Some(cookie) => builder.header(reqwest::header::COOKIE, cookie),
            None => builder,
        }
    }

    /// `GET /random`. A 404 is the server's "nothing left to show" signal and is
    /// returned as a body with `success == false` rather than as an error.
    pub async fn random_movie(&self) -> Result<RandomMovieResponse, BackendError> {
        let response = self
            .with_session(self.client.get(self.url("random")))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            let text = response.text().await?;
            return Ok(serde_json::from_str(&text).unwrap_or_else(|_| RandomMovieResponse {
                error: Some(truncate(&text)),
                ..Default::default()
            }));
        }

        decode(response).await
    }

    /// `POST /action` with the movie id and wire verdict tag.
    pub async fn send_action(&self, req: &ActionRequest) -> Result<ActionResponse, BackendError> {
        let response = self
            .with_session(self.client.post(self.url("action")))
            .json(req)
            .send()
            .await?;
        decode(response).await
    }

    /// `GET /connections`. The server lists newest connections first.
    pub async fn connections(&self) -> Result<ConnectionsResponse, BackendError> {
        let response = self
            .with_session(self.client.get(self.url("connections")))
            .send()
            .await?;
        decode(response).await
    }

    /// `POST /connect`. Refusals (unknown user, already connected) come back as
    /// 4xx with `success == false` and a message, which is returned as a body.
    pub async fn connect(&self, req: &ConnectRequest) -> Result<ConnectResponse, BackendError> {
        let response = self
            .with_session(self.client.post(self.url("connect")))
            .json(req)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() && status != StatusCode::UNAUTHORIZED {
            let text = response.text().await?;
            return serde_json::from_str(&text).map_err(|_| BackendError::Status {
                status: status.as_u16(),
                message: truncate(&text),
            });
        }

        decode(response).await
    }

    /// `POST /check_and_create_matches`.
    pub async fn reconcile_matches(&self) -> Result<ReconcileResponse, BackendError> {
        let response = self
            .with_session(self.client.post(self.url("check_and_create_matches")))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        decode(response).await
    }

    /// `GET /matches`.
    pub async fn matches(&self) -> Result<MatchesResponse, BackendError> {
        let response = self
            .with_session(self.client.get(self.url("matches")))
            .send()
            .await?;
        decode(response).await
    }
}

pub(super) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(BackendError::Status {
            status: status.as_u16(),
            message: error_message(&text),
        });
    }

    serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Pulls `error` or `message` out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let field = parsed.as_ref().and_then(|v| {
        v.get("error")
            .or_else(|| v.get("message"))
            .and_then(|m| m.as_str())
    });
    match field {
        Some(msg) => truncate(msg),
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => truncate(body),
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_MESSAGE).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> BackendClient {
        BackendClient::new(
            server.uri(),
            Some("session=abc123".into()),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn random_movie_parses_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/movies/random"))
            .and(header("cookie", "session=abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "id": 603,
                "title": "Matrix",
                "poster_path": "https://image.tmdb.org/t/p/w500/m.jpg",
                "vote_average": 8.2,
                "release_year": "1999",
                "genres": ["Ação"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client_for(&server).random_movie().await.unwrap();
        assert_eq!(resp.id, Some(603));
        assert_eq!(resp.title.as_deref(), Some("Matrix"));
    }

    #[tokio::test]
    async fn random_movie_not_found_is_a_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/movies/random"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "success": false,
                "error": "Você já reagiu a todos os filmes disponíveis!"
            })))
            .mount(&server)
            .await;

        let resp = client_for(&server).random_movie().await.unwrap();
        assert!(!resp.success);
        assert!(resp.error.unwrap().contains("todos os filmes"));
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/movies/random"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "success": false,
                "error": "Erro interno do servidor"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).random_movie().await.unwrap_err();
        match err {
            BackendError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Erro interno do servidor");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_action_posts_wire_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/movies/action"))
            .and(body_json(serde_json::json!({"movie_id": 603, "action": "like"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "action": "like",
                "movie_id": 603,
                "message": "Ação like registrada com sucesso"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client_for(&server)
            .send_action(&ActionRequest {
                movie_id: 603,
                action: "like".into(),
            })
            .await
            .unwrap();
        assert!(resp.success);
    }

    #[tokio::test]
    async fn connect_refusal_is_returned_as_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/movies/connect"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "success": false,
                "message": "Usuário não encontrado"
            })))
            .mount(&server)
            .await;

        let resp = client_for(&server)
            .connect(&ConnectRequest {
                target_user_id: "99".into(),
            })
            .await
            .unwrap();
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("Usuário não encontrado"));
    }

    #[tokio::test]
    async fn unauthorized_connect_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/movies/connect"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "success": false,
                "message": "Usuário não logado"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .connect(&ConnectRequest {
                target_user_id: "5".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn invalid_json_maps_to_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/movies/matches"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).matches().await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client =
            BackendClient::new("http://localhost:5000/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("random"), "http://localhost:5000/api/movies/random");
    }

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"error":"boom"}"#), "boom");
        assert_eq!(error_message(r#"{"message":"nope"}"#), "nope");
        assert_eq!(error_message("plain text"), "plain text");
        assert_eq!(error_message("  "), "empty response body");
    }
}
