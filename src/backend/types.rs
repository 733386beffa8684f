//! Tipos de dados das requisições e respostas da API de filmes (`/api/movies`).
//!
//! Todas as structs derivam `Serialize` e `Deserialize` para conversão JSON
//! conforme o formato devolvido pelo servidor. Campos opcionais usam
//! `#[serde(default)]` porque o servidor omite chaves em respostas de erro.

use serde::{Deserialize, Serialize};

/// Resposta do endpoint `GET /api/movies/random`.
///
/// Em caso de sucesso contém os dados do filme; quando o usuário já reagiu a
/// todos os filmes disponíveis, `success` é `false` e `error` traz a mensagem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RandomMovieResponse {
    #[serde(default)]
    pub success: bool,
    /// Mensagem de erro do servidor (ex.: fonte esgotada).
    #[serde(default)]
    pub error: Option<String>,
    /// Identificador TMDB do filme.
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    /// URL completa do pôster. String vazia quando o filme não tem pôster.
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    /// Nota média (0 quando desconhecida).
    #[serde(default)]
    pub vote_average: Option<f32>,
    /// Ano de lançamento como texto; pode vir vazio.
    #[serde(default)]
    pub release_year: Option<String>,
    /// Gêneros resolvidos. Ausente quando a busca de detalhes falhou no servidor.
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub trailer_url: Option<String>,
    /// Categoria TMDB sorteada pelo servidor (popular, top_rated, ...).
    #[serde(default)]
    pub category: Option<String>,
    /// Quantas tentativas o servidor precisou para encontrar um filme.
    #[serde(default)]
    pub attempts: Option<u32>,
    /// Quantos filmes o usuário já avaliou.
    #[serde(default)]
    pub total_seen: Option<u64>,
}

/// Corpo da requisição `POST /api/movies/action`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub movie_id: u64,
    /// Uma de `like`, `dislike` ou `indicate`.
    pub action: String,
}

/// Resposta do endpoint `POST /api/movies/action`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Uma conexão ativa entre o usuário e um parceiro.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    #[serde(default)]
    pub connection_id: Option<u64>,
    pub partner_id: u64,
    pub partner_username: String,
    #[serde(default)]
    pub connected_at: Option<String>,
    #[serde(default)]
    pub match_count: u32,
}

/// Resposta do endpoint `GET /api/movies/connections`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionsResponse {
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

/// Corpo da requisição `POST /api/movies/connect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub target_user_id: String,
}

/// Resposta do endpoint `POST /api/movies/connect`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub partner_id: Option<u64>,
    #[serde(default)]
    pub partner_username: Option<String>,
}

/// Resposta do endpoint `POST /api/movies/check_and_create_matches`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Um filme curtido pelos dois usuários de uma conexão.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub connection_id: Option<u64>,
    /// O servidor guarda os ids como JSON livre; aceitamos número ou texto.
    pub movie_id: serde_json::Value,
    #[serde(default)]
    pub partner_id: Option<u64>,
    pub partner_username: String,
    #[serde(default)]
    pub match_count: u32,
    #[serde(default)]
    pub last_match_at: Option<String>,
}

/// Resposta do endpoint `GET /api/movies/matches`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub matches: Vec<MatchRecord>,
    #[serde(default)]
    pub total_matches: u32,
    #[serde(default)]
    pub error: Option<String>,
}
