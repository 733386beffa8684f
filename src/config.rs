//! Configuração do moviematch carregada a partir de `moviematch.toml`.
//!
//! A struct [`MatchConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! As variáveis de ambiente `MOVIEMATCH_BASE_URL`, `MOVIEMATCH_SESSION` e
//! `MOVIEMATCH_TMDB_KEY` têm precedência sobre o arquivo.

use anyhow::{Result, bail};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::backend::tmdb::DEFAULT_TMDB_URL;
use crate::engine::{Backoff, EngineSettings, RetryConfig};

/// Nome do arquivo procurado no diretório atual quando `--config` não é informado.
pub const DEFAULT_CONFIG_FILE: &str = "moviematch.toml";

/// Limite superior de tentativas de busca; acima disso a espera vira travamento.
const MAX_FETCH_ATTEMPTS: u32 = 10;

/// Configuração de nível superior carregada de `moviematch.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    /// Endereço do servidor (sem o prefixo `/api/movies`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Cookie de sessão repassado ao servidor, ex.: `session=...`.
    #[serde(default)]
    pub session_cookie: Option<String>,

    /// Quantidade de filmes pré-carregados abaixo da qual a reposição começa.
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: usize,

    /// Tentativas de busca de um filme antes de mostrar erro.
    #[serde(default = "default_fetch_max_attempts")]
    pub fetch_max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub fetch_base_delay_ms: u64,

    /// Tentativas de envio de uma decisão antes de desistir dela.
    #[serde(default = "default_submit_max_attempts")]
    pub submit_max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub submit_base_delay_ms: u64,

    /// Estratégia de espera entre tentativas: `fixed`, `linear` ou `exponential`.
    #[serde(default)]
    pub backoff: Backoff,

    /// Timeout de cada requisição HTTP, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Chave da API do TMDB, usada para mostrar títulos na lista de matches.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    #[serde(default = "default_tmdb_url")]
    pub tmdb_url: String,

    /// Idioma dos títulos buscados no TMDB.
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,
}

// Servidor local de desenvolvimento.
fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_low_water_mark() -> usize {
    2
}

fn default_fetch_max_attempts() -> u32 {
    10
}

fn default_submit_max_attempts() -> u32 {
    3
}

// Valor padrão para o atraso base: 1000ms.
fn default_base_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_tmdb_url() -> String {
    DEFAULT_TMDB_URL.to_string()
}

fn default_tmdb_language() -> String {
    "pt-BR".to_string()
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_cookie: None,
            low_water_mark: default_low_water_mark(),
            fetch_max_attempts: default_fetch_max_attempts(),
            fetch_base_delay_ms: default_base_delay_ms(),
            submit_max_attempts: default_submit_max_attempts(),
            submit_base_delay_ms: default_base_delay_ms(),
            backoff: Backoff::default(),
            request_timeout_secs: default_request_timeout_secs(),
            tmdb_api_key: None,
            tmdb_url: default_tmdb_url(),
            tmdb_language: default_tmdb_language(),
        }
    }
}

impl MatchConfig {
    /// Carrega a configuração de `path`, ou de `moviematch.toml` no diretório atual.
    /// Usa valores padrão se o arquivo padrão não existir; um caminho explícito
    /// inexistente é erro. Não valida: chame [`validate`](Self::validate) depois
    /// de aplicar as flags da CLI.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from(path)?
                } else {
                    Self::default()
                }
            }
        };

        // Variáveis de ambiente têm precedência sobre o arquivo.
        config.apply_env(
            std::env::var("MOVIEMATCH_BASE_URL").ok(),
            std::env::var("MOVIEMATCH_SESSION").ok(),
        );
        if let Some(key) = std::env::var("MOVIEMATCH_TMDB_KEY")
            .ok()
            .filter(|key| !key.is_empty())
        {
            config.tmdb_api_key = Some(key);
        }
        Ok(config)
    }

    /// Lê e interpreta um arquivo TOML, sem aplicar o ambiente.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str::<MatchConfig>(&contents)?)
    }

    fn apply_env(&mut self, base_url: Option<String>, session: Option<String>) {
        if let Some(url) = base_url.filter(|url| !url.is_empty()) {
            self.base_url = url;
        }
        if let Some(cookie) = session.filter(|cookie| !cookie.is_empty()) {
            self.session_cookie = Some(cookie);
        }
    }

    /// Aplica as flags globais da CLI, que têm precedência sobre arquivo e ambiente.
    pub fn apply_cli(
        &mut self,
        base_url: Option<String>,
        low_water_mark: Option<usize>,
        max_retries: Option<u32>,
    ) {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(mark) = low_water_mark {
            self.low_water_mark = mark;
        }
        if let Some(retries) = max_retries {
            self.fetch_max_attempts = retries;
        }
    }

    /// Rejeita combinações que deixariam a sessão sem filmes ou travada.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url não pode ser vazio");
        }
        if self.low_water_mark == 0 {
            bail!("low_water_mark deve ser pelo menos 1");
        }
        if self.fetch_max_attempts == 0 || self.submit_max_attempts == 0 {
            bail!("o número de tentativas deve ser pelo menos 1");
        }
        if self.fetch_max_attempts > MAX_FETCH_ATTEMPTS {
            bail!(
                "fetch_max_attempts = {} excede o máximo de {MAX_FETCH_ATTEMPTS}",
                self.fetch_max_attempts
            );
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn fetch_retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.fetch_max_attempts,
            base_delay_ms: self.fetch_base_delay_ms,
            backoff: self.backoff,
        }
    }

    pub fn submit_retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.submit_max_attempts,
            base_delay_ms: self.submit_base_delay_ms,
            backoff: self.backoff,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            low_water_mark: self.low_water_mark,
            fetch_retry: self.fetch_retry(),
            submit_retry: self.submit_retry(),
        }
    }
}
