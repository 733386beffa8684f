//! Tipos de erro para o cliente HTTP da API de filmes.
//!
//! Define [`BackendError`] com variantes para falhas de rede, respostas HTTP
//! de erro e corpos que não puderam ser decodificados. Usa `thiserror` para
//! derivar `Display` e `Error` a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao conversar com o servidor.
///
/// - [`Network`](BackendError::Network) — falha na camada de transporte
/// - [`Status`](BackendError::Status) — o servidor respondeu com 4xx/5xx
/// - [`Decode`](BackendError::Decode) — o corpo não é o JSON esperado
#[derive(Debug, Error)]
pub enum BackendError {
    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Resposta HTTP fora da faixa 2xx, com a mensagem extraída do corpo.
    #[error("server returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// O corpo da resposta não pôde ser interpretado.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Código HTTP associado ao erro, quando houver.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            BackendError::Network(err) => err.status().map(|s| s.as_u16()),
            BackendError::Decode(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        let err = BackendError::Status {
            status: 401,
            message: "Usuário não logado".into(),
        };
        assert_eq!(err.to_string(), "server returned status 401: Usuário não logado");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn decode_has_no_status() {
        let err = BackendError::Decode("expected value at line 1".into());
        assert_eq!(err.status(), None);
        assert!(err.to_string().starts_with("failed to decode response"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BackendError>();
    }
}
