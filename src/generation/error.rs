//! Tipos de erro para o cliente de geração de texto (Ollama).
//!
//! Define [`GenerationError`] com variantes para erros HTTP, erros reportados
//! pelo modelo no meio do stream, timeouts e respostas malformadas.

use thiserror::Error;

/// Erros que podem ocorrer ao pedir texto ao modelo.
///
/// - [`Api`](GenerationError::Api): o servidor respondeu com status não-2xx
/// - [`Model`](GenerationError::Model): o servidor enviou uma linha `{"error": ...}`
/// - [`Timeout`](GenerationError::Timeout): a requisição excedeu o tempo limite
/// - [`Network`](GenerationError::Network): falha na camada de rede
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Erro HTTP retornado pela API (ex.: 404 modelo inexistente, 500 erro interno).
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Erro reportado pelo próprio modelo no corpo da resposta.
    #[error("model reported an error: {0}")]
    Model(String),

    #[error("request timed out")]
    Timeout,

    /// Falha de rede subjacente (DNS, conexão recusada, corpo truncado).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// O corpo não pôde ser interpretado ou o stream terminou sem `done`.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// O modelo respondeu apenas com espaços em branco.
    #[error("model returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Network(err)
        }
    }
}
