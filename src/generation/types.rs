//! Tipos de dados para as requisições e respostas da API do Ollama.
//!
//! Cobre `POST /api/generate` (resposta única ou stream NDJSON) e
//! `GET /api/tags` (listagem de modelos instalados).

use serde::{Deserialize, Serialize};

/// Configuração do modelo usada em cada chamada de geração.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Nome do modelo no Ollama (ex.: "llama3.3", "gemma3:27b").
    pub model: String,
    /// Temperatura de amostragem, em [0, 1].
    pub temperature: f64,
    /// Nucleus sampling, em [0, 1].
    pub top_p: f64,
    /// Quando verdadeiro, a resposta chega como uma sequência de fragmentos.
    pub stream: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "llama3.3".to_string(),
            temperature: 0.7,
            top_p: 0.9,
            stream: true,
        }
    }
}

/// Corpo da requisição para `/api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: SamplingOptions,
}

impl GenerateRequest {
    pub fn new(prompt: &str, config: &ModelConfig) -> Self {
        Self {
            model: config.model.clone(),
            prompt: prompt.to_string(),
            stream: config.stream,
            options: SamplingOptions {
                temperature: config.temperature,
                top_p: config.top_p,
            },
        }
    }
}

/// Parâmetros de amostragem enviados no campo `options`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub temperature: f64,
    pub top_p: f64,
}

/// Um objeto de resposta do Ollama.
///
/// Sem streaming vem um único objeto com `done = true`; com streaming vem
/// uma linha NDJSON por fragmento. Um campo `error` indica falha do modelo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Corpo de erro retornado junto com status não-2xx.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Resposta de `/api/tags`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// Um modelo instalado localmente.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: Option<String>,
}
