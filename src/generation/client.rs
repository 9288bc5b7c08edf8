use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::TextGenerator;
use super::error::GenerationError;
use super::stream::Fragments;
use super::types::{ErrorBody, GenerateChunk, GenerateRequest, ModelConfig, ModelInfo, TagsResponse};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Client for a local Ollama server, with the given whole-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Models installed on the server (`GET /api/tags`).
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, GenerationError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status.as_u16(), response).await);
        }

        let tags = response
            .json::<TagsResponse>()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        Ok(tags.models)
    }
}

impl TextGenerator for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        config: &ModelConfig,
    ) -> Result<Fragments, GenerationError> {
        let req = GenerateRequest::new(prompt, config);
        debug!(
            model = %config.model,
            stream = config.stream,
            prompt_chars = prompt.len(),
            "sending generate request"
        );

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status.as_u16(), response).await);
        }

        if config.stream {
            return Ok(Fragments::ndjson(response));
        }

        let body = response
            .json::<GenerateChunk>()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        if let Some(message) = body.error {
            return Err(GenerationError::Model(message));
        }
        Ok(Fragments::from_text(body.response))
    }
}

async fn api_error(status: u16, response: reqwest::Response) -> GenerationError {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    // Ollama wraps messages as {"error": "..."}.
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    GenerationError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OllamaClient {
        OllamaClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn config(stream: bool) -> ModelConfig {
        ModelConfig {
            stream,
            ..ModelConfig::default()
        }
    }

    #[tokio::test]
    async fn generate_without_streaming() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3.3",
                "stream": false,
                "options": {"temperature": 0.7, "top_p": 0.9}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.3",
                "response": "A thesis on grace.",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate("Plan it", &config(false))
            .await
            .unwrap()
            .collect_text(|_| {})
            .await
            .unwrap();
        assert_eq!(text, "A thesis on grace.");
    }

    #[tokio::test]
    async fn generate_streams_ndjson_fragments() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"response\":\"Grace \",\"done\":false}\n",
            "{\"response\":\"abounds\",\"done\":false}\n",
            "{\"response\":\"\",\"done\":true}\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let mut seen = Vec::new();
        let text = client_for(&server)
            .generate("Draft it", &config(true))
            .await
            .unwrap()
            .collect_text(|f| seen.push(f.to_string()))
            .await
            .unwrap();
        assert_eq!(text, "Grace abounds");
        assert_eq!(seen, vec!["Grace ", "abounds"]);
    }

    #[tokio::test]
    async fn final_line_may_carry_text() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"response\":\"Sola \",\"done\":false}\n",
            "{\"response\":\"fide\",\"done\":true}",
        );
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let text = client_for(&server)
            .generate("Draft it", &config(true))
            .await
            .unwrap()
            .collect_text(|_| {})
            .await
            .unwrap();
        assert_eq!(text, "Sola fide");
    }

    #[tokio::test]
    async fn stream_error_line_is_surfaced() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"response\":\"Grace \",\"done\":false}\n",
            "{\"error\":\"model runner crashed\"}\n",
        );
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate("Draft it", &config(true))
            .await
            .unwrap()
            .collect_text(|_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Model(m) if m == "model runner crashed"));
    }

    #[tokio::test]
    async fn stream_without_done_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("{\"response\":\"cut\",\"done\":false}\n"),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate("Draft it", &config(true))
            .await
            .unwrap()
            .collect_text(|_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[tokio::test]
    async fn api_error_unwraps_ollama_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "model 'qwq' not found"})),
            )
            .mount(&server)
            .await;

        let result = client_for(&server).generate("x", &config(false)).await;
        match result {
            Err(GenerationError::Api { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "model 'qwq' not found");
            }
            Err(other) => panic!("expected Api error, got {other:?}"),
            Ok(_) => panic!("expected Api error"),
        }
    }

    #[tokio::test]
    async fn list_models_reads_tags() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [{"name": "llama3.3:latest", "size": 1}, {"name": "qwq:latest"}]
            })))
            .mount(&server)
            .await;

        let models = client_for(&server).list_models().await.unwrap();
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["llama3.3:latest", "qwq:latest"]);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let client = OllamaClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = client.generate("x", &config(false)).await;
        assert!(matches!(
            result,
            Err(GenerationError::Network(_) | GenerationError::Timeout)
        ));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }
}
