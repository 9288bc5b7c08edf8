pub mod client;
pub mod error;
pub mod stream;
pub mod types;

pub use client::OllamaClient;
pub use error::GenerationError;
pub use stream::Fragments;
pub use types::{ModelConfig, ModelInfo};

/// Anything that can turn a prompt into generated text.
///
/// Implemented by [`OllamaClient`] and by test doubles.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    async fn generate(
        &self,
        prompt: &str,
        config: &ModelConfig,
    ) -> Result<Fragments, GenerationError>;
}
