//! Provider factory: builds the configured model backend.

use std::sync::Arc;
use askpanda_config::{ModelBackend, ModelConfig};
use askpanda_core::error::ProviderError;
use askpanda_core::provider::Provider;
use crate::openai_compat::{OLLAMA_BASE_URL, OPENAI_BASE_URL, OpenAiCompatProvider};

/// Embedding model used against the OpenAI API.
pub const OPENAI_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Build the backend named by `config.provider`.
///
/// OpenAI without an API key is rejected up front; Ollama needs none.
pub fn build_from_config(config: &ModelConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| default_base_url(config.provider).to_string());

    let provider = match config.provider {
        ModelBackend::OpenAi => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                ProviderError::NotConfigured(
                    "OpenAI API key is required (set OPENAI_API_KEY or model.api_key)".into(),
                )
            })?;
            OpenAiCompatProvider::new("openai", &base_url, api_key)?
        }
        ModelBackend::Ollama => {
            let api_key = config.api_key.clone().unwrap_or_else(|| "ollama".into());
            OpenAiCompatProvider::new("ollama", &base_url, api_key)?
        }
    };

    tracing::info!(
        provider = config.provider.as_str(),
        model = %config.model_name,
        base_url = %base_url,
        "Model backend configured"
    );
    Ok(Arc::new(provider))
}

/// The default endpoint for each backend.
pub fn default_base_url(backend: ModelBackend) -> &'static str {
    match backend {
        ModelBackend::OpenAi => OPENAI_BASE_URL,
        ModelBackend::Ollama => OLLAMA_BASE_URL,
    }
}

/// The model used for embeddings: a dedicated one on OpenAI, the chat model on Ollama.
pub fn embedding_model(config: &ModelConfig) -> String {
    match config.provider {
        ModelBackend::OpenAi => OPENAI_EMBEDDING_MODEL.to_string(),
        ModelBackend::Ollama => config.model_name.clone(),
    }
}
