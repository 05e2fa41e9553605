//! Shared test helpers for agent tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use askpanda_clients::{ClientRouter, ConnectionParams, DocsClient, LogsClient, RouteEntry};
use askpanda_core::error::ProviderError;
use askpanda_core::message::ChatMessage;
use askpanda_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};

/// A provider that replays scripted replies and records every request.
///
/// Once the script runs out the last reply is repeated.
pub struct ScriptedProvider {
    replies: Vec<Result<String, ProviderError>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len().min(self.replies.len() - 1);
        requests.push(request.messages);
        let content = self.replies[index].clone()?;
        Ok(ProviderResponse {
            content,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: request.model,
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| vec![t.len() as f32; 3]).collect(),
            model: request.model,
            usage: None,
        })
    }
}

/// Router with only the docs and logs clients enabled.
pub fn docs_and_logs_router() -> Arc<ClientRouter> {
    let params = ConnectionParams::new("http://bigpanda.cern.ch", Duration::from_secs(5));
    Arc::new(ClientRouter::new([
        RouteEntry::new(Arc::new(DocsClient), params.clone()),
        RouteEntry::new(Arc::new(LogsClient), params),
    ]))
}
