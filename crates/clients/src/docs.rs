//! Documentation client.

use async_trait::async_trait;
use askpanda_core::client::{ClientKind, ClientQuery, ClientResponse};
use askpanda_core::error::ClientError;
use serde_json::{Value, json};

use crate::{ClientSession, DomainClient, executed};

#[derive(Debug, Clone, Copy, Default)]
pub struct DocsClient;

impl DocsClient {
    /// Fetch the documentation page for a topic.
    pub async fn get_docs(&self, _session: &ClientSession, topic: &str) -> Result<Value, ClientError> {
        Ok(json!({
            "topic": topic,
            "content": format!("Documentation for {topic}"),
            "source": ClientKind::Docs.source(),
        }))
    }
}

#[async_trait]
impl DomainClient for DocsClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Docs
    }

    async fn query(&self, session: &ClientSession, query: &ClientQuery) -> Result<ClientResponse, ClientError> {
        tracing::debug!(base_url = session.base_url(), "Searching documentation");
        Ok(executed(ClientKind::Docs, "Documentation", query))
    }
}
