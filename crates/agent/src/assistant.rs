//! The Ask PanDA agent: routes a question to a domain client, then asks the
//! model to answer from the client's data.

use std::sync::Arc;

use askpanda_clients::{ClientRouter, RoutedResponse};
use askpanda_config::AppConfig;
use askpanda_core::client::{ClientKind, ClientQuery};
use askpanda_core::error::{Error, ProviderError};
use askpanda_core::message::ChatMessage;
use askpanda_core::provider::{EmbeddingRequest, Provider, ProviderRequest};
use askpanda_experiments::{Experiment, ExperimentError};
use askpanda_memory::vector_store::Metadata;
use askpanda_memory::{ContextStore, SearchHit, VectorStore};
use serde::Serialize;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::stream_event::AgentStreamEvent;

/// Model and memory settings shared by every experiment's agent.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Base prompt; the experiment's prompt is prepended to it.
    pub base_prompt: String,
    pub max_messages: usize,
    pub max_context_tokens: usize,
    pub embedding_model: String,
}

impl AgentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.model_name.clone(),
            temperature: config.model.temperature,
            max_tokens: Some(config.model.max_tokens),
            base_prompt: config.system_prompt.clone(),
            max_messages: config.memory.max_messages,
            max_context_tokens: config.memory.max_tokens,
            embedding_model: askpanda_providers::embedding_model(&config.model),
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Result of [`Agent::query`].
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub query: String,
    pub response: String,
    pub client: ClientKind,
    pub client_data: RoutedResponse,
    pub experiment: String,
}

/// One experiment's assistant.
///
/// Conversations are owned by the caller as [`ContextStore`]s; the agent
/// itself holds no per-conversation state. The provider, router and
/// knowledge base are shared between agents made with [`Agent::for_experiment`].
pub struct Agent {
    provider: Arc<dyn Provider>,
    router: Arc<ClientRouter>,
    experiment: Experiment,
    settings: AgentSettings,
    system_prompt: String,
    knowledge: Arc<RwLock<VectorStore>>,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn Provider>,
        router: Arc<ClientRouter>,
        experiment: Experiment,
        settings: AgentSettings,
    ) -> Self {
        let system_prompt = experiment.customize_prompt(&settings.base_prompt);
        Self {
            provider,
            router,
            experiment,
            settings,
            system_prompt,
            knowledge: Arc::new(RwLock::new(VectorStore::default())),
        }
    }

    /// Build the provider, router and experiment named in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let provider = askpanda_providers::build_from_config(&config.model)?;
        let router = Arc::new(ClientRouter::from_config(&config.clients));
        let experiment = askpanda_experiments::lookup(&config.experiment.name).map_err(config_error)?;

        info!(
            experiment = experiment.name,
            provider = provider.name(),
            model = %config.model.model_name,
            "Agent initialized"
        );
        Ok(Self::new(provider, router, experiment, AgentSettings::from_config(config)))
    }

    /// The same agent for another experiment, sharing provider, router and
    /// knowledge base.
    pub fn for_experiment(&self, name: &str) -> Result<Self, ExperimentError> {
        let experiment = askpanda_experiments::lookup(name)?;
        let mut agent = Self::new(
            self.provider.clone(),
            self.router.clone(),
            experiment,
            self.settings.clone(),
        );
        agent.knowledge = self.knowledge.clone();
        Ok(agent)
    }

    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn router(&self) -> &Arc<ClientRouter> {
        &self.router
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// A fresh conversation seeded with the system prompt.
    pub fn new_conversation(&self) -> ContextStore {
        let mut store = ContextStore::new(self.settings.max_messages, self.settings.max_context_tokens);
        store.add_system(self.system_prompt.clone());
        store
    }

    /// Answer a question from domain-client data.
    ///
    /// The question is recorded, routed (to `client_hint` if given), and the
    /// model is asked to answer from the client's result. The data-bearing
    /// prompt is sent to the model but not recorded; the reply is.
    pub async fn query(
        &self,
        store: &mut ContextStore,
        text: &str,
        client_hint: Option<&str>,
        params: serde_json::Map<String, serde_json::Value>,
    ) -> Result<QueryOutcome, Error> {
        store.add_user(text);

        let client_query = ClientQuery::new(text)
            .with_experiment(self.experiment.name)
            .with_params(params);
        let routed = self.router.route(&client_query, client_hint).await?;

        let client_result = serde_json::to_string(&routed)?;
        let mut messages = store.chat_projection();
        messages.push(ChatMessage::user(format!(
            "Based on this data: {client_result}\n\nAnswer: {text}"
        )));

        let response = self.complete(messages).await?;
        store.add_assistant(response.clone());

        Ok(QueryOutcome {
            query: text.to_string(),
            response,
            client: routed.client,
            client_data: routed,
            experiment: self.experiment.name.to_string(),
        })
    }

    /// Plain conversational turn with no client lookup.
    pub async fn chat(&self, store: &mut ContextStore, message: &str) -> Result<String, Error> {
        store.add_user(message);
        let response = self.complete(store.chat_projection()).await?;
        store.add_assistant(response.clone());
        Ok(response)
    }

    /// Streaming conversational turn.
    ///
    /// The user message is recorded immediately. The reply is not: the
    /// caller records `response` from the final [`AgentStreamEvent::Done`].
    pub async fn chat_stream(
        &self,
        store: &mut ContextStore,
        message: &str,
    ) -> Result<mpsc::Receiver<AgentStreamEvent>, Error> {
        store.add_user(message);
        let mut request = self.request(store.chat_projection());
        request.stream = true;
        let mut chunks = self.provider.stream(request).await?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let mut full = String::new();
            let mut usage = None;
            while let Some(chunk) = chunks.recv().await {
                match chunk {
                    Ok(chunk) => {
                        if let Some(content) = chunk.content.filter(|c| !c.is_empty()) {
                            full.push_str(&content);
                            if tx.send(AgentStreamEvent::Chunk { content }).await.is_err() {
                                debug!("Stream receiver dropped");
                                return;
                            }
                        }
                        if chunk.usage.is_some() {
                            usage = chunk.usage;
                        }
                        if chunk.done {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Model stream failed");
                        let _ = tx.send(AgentStreamEvent::Error { message: e.to_string() }).await;
                        return;
                    }
                }
            }
            let _ = tx.send(AgentStreamEvent::Done { response: full, usage }).await;
        });

        Ok(rx)
    }

    /// Embed texts with the configured embedding model.
    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, Error> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.settings.embedding_model.clone(),
                inputs: texts,
            })
            .await?;
        Ok(response.embeddings)
    }

    /// Add documents to the shared knowledge base.
    pub async fn add_documents(
        &self,
        documents: Vec<String>,
        metadata: Option<Vec<Metadata>>,
    ) -> Result<Vec<usize>, Error> {
        let ids = self.knowledge.write().await.add_documents(documents, metadata)?;
        debug!(added = ids.len(), "Documents added to knowledge base");
        Ok(ids)
    }

    pub async fn search_documents(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        self.knowledge.read().await.search(query, top_k)
    }

    pub async fn document_count(&self) -> usize {
        self.knowledge.read().await.count()
    }

    fn request(&self, messages: Vec<ChatMessage>) -> ProviderRequest {
        let mut request = ProviderRequest::new(self.settings.model.clone(), messages);
        request.temperature = self.settings.temperature;
        request.max_tokens = self.settings.max_tokens;
        request
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ProviderError> {
        let response = self.provider.complete(self.request(messages)).await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt = usage.prompt_tokens,
                completion = usage.completion_tokens,
                "Model call completed"
            );
        }
        Ok(response.content)
    }
}

fn config_error(e: ExperimentError) -> Error {
    Error::Config { message: e.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, docs_and_logs_router};
    use askpanda_core::error::RoutingError;
    use askpanda_core::message::Role;
    use askpanda_core::provider::{ProviderResponse, StreamChunk};

    fn agent(provider: Arc<ScriptedProvider>) -> Agent {
        Agent::new(
            provider,
            docs_and_logs_router(),
            askpanda_experiments::lookup("atlas").unwrap(),
            AgentSettings::default(),
        )
    }

    #[test]
    fn new_conversation_is_seeded_with_prompt() {
        let agent = agent(Arc::new(ScriptedProvider::text("ok")));
        let store = agent.new_conversation();
        let messages = store.messages(None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("ATLAS"));
        assert!(messages[0].content.ends_with("You are a helpful assistant for PanDA workflows."));
    }

    #[tokio::test]
    async fn query_routes_and_answers_from_client_data() {
        let provider = Arc::new(ScriptedProvider::text("Check the pilot log."));
        let agent = agent(provider.clone());
        let mut store = agent.new_conversation();

        let outcome = agent
            .query(&mut store, "show me the error log", None, Default::default())
            .await
            .unwrap();

        assert_eq!(outcome.client, ClientKind::Logs);
        assert_eq!(outcome.response, "Check the pilot log.");
        assert_eq!(outcome.experiment, "atlas");

        let sent = &provider.requests()[0];
        let last = sent.last().unwrap();
        assert!(last.content.starts_with("Based on this data: "));
        assert!(last.content.ends_with("\n\nAnswer: show me the error log"));
        assert!(last.content.contains(r#""client":"logs""#));

        // system, user, assistant; the data prompt is not recorded
        let recorded = store.messages(None);
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[1].content, "show me the error log");
        assert_eq!(recorded[2].content, "Check the pilot log.");
    }

    #[tokio::test]
    async fn query_with_disabled_target_records_only_question() {
        let agent = agent(Arc::new(ScriptedProvider::text("unused")));
        let mut store = agent.new_conversation();

        let err = agent
            .query(&mut store, "dataset size", Some("data"), Default::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Routing(RoutingError::TargetUnavailable(ref name)) if name == "data"
        ));
        assert_eq!(store.message_count(), 2);
    }

    #[tokio::test]
    async fn query_classified_to_disabled_client_has_no_handler() {
        let agent = agent(Arc::new(ScriptedProvider::text("unused")));
        let mut store = agent.new_conversation();
        let err = agent
            .query(&mut store, "pilot status at CERN", None, Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Routing(RoutingError::NoHandlerAvailable)));
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let agent = agent(Arc::new(ScriptedProvider::failing(ProviderError::RateLimited {
            retry_after_secs: 30,
        })));
        let mut store = agent.new_conversation();
        let err = agent.chat(&mut store, "hello").await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::RateLimited { .. })));
        // no assistant reply recorded
        assert_eq!(store.message_count(), 2);
    }

    #[tokio::test]
    async fn chat_sends_full_history() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok("first".into()), Ok("second".into())]));
        let agent = agent(provider.clone());
        let mut store = agent.new_conversation();

        assert_eq!(agent.chat(&mut store, "one").await.unwrap(), "first");
        assert_eq!(agent.chat(&mut store, "two").await.unwrap(), "second");

        let second = &provider.requests()[1];
        let roles: Vec<Role> = second.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
    }

    #[tokio::test]
    async fn chat_stream_ends_with_full_reply() {
        let agent = agent(Arc::new(ScriptedProvider::text("streamed reply")));
        let mut store = agent.new_conversation();

        let mut rx = agent.chat_stream(&mut store, "hi").await.unwrap();
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert!(matches!(&events[0], AgentStreamEvent::Chunk { content } if content == "streamed reply"));
        assert!(matches!(
            events.last().unwrap(),
            AgentStreamEvent::Done { response, .. } if response == "streamed reply"
        ));
        // reply is recorded by the caller
        assert_eq!(store.message_count(), 2);
    }

    struct BrokenStream;

    #[async_trait::async_trait]
    impl Provider for BrokenStream {
        fn name(&self) -> &str {
            "broken"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::StreamInterrupted("n/a".into()))
        }

        async fn stream(
            &self,
            _request: ProviderRequest,
        ) -> Result<mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError> {
            let (tx, rx) = mpsc::channel(4);
            tx.send(Ok(StreamChunk { content: Some("par".into()), done: false, usage: None }))
                .await
                .unwrap();
            tx.send(Err(ProviderError::StreamInterrupted("connection reset".into())))
                .await
                .unwrap();
            Ok(rx)
        }
    }

    #[tokio::test]
    async fn chat_stream_reports_mid_stream_failure() {
        let agent = Agent::new(
            Arc::new(BrokenStream),
            docs_and_logs_router(),
            askpanda_experiments::lookup("epic").unwrap(),
            AgentSettings::default(),
        );
        let mut store = agent.new_conversation();
        let mut rx = agent.chat_stream(&mut store, "hi").await.unwrap();

        assert!(matches!(rx.recv().await, Some(AgentStreamEvent::Chunk { .. })));
        assert!(matches!(rx.recv().await, Some(AgentStreamEvent::Error { .. })));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn knowledge_base_is_shared_across_experiments() {
        let atlas = agent(Arc::new(ScriptedProvider::text("ok")));
        let epic = atlas.for_experiment("EPIC").unwrap();
        assert_eq!(epic.experiment().name, "epic");
        assert!(epic.system_prompt().contains("ePIC"));

        atlas
            .add_documents(vec!["PanDA brokerage".into(), "Rucio rules".into()], None)
            .await
            .unwrap();
        assert_eq!(epic.document_count().await, 2);

        let hits = epic.search_documents("anything", 1).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "PanDA brokerage");
    }

    #[tokio::test]
    async fn mismatched_metadata_is_a_memory_error() {
        let agent = agent(Arc::new(ScriptedProvider::text("ok")));
        let err = agent
            .add_documents(vec!["a".into(), "b".into()], Some(vec![Metadata::new()]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Memory(_)));
        assert_eq!(agent.document_count().await, 0);
    }

    #[tokio::test]
    async fn embed_uses_provider() {
        let agent = agent(Arc::new(ScriptedProvider::text("ok")));
        let vectors = agent.embed(vec!["abcd".into()]).await.unwrap();
        assert_eq!(vectors, vec![vec![4.0, 4.0, 4.0]]);
    }

    #[test]
    fn unknown_experiment_is_rejected() {
        let agent = agent(Arc::new(ScriptedProvider::text("ok")));
        assert!(agent.for_experiment("cms").is_err());
    }
}
