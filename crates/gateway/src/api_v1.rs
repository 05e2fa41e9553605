//! HTTP API v1, mounted under `/api/v1`.
//!
//! Endpoints:
//!
//! - `GET    /health`                   Liveness probe
//! - `POST   /query`                    Route a question to a client and answer it
//! - `POST   /chat`                     Conversational turn
//! - `POST   /chat/stream`              Conversational turn as an SSE stream
//! - `GET    /experiments`              List experiments
//! - `GET    /experiments/{name}`       Experiment details
//! - `GET    /clients`                  Domain clients and their state
//! - `GET    /clients/{client}/{op}`    Client-specific lookup (`?arg=`)
//! - `GET    /conversations/{id}`       Conversation history (`?limit=`)
//! - `DELETE /conversations/{id}`       Forget a conversation
//! - `POST   /documents`                Add documents to the knowledge base
//! - `GET    /documents/search`         Search the knowledge base
//! - `GET    /tools`                    List PanDA and documentation tools
//! - `POST   /tools/{name}`             Call a tool
//! - `GET    /status`                   Runtime status

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    response::sse::{Event as SseEvent, Sse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use askpanda_agent::{Agent, AgentStreamEvent};
use askpanda_config::AppConfig;
use askpanda_core::client::ClientKind;
use askpanda_clients::ClientOperation;
use askpanda_core::error::{ClientError, Error, RoutingError, ToolError};
use askpanda_core::message::{ConversationId, MessageRecord};
use askpanda_core::provider::ToolDefinition;
use askpanda_core::tool::{ToolCall, ToolRegistry};
use askpanda_memory::vector_store::Metadata;
use askpanda_memory::{ContextStore, SearchHit};
use askpanda_tools::ToolServer;

// ── State ─────────────────────────────────────────────────────────────────

/// Maximum number of in-memory conversations before oldest are evicted.
const MAX_CONVERSATIONS: usize = 1_000;
/// Default number of knowledge-base hits returned by a search.
const DEFAULT_TOP_K: usize = 5;

/// A conversation held by the gateway.
#[derive(Clone)]
pub struct Conversation {
    pub store: ContextStore,
    pub experiment: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Bumped on every write; a turn only stores its result if this is
    /// unchanged since it checked the conversation out.
    pub generation: u64,
}

/// A conversation taken out of the map for one turn.
struct Checkout {
    agent: Agent,
    store: ContextStore,
    /// `None` when the conversation did not exist yet.
    generation: Option<u64>,
}

/// Shared state for the v1 API.
pub struct ApiState {
    /// Agent for the configured default experiment.
    pub agent: Agent,
    pub config: AppConfig,
    pub conversations: RwLock<HashMap<String, Conversation>>,
    pub panda_tools: ToolRegistry,
    pub docs_tools: ToolRegistry,
    pub start_time: chrono::DateTime<chrono::Utc>,
    next_generation: AtomicU64,
}

impl ApiState {
    pub fn new(agent: Agent, config: AppConfig) -> Self {
        let panda_tools = askpanda_tools::panda_registry(agent.experiment().name);
        Self {
            agent,
            config,
            conversations: RwLock::new(HashMap::new()),
            panda_tools,
            docs_tools: askpanda_tools::docs_registry(),
            start_time: chrono::Utc::now(),
            next_generation: AtomicU64::new(1),
        }
    }

    /// The agent for `experiment`, or the default one.
    fn agent_for(&self, experiment: Option<&str>) -> Result<Agent, ApiError> {
        let name = experiment.unwrap_or(self.agent.experiment().name);
        self.agent
            .for_experiment(name)
            .map_err(|_| experiment_not_found(name))
    }

    /// Take a copy of conversation `id`, or start one.
    ///
    /// An existing conversation keeps the experiment it was started with;
    /// naming a different one is a conflict. The lock is released before
    /// returning so the model call runs unlocked.
    async fn checkout(&self, id: &str, requested: Option<&str>) -> Result<Checkout, ApiError> {
        let existing = self
            .conversations
            .read()
            .await
            .get(id)
            .map(|c| (c.store.clone(), c.experiment.clone(), c.generation));

        let Some((store, experiment, generation)) = existing else {
            let agent = self.agent_for(requested)?;
            let store = agent.new_conversation();
            return Ok(Checkout {
                agent,
                store,
                generation: None,
            });
        };

        if let Some(requested) = requested {
            let wanted = askpanda_experiments::lookup(requested).map_err(|_| experiment_not_found(requested))?;
            if wanted.name != experiment {
                return Err(api_error(
                    StatusCode::CONFLICT,
                    format!("Conversation '{id}' belongs to experiment '{experiment}', not '{}'", wanted.name),
                ));
            }
        }

        Ok(Checkout {
            agent: self.agent_for(Some(&experiment))?,
            store,
            generation: Some(generation),
        })
    }

    /// Store a conversation, evicting the oldest at capacity.
    ///
    /// Returns `false` without storing anything when the conversation was
    /// deleted or written by another turn since `seen` was checked out.
    async fn checkin(&self, id: String, store: ContextStore, experiment: &str, seen: Option<u64>) -> bool {
        let mut conversations = self.conversations.write().await;

        let current = conversations.get(&id).map(|c| c.generation);
        if current != seen {
            warn!(conversation = %id, "Conversation changed during the turn, dropping this turn");
            return false;
        }

        if current.is_none() && conversations.len() >= MAX_CONVERSATIONS {
            if let Some(oldest_key) = conversations
                .iter()
                .min_by_key(|(_, c)| c.created_at)
                .map(|(k, _)| k.clone())
            {
                conversations.remove(&oldest_key);
            }
        }

        let created_at = conversations
            .get(&id)
            .map(|c| c.created_at)
            .unwrap_or_else(chrono::Utc::now);
        conversations.insert(
            id,
            Conversation {
                store,
                experiment: experiment.to_string(),
                created_at,
                generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
            },
        );
        true
    }

    fn registry(&self, server: ToolServer) -> &ToolRegistry {
        match server {
            ToolServer::Panda => &self.panda_tools,
            ToolServer::Docs => &self.docs_tools,
        }
    }
}

pub type SharedApiState = Arc<ApiState>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/api/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/query", post(query_handler))
        .route("/chat", post(chat_handler))
        .route("/chat/stream", post(chat_stream_handler))
        .route("/experiments", get(list_experiments_handler))
        .route("/experiments/{name}", get(get_experiment_handler))
        .route("/clients", get(list_clients_handler))
        .route("/clients/{client}/{operation}", get(client_operation_handler))
        .route(
            "/conversations/{id}",
            get(get_conversation_handler).delete(delete_conversation_handler),
        )
        .route("/documents", post(add_documents_handler))
        .route("/documents/search", get(search_documents_handler))
        .route("/tools", get(list_tools_handler))
        .route("/tools/{name}", post(call_tool_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    experiment: Option<String>,
    /// Explicit client to route to; omit for keyword routing.
    #[serde(default)]
    client_type: Option<String>,
    /// Persist the exchange in this conversation.
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    params: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub response: String,
    pub experiment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    experiment: Option<String>,
    /// Existing conversation ID (omit to create new).
    #[serde(default)]
    conversation_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub conversation_id: String,
    pub experiment: String,
}

#[derive(Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub name: String,
    pub description: String,
}

#[derive(Serialize, Deserialize)]
pub struct ExperimentListResponse {
    pub experiments: Vec<ExperimentSummary>,
}

#[derive(Serialize, Deserialize)]
pub struct ClientDto {
    pub name: ClientKind,
    pub source: String,
    pub enabled: bool,
}

#[derive(Serialize, Deserialize)]
pub struct ClientListResponse {
    pub clients: Vec<ClientDto>,
    pub open_sessions: usize,
}

#[derive(Deserialize)]
struct OperationParams {
    #[serde(default)]
    arg: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ClientOperationResponse {
    pub client: ClientKind,
    pub operation: String,
    pub result: serde_json::Value,
}

#[derive(Deserialize)]
struct HistoryParams {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub experiment: String,
    pub messages: Vec<MessageRecord>,
}

#[derive(Deserialize)]
struct AddDocumentsRequest {
    documents: Vec<String>,
    #[serde(default)]
    metadata: Option<Vec<Metadata>>,
}

#[derive(Serialize, Deserialize)]
pub struct AddDocumentsResponse {
    pub ids: Vec<usize>,
    pub total: usize,
}

#[derive(Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize, Deserialize)]
pub struct ToolDto {
    pub server: String,
    #[serde(flatten)]
    pub definition: ToolDefinition,
}

#[derive(Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDto>,
    pub count: usize,
}

#[derive(Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub tool: String,
    pub server: String,
    pub success: bool,
    pub result: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub experiment: String,
    pub provider: String,
    pub model: String,
    pub active_conversations: usize,
    pub documents: usize,
    pub enabled_clients: Vec<ClientKind>,
    pub open_sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: error.into() }))
}

/// Map a domain error to an HTTP status.
fn error_status(e: &Error) -> StatusCode {
    match e {
        Error::Routing(RoutingError::TargetUnavailable(_)) => StatusCode::BAD_REQUEST,
        Error::Routing(RoutingError::NoHandlerAvailable) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Client(ClientError::InvalidParams { .. }) => StatusCode::BAD_REQUEST,
        Error::Provider(_) | Error::Client(_) => StatusCode::BAD_GATEWAY,
        Error::Memory(_) => StatusCode::BAD_REQUEST,
        Error::Tool(ToolError::NotFound(_)) => StatusCode::NOT_FOUND,
        Error::Tool(ToolError::InvalidArguments(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn experiment_not_found(name: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("Experiment '{name}' not found"))
}

fn from_domain(e: Error) -> ApiError {
    let status = error_status(&e);
    if status.is_server_error() {
        warn!(error = %e, status = status.as_u16(), "Request failed");
    }
    api_error(status, e.to_string())
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

async fn query_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Checkout {
        agent,
        mut store,
        generation,
    } = match &payload.conversation_id {
        Some(id) => state.checkout(id, payload.experiment.as_deref()).await?,
        None => {
            let agent = state.agent_for(payload.experiment.as_deref())?;
            let store = agent.new_conversation();
            Checkout {
                agent,
                store,
                generation: None,
            }
        }
    };
    info!(experiment = agent.experiment().name, client = ?payload.client_type, "v1/query request");

    let result = agent
        .query(&mut store, &payload.query, payload.client_type.as_deref(), payload.params)
        .await;

    // The question is kept even when the turn fails.
    if let Some(id) = &payload.conversation_id {
        state
            .checkin(id.clone(), store, agent.experiment().name, generation)
            .await;
    }
    let outcome = result.map_err(from_domain)?;

    Ok(Json(QueryResponse {
        query: outcome.query,
        response: outcome.response,
        experiment: outcome.experiment,
        conversation_id: payload.conversation_id,
        metadata: serde_json::json!({
            "client_type": payload.client_type.as_deref().unwrap_or("auto"),
            "client": outcome.client,
            "client_data": outcome.client_data,
        }),
    }))
}

async fn chat_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let conv_id = payload
        .conversation_id
        .unwrap_or_else(|| ConversationId::new().to_string());
    let Checkout {
        agent,
        mut store,
        generation,
    } = state.checkout(&conv_id, payload.experiment.as_deref()).await?;
    info!(conversation = %conv_id, experiment = agent.experiment().name, "v1/chat request");

    let result = agent.chat(&mut store, &payload.message).await;
    state
        .checkin(conv_id.clone(), store, agent.experiment().name, generation)
        .await;

    let message = result.map_err(from_domain)?;
    Ok(Json(ChatResponse {
        message,
        conversation_id: conv_id,
        experiment: agent.experiment().name.to_string(),
    }))
}

// ── SSE Streaming ─────────────────────────────────────────────────────────

/// `POST /api/v1/chat/stream`: send a message, receive `chunk` events then
/// one `done` (with the conversation id) or `error`.
async fn chat_stream_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<ReceiverStream<Result<SseEvent, Infallible>>>, ApiError> {
    let conv_id = payload
        .conversation_id
        .unwrap_or_else(|| ConversationId::new().to_string());
    let Checkout {
        agent,
        mut store,
        generation,
    } = state.checkout(&conv_id, payload.experiment.as_deref()).await?;
    info!(conversation = %conv_id, experiment = agent.experiment().name, "v1/chat/stream SSE request");

    let mut events = match agent.chat_stream(&mut store, &payload.message).await {
        Ok(rx) => rx,
        Err(e) => {
            state
                .checkin(conv_id, store, agent.experiment().name, generation)
                .await;
            return Err(from_domain(e));
        }
    };

    let experiment = agent.experiment().name;
    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let mut data = serde_json::to_value(&event).unwrap_or_default();
            if let AgentStreamEvent::Done { response, .. } = &event {
                store.add_assistant(response.clone());
                data["conversation_id"] = serde_json::Value::String(conv_id.clone());
            }
            let sse = SseEvent::default().event(event.event_type()).data(data.to_string());
            if tx.send(Ok(sse)).await.is_err() {
                break;
            }
        }
        state.checkin(conv_id, store, experiment, generation).await;
    });

    Ok(Sse::new(ReceiverStream::new(rx)))
}

// ── Experiments & clients ─────────────────────────────────────────────────

async fn list_experiments_handler() -> Json<ExperimentListResponse> {
    let experiments = askpanda_experiments::all()
        .into_iter()
        .map(|e| ExperimentSummary {
            name: e.name.into(),
            description: e.summary.into(),
        })
        .collect();
    Json(ExperimentListResponse { experiments })
}

async fn get_experiment_handler(
    Path(name): Path<String>,
) -> Result<Json<askpanda_experiments::Experiment>, ApiError> {
    askpanda_experiments::lookup(&name)
        .map(Json)
        .map_err(|_| experiment_not_found(&name))
}

async fn list_clients_handler(State(state): State<SharedApiState>) -> Json<ClientListResponse> {
    let router = state.agent.router();
    let clients = ClientKind::ALL
        .iter()
        .map(|kind| ClientDto {
            name: *kind,
            source: kind.source().to_string(),
            enabled: router.get(*kind).is_some(),
        })
        .collect();
    Json(ClientListResponse {
        clients,
        open_sessions: router.tracker().open_sessions(),
    })
}

async fn client_operation_handler(
    State(state): State<SharedApiState>,
    Path((client, operation)): Path<(String, String)>,
    Query(params): Query<OperationParams>,
) -> Result<Json<ClientOperationResponse>, ApiError> {
    let op = ClientOperation::parse(&operation, params.arg.as_deref()).map_err(|e| from_domain(e.into()))?;
    if op.kind().as_str() != client {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Client '{client}' has no operation '{operation}'"),
        ));
    }

    let result = state.agent.router().call(&op).await.map_err(from_domain)?;
    Ok(Json(ClientOperationResponse {
        client: op.kind(),
        operation,
        result,
    }))
}

// ── Conversations ─────────────────────────────────────────────────────────

async fn get_conversation_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let conversations = state.conversations.read().await;
    let conv = conversations
        .get(&id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Conversation '{id}' not found")))?;
    Ok(Json(ConversationResponse {
        conversation_id: id.clone(),
        experiment: conv.experiment.clone(),
        messages: conv.store.messages(params.limit),
    }))
}

async fn delete_conversation_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut conversations = state.conversations.write().await;
    match conversations.remove(&id) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(api_error(StatusCode::NOT_FOUND, format!("Conversation '{id}' not found"))),
    }
}

// ── Knowledge base ────────────────────────────────────────────────────────

async fn add_documents_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<AddDocumentsRequest>,
) -> Result<(StatusCode, Json<AddDocumentsResponse>), ApiError> {
    let ids = state
        .agent
        .add_documents(payload.documents, payload.metadata)
        .await
        .map_err(from_domain)?;
    let total = state.agent.document_count().await;
    Ok((StatusCode::CREATED, Json(AddDocumentsResponse { ids, total })))
}

async fn search_documents_handler(
    State(state): State<SharedApiState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let top_k = params.top_k.unwrap_or(DEFAULT_TOP_K);
    let results = state.agent.search_documents(&params.query, top_k).await;
    Json(SearchResponse {
        query: params.query,
        results,
    })
}

// ── Tools ─────────────────────────────────────────────────────────────────

const TOOL_SERVERS: [ToolServer; 2] = [ToolServer::Panda, ToolServer::Docs];

async fn list_tools_handler(State(state): State<SharedApiState>) -> Json<ToolListResponse> {
    let tools: Vec<ToolDto> = TOOL_SERVERS
        .iter()
        .flat_map(|server| {
            state.registry(*server).definitions().into_iter().map(|definition| ToolDto {
                server: server.as_str().to_string(),
                definition,
            })
        })
        .collect();
    let count = tools.len();
    Json(ToolListResponse { tools, count })
}

async fn call_tool_handler(
    State(state): State<SharedApiState>,
    Path(name): Path<String>,
    Json(arguments): Json<serde_json::Value>,
) -> Result<Json<ToolCallResponse>, ApiError> {
    let server = TOOL_SERVERS
        .into_iter()
        .find(|server| state.registry(*server).get(&name).is_some())
        .ok_or_else(|| from_domain(ToolError::NotFound(name.clone()).into()))?;

    let call = ToolCall {
        id: uuid::Uuid::new_v4().to_string(),
        name: name.clone(),
        arguments,
    };
    let result = state
        .registry(server)
        .execute(&call)
        .await
        .map_err(|e| from_domain(e.into()))?;

    info!(tool = %name, server = server.as_str(), "Tool called");
    Ok(Json(ToolCallResponse {
        tool: name,
        server: server.as_str().to_string(),
        success: result.success,
        result: result.data,
    }))
}

// ── Status ────────────────────────────────────────────────────────────────

async fn status_handler(State(state): State<SharedApiState>) -> Json<StatusResponse> {
    let active_conversations = state.conversations.read().await.len();
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.start_time)
        .num_seconds()
        .max(0) as u64;

    Json(StatusResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_secs: uptime,
        experiment: state.agent.experiment().name.into(),
        provider: state.agent.provider().name().into(),
        model: state.agent.settings().model.clone(),
        active_conversations,
        documents: state.agent.document_count().await,
        enabled_clients: state.agent.router().available_targets(),
        open_sessions: state.agent.router().tracker().open_sessions(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use askpanda_agent::AgentSettings;
    use askpanda_clients::ClientRouter;
    use askpanda_config::ClientConfig;
    use askpanda_core::error::ProviderError;
    use askpanda_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

    /// Lightweight mock provider for gateway tests.
    struct MockProvider {
        response: Result<String, ProviderError>,
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                content: self.response.clone()?,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock-model".into(),
            })
        }
    }

    fn state_with(response: Result<String, ProviderError>, clients: ClientConfig) -> SharedApiState {
        let provider: Arc<dyn Provider> = Arc::new(MockProvider { response });
        let router = Arc::new(ClientRouter::from_config(&clients));
        let agent = Agent::new(
            provider,
            router,
            askpanda_experiments::lookup("atlas").unwrap(),
            AgentSettings::default(),
        );
        Arc::new(ApiState::new(agent, AppConfig::default()))
    }

    fn test_state() -> SharedApiState {
        state_with(Ok("Mock response from agent".into()), ClientConfig::default())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let response = v1_router(test_state()).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: HealthResponse = body_json(response).await;
        assert_eq!(json.status, "healthy");
    }

    #[tokio::test]
    async fn query_routes_by_keyword() {
        let app = v1_router(test_state());
        let response = app
            .oneshot(post_json("/query", serde_json::json!({"query": "where is the dataset?"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: QueryResponse = body_json(response).await;
        assert_eq!(json.response, "Mock response from agent");
        assert_eq!(json.experiment, "atlas");
        assert_eq!(json.metadata["client"], "data");
        assert_eq!(json.metadata["client_type"], "auto");
        assert_eq!(json.metadata["client_data"]["source"], "data");
        assert!(json.conversation_id.is_none());
    }

    #[tokio::test]
    async fn query_unknown_client_is_bad_request() {
        let response = v1_router(test_state())
            .oneshot(post_json(
                "/query",
                serde_json::json!({"query": "hello", "client_type": "rucio"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: ErrorResponse = body_json(response).await;
        assert!(json.error.contains("Client 'rucio' is not available"));
    }

    #[tokio::test]
    async fn query_without_handler_is_unavailable() {
        let clients = ClientConfig {
            pilots_enabled: false,
            ..ClientConfig::default()
        };
        let state = state_with(Ok("unused".into()), clients);
        let response = v1_router(state)
            .oneshot(post_json("/query", serde_json::json!({"query": "harvester pilot counts"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn model_failure_is_bad_gateway() {
        let state = state_with(
            Err(ProviderError::AuthenticationFailed("bad key".into())),
            ClientConfig::default(),
        );
        let response = v1_router(state)
            .oneshot(post_json("/chat", serde_json::json!({"message": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn unknown_experiment_is_not_found() {
        let response = v1_router(test_state())
            .oneshot(post_json(
                "/chat",
                serde_json::json!({"message": "hi", "experiment": "cms"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: ErrorResponse = body_json(response).await;
        assert_eq!(json.error, "Experiment 'cms' not found");
    }

    #[tokio::test]
    async fn chat_generates_id_and_keeps_history() {
        let state = test_state();

        let response = v1_router(state.clone())
            .oneshot(post_json(
                "/chat",
                serde_json::json!({"message": "hi", "experiment": "verarubin"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let chat: ChatResponse = body_json(response).await;
        assert_eq!(chat.experiment, "verarubin");
        assert!(!chat.conversation_id.is_empty());

        let response = v1_router(state.clone())
            .oneshot(get(&format!("/conversations/{}", chat.conversation_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let conv: ConversationResponse = body_json(response).await;
        assert_eq!(conv.experiment, "verarubin");
        // system prompt, user, assistant
        assert_eq!(conv.messages.len(), 3);
        assert_eq!(conv.messages[2].content, "Mock response from agent");

        let response = v1_router(state.clone())
            .oneshot(get(&format!("/conversations/{}?limit=1", chat.conversation_id)))
            .await
            .unwrap();
        let conv: ConversationResponse = body_json(response).await;
        assert_eq!(conv.messages.len(), 1);
    }

    #[tokio::test]
    async fn delete_conversation() {
        let state = test_state();
        let response = v1_router(state.clone())
            .oneshot(post_json(
                "/chat",
                serde_json::json!({"message": "hi", "conversation_id": "conv-1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let delete = || {
            Request::builder()
                .method("DELETE")
                .uri("/conversations/conv-1")
                .body(Body::empty())
                .unwrap()
        };
        let response = v1_router(state.clone()).oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = v1_router(state).oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_stream_emits_chunk_then_done() {
        let state = test_state();
        let response = v1_router(state.clone())
            .oneshot(post_json(
                "/chat/stream",
                serde_json::json!({"message": "hi", "conversation_id": "stream-1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("event: chunk"));
        assert!(text.contains("event: done"));
        assert!(text.contains(r#""conversation_id":"stream-1""#));

        // The forwarding task stores the conversation after the final event.
        for _ in 0..50 {
            if state.conversations.read().await.contains_key("stream-1") {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let conversations = state.conversations.read().await;
        let conv = conversations.get("stream-1").unwrap();
        assert_eq!(conv.store.message_count(), 3);
    }

    #[tokio::test]
    async fn list_and_get_experiments() {
        let response = v1_router(test_state()).oneshot(get("/experiments")).await.unwrap();
        let json: ExperimentListResponse = body_json(response).await;
        let names: Vec<_> = json.experiments.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["atlas", "verarubin", "epic"]);

        let response = v1_router(test_state()).oneshot(get("/experiments/epic")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = body_json(response).await;
        assert_eq!(json["panda_url"], "https://panda.eic.io");

        let response = v1_router(test_state()).oneshot(get("/experiments/cms")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn clients_show_enabled_state() {
        let clients = ClientConfig {
            maintenance_enabled: false,
            ..ClientConfig::default()
        };
        let response = v1_router(state_with(Ok("x".into()), clients))
            .oneshot(get("/clients"))
            .await
            .unwrap();
        let json: ClientListResponse = body_json(response).await;
        assert_eq!(json.clients.len(), 5);
        assert_eq!(json.clients[0].source, "documentation");
        let maintenance = json.clients.iter().find(|c| c.name == ClientKind::Maintenance).unwrap();
        assert!(!maintenance.enabled);
        assert_eq!(json.open_sessions, 0);
    }

    #[tokio::test]
    async fn documents_add_and_search() {
        let state = test_state();
        let response = v1_router(state.clone())
            .oneshot(post_json(
                "/documents",
                serde_json::json!({"documents": ["prun guide", "pathena guide"]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json: AddDocumentsResponse = body_json(response).await;
        assert_eq!(json.ids, vec![0, 1]);

        let response = v1_router(state.clone())
            .oneshot(get("/documents/search?query=guide&top_k=1"))
            .await
            .unwrap();
        let json: SearchResponse = body_json(response).await;
        assert_eq!(json.results.len(), 1);
        assert_eq!(json.results[0].content, "prun guide");
    }

    #[tokio::test]
    async fn documents_metadata_mismatch_is_rejected() {
        let response = v1_router(test_state())
            .oneshot(post_json(
                "/documents",
                serde_json::json!({"documents": ["a", "b"], "metadata": [{}]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_tools_covers_both_servers() {
        let response = v1_router(test_state()).oneshot(get("/tools")).await.unwrap();
        let json: ToolListResponse = body_json(response).await;
        assert_eq!(json.count, 6);
        assert!(json.tools.iter().any(|t| t.server == "panda" && t.definition.name == "query_panda"));
        assert!(json.tools.iter().any(|t| t.server == "docs" && t.definition.name == "get_doc_page"));
    }

    #[tokio::test]
    async fn call_tool() {
        let response = v1_router(test_state())
            .oneshot(post_json("/tools/get_job_status", serde_json::json!({"job_id": "42"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: ToolCallResponse = body_json(response).await;
        assert_eq!(json.server, "panda");
        assert_eq!(json.result["job_id"], "42");

        let response = v1_router(test_state())
            .oneshot(post_json("/tools/get_job_status", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = v1_router(test_state())
            .oneshot(post_json("/tools/rm_rf", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: ErrorResponse = body_json(response).await;
        assert!(json.error.contains("Unknown tool: rm_rf"));
    }

    #[tokio::test]
    async fn status_endpoint() {
        let response = v1_router(test_state()).oneshot(get("/status")).await.unwrap();
        let json: StatusResponse = body_json(response).await;
        assert_eq!(json.status, "healthy");
        assert_eq!(json.provider, "gateway_mock");
        assert_eq!(json.experiment, "atlas");
        assert_eq!(json.enabled_clients.len(), 5);
        assert_eq!(json.active_conversations, 0);
    }

    #[tokio::test]
    async fn conversation_keeps_its_experiment() {
        let state = test_state();
        let chat = |body: serde_json::Value| v1_router(state.clone()).oneshot(post_json("/chat", body));

        let response = chat(serde_json::json!({
            "message": "hi", "experiment": "epic", "conversation_id": "c1"
        }))
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // no experiment on a later turn: the conversation's own is used
        let response = chat(serde_json::json!({"message": "again", "conversation_id": "c1"}))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: ChatResponse = body_json(response).await;
        assert_eq!(json.experiment, "epic");

        let response = v1_router(state.clone())
            .oneshot(post_json(
                "/query",
                serde_json::json!({"query": "how to run prun", "conversation_id": "c1"}),
            ))
            .await
            .unwrap();
        let json: QueryResponse = body_json(response).await;
        assert_eq!(json.experiment, "epic");

        // the same experiment under another spelling is fine
        let response = chat(serde_json::json!({
            "message": "more", "experiment": "ePIC", "conversation_id": "c1"
        }))
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = chat(serde_json::json!({
            "message": "switch", "experiment": "atlas", "conversation_id": "c1"
        }))
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = v1_router(state.clone())
            .oneshot(post_json(
                "/chat/stream",
                serde_json::json!({"message": "switch", "experiment": "verarubin", "conversation_id": "c1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = v1_router(state).oneshot(get("/conversations/c1")).await.unwrap();
        let conv: ConversationResponse = body_json(response).await;
        assert_eq!(conv.experiment, "epic");
        assert!(conv.messages[0].content.contains("ePIC"));
        // system prompt plus four exchanges; rejected turns left nothing
        assert_eq!(conv.messages.len(), 9);
    }

    #[tokio::test]
    async fn checkin_evicts_oldest_at_capacity() {
        let state = test_state();
        let now = chrono::Utc::now();
        {
            let mut conversations = state.conversations.write().await;
            for i in 0..MAX_CONVERSATIONS {
                let age = if i == 500 {
                    chrono::Duration::hours(2)
                } else {
                    chrono::Duration::seconds((MAX_CONVERSATIONS - i) as i64)
                };
                conversations.insert(
                    format!("c-{i}"),
                    Conversation {
                        store: state.agent.new_conversation(),
                        experiment: "atlas".into(),
                        created_at: now - age,
                        generation: 0,
                    },
                );
            }
        }

        // an existing id at capacity evicts nothing
        assert!(state.checkin("c-0".into(), state.agent.new_conversation(), "atlas", Some(0)).await);
        {
            let conversations = state.conversations.read().await;
            assert_eq!(conversations.len(), MAX_CONVERSATIONS);
            assert!(conversations.contains_key("c-500"));
        }

        // a new id evicts the one created first
        assert!(state.checkin("fresh".into(), state.agent.new_conversation(), "atlas", None).await);
        {
            let conversations = state.conversations.read().await;
            assert_eq!(conversations.len(), MAX_CONVERSATIONS);
            assert!(!conversations.contains_key("c-500"));
            assert!(conversations.contains_key("fresh"));
            assert!(conversations.contains_key("c-0"));
        }

        // c-0 kept its original creation time, so it is next
        assert!(state.checkin("fresher".into(), state.agent.new_conversation(), "atlas", None).await);
        let conversations = state.conversations.read().await;
        assert_eq!(conversations.len(), MAX_CONVERSATIONS);
        assert!(!conversations.contains_key("c-0"));
        assert!(conversations.contains_key("fresh"));
    }

    #[tokio::test]
    async fn turn_on_deleted_conversation_is_dropped() {
        let state = test_state();
        assert!(state.checkin("c1".into(), state.agent.new_conversation(), "atlas", None).await);

        let mut turn = state.checkout("c1", None).await.unwrap();
        turn.store.add_user("late question");
        state.conversations.write().await.remove("c1");

        assert!(!state.checkin("c1".into(), turn.store, "atlas", turn.generation).await);
        assert!(!state.conversations.read().await.contains_key("c1"));
    }

    #[tokio::test]
    async fn concurrent_turns_do_not_overwrite_each_other() {
        let state = test_state();
        assert!(state.checkin("c1".into(), state.agent.new_conversation(), "atlas", None).await);

        let mut first = state.checkout("c1", None).await.unwrap();
        let mut second = state.checkout("c1", None).await.unwrap();
        first.store.add_user("first");
        second.store.add_user("second");

        assert!(state.checkin("c1".into(), first.store, "atlas", first.generation).await);
        assert!(!state.checkin("c1".into(), second.store, "atlas", second.generation).await);

        let conversations = state.conversations.read().await;
        let stored = conversations.get("c1").unwrap().store.messages(None);
        assert_eq!(stored.last().unwrap().content, "first");
    }

    #[tokio::test]
    async fn client_operations() {
        let app = v1_router(test_state());

        let response = app
            .clone()
            .oneshot(get("/clients/logs/get_job_logs?arg=6512345"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: ClientOperationResponse = body_json(response).await;
        assert_eq!(json.client, ClientKind::Logs);
        assert_eq!(json.result["job_id"], "6512345");

        let response = app
            .clone()
            .oneshot(get("/clients/maintenance/get_scheduled_maintenance"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // operation exists, but on another client
        let response = app.clone().oneshot(get("/clients/docs/get_files?arg=x")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.clone().oneshot(get("/clients/data/get_dataset")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(get("/clients/data/drop_all?arg=x")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn client_operation_on_disabled_client() {
        let clients = ClientConfig {
            pilots_enabled: false,
            ..ClientConfig::default()
        };
        let response = v1_router(state_with(Ok("x".into()), clients))
            .oneshot(get("/clients/pilots/get_pilot_status?arg=BNL"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: ErrorResponse = body_json(response).await;
        assert!(json.error.contains("Client 'pilots' is not available"));
    }
}
