//! HTTP API gateway for Ask PanDA.
//!
//! Serves the v1 API under `/api/v1`: queries, chat (plain and SSE),
//! experiments, clients, conversations, the knowledge base, and tools.
//!
//! Built on Axum.

pub mod api_v1;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use askpanda_agent::Agent;
use askpanda_config::AppConfig;

pub use api_v1::{ApiState, SharedApiState};

/// Request bodies above this size are rejected.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the full router: v1 API nested under `/api/v1`, with CORS from
/// `server.cors_origins`, a body limit, and HTTP trace logging.
pub fn build_router(state: SharedApiState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);
    Router::new()
        .nest("/api/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS policy for the configured origins. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600));

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let agent = Agent::from_config(&config)?;
    let state = Arc::new(ApiState::new(agent, config.clone()));
    let app = build_router(state);

    info!(
        addr = %addr,
        experiment = %config.experiment.name,
        debug = config.server.debug,
        "Gateway starting with v1 API"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use askpanda_agent::AgentSettings;
    use askpanda_clients::ClientRouter;
    use askpanda_core::error::ProviderError;
    use askpanda_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    struct Echo;

    #[async_trait::async_trait]
    impl Provider for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(ProviderResponse {
                content: last,
                usage: None,
                model: request.model,
            })
        }
    }

    fn test_state(cors_origins: Vec<String>) -> SharedApiState {
        let mut config = AppConfig::default();
        config.server.cors_origins = cors_origins;
        let agent = Agent::new(
            Arc::new(Echo),
            Arc::new(ClientRouter::from_config(&config.clients)),
            askpanda_experiments::lookup("atlas").unwrap(),
            AgentSettings::default(),
        );
        Arc::new(ApiState::new(agent, config))
    }

    #[tokio::test]
    async fn health_is_under_api_prefix() {
        let app = build_router(test_state(vec!["*".into()]));

        let req = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wildcard_cors_allows_any_origin() {
        let app = build_router(test_state(vec!["*".into()]));
        let req = Request::builder()
            .uri("/api/v1/health")
            .header("origin", "http://example.org")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn listed_cors_origin_is_echoed() {
        let app = build_router(test_state(vec!["http://localhost:8501".into()]));
        let req = Request::builder()
            .uri("/api/v1/health")
            .header("origin", "http://localhost:8501")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:8501"
        );
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = build_router(test_state(vec!["*".into()]));
        let big = "x".repeat(MAX_BODY_BYTES + 1);
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/chat")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "message": big }).to_string()))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
