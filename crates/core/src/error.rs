//! Error types for the Ask PanDA domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Ask PanDA operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model backend errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Domain client errors ---
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    // --- Routing errors ---
    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures raised by a domain client while serving a delegated query.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Could not open session for {client}: {reason}")]
    SessionFailed { client: String, reason: String },

    #[error("Request to {client} failed: {reason}")]
    RequestFailed { client: String, reason: String },

    #[error("Request to {client} timed out after {timeout_secs}s")]
    Timeout { client: String, timeout_secs: u64 },

    #[error("Invalid parameters for {client}: {reason}")]
    InvalidParams { client: String, reason: String },
}

/// Rejections raised by the query router before any client is called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The caller named a client that is unknown or disabled.
    #[error("Client '{0}' is not available")]
    TargetUnavailable(String),

    /// Classification picked a client that is not enabled.
    #[error("No appropriate client available for the query")]
    NoHandlerAvailable,
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Documents and metadata must have the same length ({documents} vs {metadata})")]
    LengthMismatch { documents: usize, metadata: usize },

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
