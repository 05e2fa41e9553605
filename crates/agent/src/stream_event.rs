//! Streaming chat events.
//!
//! `AgentStreamEvent` wraps provider stream chunks into the events the
//! gateway forwards to clients over SSE.

use askpanda_core::provider::Usage;
use serde::{Deserialize, Serialize};

/// Events emitted while a chat reply streams.
///
/// - `chunk`: partial text from the model
/// - `done`: the stream finished; carries the full reply
/// - `error`: the model failed mid-stream; no reply should be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    Chunk { content: String },

    Done {
        response: String,
        usage: Option<Usage>,
    },

    Error { message: String },
}

impl AgentStreamEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}
