//! # Ask PanDA Core
//!
//! Domain types, traits, and error definitions for the Ask PanDA assistant.
//! This crate has **no framework dependencies**. It defines the domain model
//! that the other crates implement against.
//!
//! ## Layout
//!
//! - [`message`]: conversation messages and their wire projections
//! - [`provider`]: the [`Provider`] trait over language-model backends
//! - [`client`]: the client kinds and query/response shapes shared by the domain clients
//! - [`tool`]: the [`Tool`] trait and [`ToolRegistry`] used by the MCP-style tool sets

pub mod error;
pub mod message;
pub mod provider;
pub mod client;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{ChatMessage, ConversationId, Message, MessageRecord, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk};
pub use client::{ClientKind, ClientQuery, ClientResponse};
pub use tool::{Tool, ToolCall, ToolResult, ToolRegistry};
