//! Conversation memory and document storage for Ask PanDA.

pub mod context_store;
pub mod vector_store;

pub use context_store::{ContextStore, Scratch};
pub use vector_store::{Document, SearchHit, VectorStore};
