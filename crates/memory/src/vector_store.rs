//! Placeholder document store.
//!
//! Documents get a zero embedding of `embedding_dim` and search returns the
//! first `top_k` documents with a fixed score. No similarity is computed.

use askpanda_core::error::MemoryError;
use serde::{Deserialize, Serialize};

/// Embedding width of `text-embedding-ada-002`.
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Score attached to every search hit.
pub const PLACEHOLDER_SCORE: f32 = 0.5;

pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub index: usize,
    pub content: String,
    pub metadata: Metadata,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct VectorStore {
    embedding_dim: usize,
    documents: Vec<Document>,
    embeddings: Vec<Vec<f32>>,
}

impl VectorStore {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            embedding_dim,
            documents: Vec::new(),
            embeddings: Vec::new(),
        }
    }

    /// Add one document and return its index.
    pub fn add_document(&mut self, content: impl Into<String>, metadata: Option<Metadata>) -> usize {
        self.documents.push(Document {
            content: content.into(),
            metadata: metadata.unwrap_or_default(),
        });
        self.embeddings.push(vec![0.0; self.embedding_dim]);
        self.documents.len() - 1
    }

    /// Add a batch of documents.
    ///
    /// When `metadata` is given it must have one entry per document; on a
    /// mismatch nothing is inserted.
    pub fn add_documents(
        &mut self,
        documents: Vec<String>,
        metadata: Option<Vec<Metadata>>,
    ) -> Result<Vec<usize>, MemoryError> {
        let metadata = match metadata {
            Some(list) if list.len() != documents.len() => {
                return Err(MemoryError::LengthMismatch {
                    documents: documents.len(),
                    metadata: list.len(),
                });
            }
            Some(list) => list,
            None => vec![Metadata::new(); documents.len()],
        };

        let indices = documents
            .into_iter()
            .zip(metadata)
            .map(|(content, meta)| self.add_document(content, Some(meta)))
            .collect::<Vec<_>>();
        tracing::debug!(added = indices.len(), total = self.documents.len(), "Documents added");
        Ok(indices)
    }

    /// Return the first `top_k` documents, each scored [`PLACEHOLDER_SCORE`].
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        tracing::trace!(query, top_k, "Vector store search");
        self.documents
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(index, doc)| SearchHit {
                index,
                content: doc.content.clone(),
                metadata: doc.metadata.clone(),
                score: PLACEHOLDER_SCORE,
            })
            .collect()
    }

    pub fn get_document(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    pub fn embedding(&self, index: usize) -> Option<&[f32]> {
        self.embeddings.get(index).map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.embeddings.clear();
    }

    pub fn count(&self) -> usize {
        self.documents.len()
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }
}

impl Default for VectorStore {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}
