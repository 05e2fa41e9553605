//! PanDA domain clients and the query router.
//!
//! Each client implements [`DomainClient`]. The [`ClientRouter`] owns a
//! read-only routing table built from configuration and delegates each query
//! to one client inside a scoped [`ClientSession`].

pub mod session;
pub mod docs;
pub mod logs;
pub mod data;
pub mod pilots;
pub mod maintenance;
pub mod router;
pub mod operations;

use async_trait::async_trait;
use askpanda_core::client::{ClientKind, ClientQuery, ClientResponse};
use askpanda_core::error::ClientError;

pub use session::{ClientSession, ConnectionParams, SessionTracker};
pub use docs::DocsClient;
pub use logs::LogsClient;
pub use data::DataClient;
pub use pilots::PilotsClient;
pub use maintenance::MaintenanceClient;
pub use router::{ClientRouter, RouteEntry, RoutedResponse, classify};
pub use operations::ClientOperation;

/// The capability every domain client provides.
#[async_trait]
pub trait DomainClient: Send + Sync {
    /// Which routing-table slot this client serves.
    fn kind(&self) -> ClientKind;

    /// Answer a query using an already-open session.
    async fn query(
        &self,
        session: &ClientSession,
        query: &ClientQuery,
    ) -> Result<ClientResponse, ClientError>;
}

/// Placeholder response: no results, a fixed "query executed" message.
pub(crate) fn executed(kind: ClientKind, label: &str, query: &ClientQuery) -> ClientResponse {
    ClientResponse {
        query: query.text.clone(),
        results: Vec::new(),
        source: kind.source().to_string(),
        message: format!("{label} query executed"),
    }
}
