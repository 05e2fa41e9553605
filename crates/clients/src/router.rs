//! Query router: picks a domain client for a query and delegates to it.
//!
//! The routing table is fixed at construction. A caller may name the target
//! client explicitly; otherwise the query text is classified by keyword.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use askpanda_config::ClientConfig;
use askpanda_core::client::{ClientKind, ClientQuery, ClientResponse};
use askpanda_core::error::{Error, RoutingError};
use serde::Serialize;

use crate::session::{ClientSession, ConnectionParams, SessionTracker};
use crate::{DataClient, DocsClient, DomainClient, LogsClient, MaintenanceClient, PilotsClient};

/// Keyword categories, tried in order. First match wins.
const CATEGORIES: &[(ClientKind, &[&str])] = &[
    (ClientKind::Docs, &["doc", "documentation", "how to", "guide", "manual"]),
    (ClientKind::Logs, &["log", "error", "output", "stderr", "stdout"]),
    (ClientKind::Data, &["data", "dataset", "file", "rucio"]),
    (ClientKind::Pilots, &["pilot", "harvester", "site"]),
    (ClientKind::Maintenance, &["maintenance", "downtime", "status"]),
];

/// Pick a client kind for free text by case-insensitive substring match.
///
/// Falls back to [`ClientKind::Docs`] when nothing matches.
pub fn classify(query: &str) -> ClientKind {
    let lowered = query.to_lowercase();
    CATEGORIES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ClientKind::Docs)
}

/// One slot in the routing table.
pub struct RouteEntry {
    client: Arc<dyn DomainClient>,
    enabled: bool,
    params: ConnectionParams,
}

impl RouteEntry {
    pub fn new(client: Arc<dyn DomainClient>, params: ConnectionParams) -> Self {
        Self {
            client,
            enabled: true,
            params,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }
}

/// A client response together with the client that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedResponse {
    pub client: ClientKind,
    #[serde(flatten)]
    pub response: ClientResponse,
}

/// Routes queries to domain clients. Read-only after construction.
pub struct ClientRouter {
    table: BTreeMap<ClientKind, RouteEntry>,
    tracker: SessionTracker,
}

impl ClientRouter {
    /// Build a router from explicit entries. A later entry for the same kind
    /// replaces an earlier one.
    pub fn new(entries: impl IntoIterator<Item = RouteEntry>) -> Self {
        let table = entries
            .into_iter()
            .map(|entry| (entry.client.kind(), entry))
            .collect();
        Self {
            table,
            tracker: SessionTracker::new(),
        }
    }

    /// Build the standard five-client table from configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        let params = ConnectionParams::new(&config.base_url, Duration::from_secs(config.timeout));
        let clients: [Arc<dyn DomainClient>; 5] = [
            Arc::new(DocsClient),
            Arc::new(LogsClient),
            Arc::new(DataClient),
            Arc::new(PilotsClient),
            Arc::new(MaintenanceClient),
        ];

        let router = Self::new(clients.into_iter().map(|client| {
            let enabled = config.is_enabled(client.kind().as_str());
            RouteEntry::new(client, params.clone()).enabled(enabled)
        }));

        tracing::info!(
            enabled = ?router.available_targets(),
            base_url = %config.base_url,
            "Client router initialized"
        );
        router
    }

    /// The enabled client of `kind`, if any.
    pub fn get(&self, kind: ClientKind) -> Option<&Arc<dyn DomainClient>> {
        self.table
            .get(&kind)
            .filter(|entry| entry.enabled)
            .map(|entry| &entry.client)
    }

    /// Enabled client kinds in routing-priority order.
    pub fn available_targets(&self) -> Vec<ClientKind> {
        self.table
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Route a query.
    ///
    /// With `target`, that client must exist and be enabled or the call fails
    /// with [`RoutingError::TargetUnavailable`]. Without it the query is
    /// classified, and a classification landing on a disabled client fails
    /// with [`RoutingError::NoHandlerAvailable`]. Client failures are
    /// returned unchanged.
    pub async fn route(&self, query: &ClientQuery, target: Option<&str>) -> Result<RoutedResponse, Error> {
        let (kind, entry) = match target {
            Some(name) => {
                let entry = name
                    .parse::<ClientKind>()
                    .ok()
                    .and_then(|kind| self.table.get(&kind).map(|entry| (kind, entry)))
                    .filter(|(_, entry)| entry.enabled);
                entry.ok_or_else(|| RoutingError::TargetUnavailable(name.to_string()))?
            }
            None => {
                let kind = classify(&query.text);
                tracing::debug!(client = %kind, "Query classified");
                let entry = self
                    .table
                    .get(&kind)
                    .filter(|entry| entry.enabled)
                    .ok_or(RoutingError::NoHandlerAvailable)?;
                (kind, entry)
            }
        };

        let session = ClientSession::open(kind, &entry.params, &self.tracker)?;
        let response = entry.client.query(&session, query).await?;
        drop(session);

        tracing::info!(client = %kind, source = %response.source, "Query routed");
        Ok(RoutedResponse { client: kind, response })
    }

    /// Open a session on an enabled client, for calls beyond `query`.
    pub fn open_session(&self, kind: ClientKind) -> Result<ClientSession, Error> {
        let entry = self
            .table
            .get(&kind)
            .filter(|entry| entry.enabled)
            .ok_or_else(|| RoutingError::TargetUnavailable(kind.to_string()))?;
        Ok(ClientSession::open(kind, &entry.params, &self.tracker)?)
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }
}
