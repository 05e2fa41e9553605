//! Domain client vocabulary: the five PanDA client kinds and the
//! query/response shapes every client speaks.
//!
//! The capability trait itself lives in `askpanda-clients`, next to the
//! session type it borrows.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The kinds of domain client, in routing-priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    Docs,
    Logs,
    Data,
    Pilots,
    Maintenance,
}

impl ClientKind {
    /// Every kind, in the order classification tries them.
    pub const ALL: [ClientKind; 5] = [
        ClientKind::Docs,
        ClientKind::Logs,
        ClientKind::Data,
        ClientKind::Pilots,
        ClientKind::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientKind::Docs => "docs",
            ClientKind::Logs => "logs",
            ClientKind::Data => "data",
            ClientKind::Pilots => "pilots",
            ClientKind::Maintenance => "maintenance",
        }
    }

    /// The `source` label a client of this kind stamps on its responses.
    pub fn source(&self) -> &'static str {
        match self {
            ClientKind::Docs => "documentation",
            ClientKind::Logs => "logs",
            ClientKind::Data => "data",
            ClientKind::Pilots => "pilots",
            ClientKind::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for ClientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docs" => Ok(ClientKind::Docs),
            "logs" => Ok(ClientKind::Logs),
            "data" => Ok(ClientKind::Data),
            "pilots" => Ok(ClientKind::Pilots),
            "maintenance" => Ok(ClientKind::Maintenance),
            other => Err(other.to_string()),
        }
    }
}

/// A query delegated to a domain client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientQuery {
    /// Natural-language query text
    pub text: String,

    /// Experiment the query is scoped to (e.g. "atlas")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment: Option<String>,

    /// Extra client-specific parameters
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl ClientQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            experiment: None,
            params: serde_json::Map::new(),
        }
    }

    pub fn with_experiment(mut self, experiment: impl Into<String>) -> Self {
        self.experiment = Some(experiment.into());
        self
    }

    pub fn with_params(mut self, params: serde_json::Map<String, serde_json::Value>) -> Self {
        self.params = params;
        self
    }
}

/// What a domain client returns for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientResponse {
    pub query: String,
    pub results: Vec<serde_json::Value>,
    pub source: String,
    pub message: String,
}
