//! MCP-style tool sets for Ask PanDA.
//!
//! Two servers' worth of tools: `panda` (job queries and status) and `docs`
//! (documentation search). Each is exposed as a [`ToolRegistry`] so the CLI
//! and HTTP gateway can list and call them by name.

pub mod docs;
pub mod panda;

use askpanda_core::tool::ToolRegistry;
use std::str::FromStr;

/// Which tool set to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolServer {
    Panda,
    Docs,
}

impl ToolServer {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolServer::Panda => "panda",
            ToolServer::Docs => "docs",
        }
    }
}

impl FromStr for ToolServer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "panda" => Ok(ToolServer::Panda),
            "docs" => Ok(ToolServer::Docs),
            other => Err(format!("unknown tool server '{other}' (expected 'panda' or 'docs')")),
        }
    }
}

/// PanDA tools, with `query_panda` defaulting to `experiment`.
pub fn panda_registry(experiment: &str) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(panda::QueryPandaTool::new(experiment)));
    registry.register(Box::new(panda::JobStatusTool));
    registry.register(Box::new(panda::SearchDocumentationTool));
    registry
}

pub fn docs_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(docs::SearchDocsTool));
    registry.register(Box::new(docs::GetDocPageTool));
    registry.register(Box::new(docs::ListDocSectionsTool));
    registry
}

pub fn registry(server: ToolServer, experiment: &str) -> ToolRegistry {
    match server {
        ToolServer::Panda => panda_registry(experiment),
        ToolServer::Docs => docs_registry(),
    }
}
