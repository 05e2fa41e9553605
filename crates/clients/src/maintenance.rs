//! Site maintenance and downtime client.

use async_trait::async_trait;
use askpanda_core::client::{ClientKind, ClientQuery, ClientResponse};
use askpanda_core::error::ClientError;
use serde_json::{Value, json};

use crate::{ClientSession, DomainClient, executed};

#[derive(Debug, Clone, Copy, Default)]
pub struct MaintenanceClient;

impl MaintenanceClient {
    pub async fn get_site_status(&self, _session: &ClientSession, site: &str) -> Result<Value, ClientError> {
        Ok(json!({
            "site": site,
            "status": "operational",
            "source": ClientKind::Maintenance.source(),
        }))
    }

    /// Upcoming maintenance windows across all sites.
    pub async fn get_scheduled_maintenance(&self, _session: &ClientSession) -> Result<Value, ClientError> {
        Ok(json!({
            "scheduled": [],
            "source": ClientKind::Maintenance.source(),
        }))
    }
}

#[async_trait]
impl DomainClient for MaintenanceClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Maintenance
    }

    async fn query(&self, _session: &ClientSession, query: &ClientQuery) -> Result<ClientResponse, ClientError> {
        Ok(executed(ClientKind::Maintenance, "Maintenance", query))
    }
}
