//! Pilot and Harvester client.

use async_trait::async_trait;
use askpanda_core::client::{ClientKind, ClientQuery, ClientResponse};
use askpanda_core::error::ClientError;
use serde_json::{Value, json};

use crate::{ClientSession, DomainClient, executed};

#[derive(Debug, Clone, Copy, Default)]
pub struct PilotsClient;

impl PilotsClient {
    pub async fn get_pilot_status(&self, _session: &ClientSession, site: &str) -> Result<Value, ClientError> {
        Ok(json!({
            "site": site,
            "status": {},
            "source": ClientKind::Pilots.source(),
        }))
    }

    pub async fn get_pilot_jobs(&self, _session: &ClientSession, site: &str) -> Result<Value, ClientError> {
        Ok(json!({
            "site": site,
            "jobs": [],
            "source": ClientKind::Pilots.source(),
        }))
    }
}

#[async_trait]
impl DomainClient for PilotsClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Pilots
    }

    async fn query(&self, _session: &ClientSession, query: &ClientQuery) -> Result<ClientResponse, ClientError> {
        Ok(executed(ClientKind::Pilots, "Pilots", query))
    }
}
