//! Dataset and file client (Rucio-backed in production).

use async_trait::async_trait;
use askpanda_core::client::{ClientKind, ClientQuery, ClientResponse};
use askpanda_core::error::ClientError;
use serde_json::{Value, json};

use crate::{ClientSession, DomainClient, executed};

#[derive(Debug, Clone, Copy, Default)]
pub struct DataClient;

impl DataClient {
    pub async fn get_dataset(&self, _session: &ClientSession, dataset_name: &str) -> Result<Value, ClientError> {
        Ok(json!({
            "dataset_name": dataset_name,
            "info": {},
            "source": ClientKind::Data.source(),
        }))
    }

    pub async fn get_files(&self, _session: &ClientSession, dataset_name: &str) -> Result<Value, ClientError> {
        Ok(json!({
            "dataset_name": dataset_name,
            "files": [],
            "source": ClientKind::Data.source(),
        }))
    }
}

#[async_trait]
impl DomainClient for DataClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Data
    }

    async fn query(&self, _session: &ClientSession, query: &ClientQuery) -> Result<ClientResponse, ClientError> {
        Ok(executed(ClientKind::Data, "Data", query))
    }
}
