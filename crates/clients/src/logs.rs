//! Job and task log client.

use async_trait::async_trait;
use askpanda_core::client::{ClientKind, ClientQuery, ClientResponse};
use askpanda_core::error::ClientError;
use serde_json::{Value, json};

use crate::{ClientSession, DomainClient, executed};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogsClient;

impl LogsClient {
    pub async fn get_job_logs(&self, _session: &ClientSession, job_id: &str) -> Result<Value, ClientError> {
        Ok(json!({
            "job_id": job_id,
            "logs": [],
            "source": ClientKind::Logs.source(),
        }))
    }

    pub async fn get_task_logs(&self, _session: &ClientSession, task_id: &str) -> Result<Value, ClientError> {
        Ok(json!({
            "task_id": task_id,
            "logs": [],
            "source": ClientKind::Logs.source(),
        }))
    }
}

#[async_trait]
impl DomainClient for LogsClient {
    fn kind(&self) -> ClientKind {
        ClientKind::Logs
    }

    async fn query(&self, _session: &ClientSession, query: &ClientQuery) -> Result<ClientResponse, ClientError> {
        Ok(executed(ClientKind::Logs, "Logs", query))
    }
}
