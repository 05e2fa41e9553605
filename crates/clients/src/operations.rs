//! Client-specific lookups beyond free-text `query`.
//!
//! Each operation belongs to one client kind and runs inside a session opened
//! on that kind's routing-table entry, so a disabled client refuses them too.

use askpanda_core::client::ClientKind;
use askpanda_core::error::{ClientError, Error};
use serde_json::Value;

use crate::router::ClientRouter;
use crate::{DataClient, DocsClient, LogsClient, MaintenanceClient, PilotsClient};

/// A named lookup on one domain client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientOperation {
    Docs { topic: String },
    JobLogs { job_id: String },
    TaskLogs { task_id: String },
    Dataset { name: String },
    DatasetFiles { name: String },
    PilotStatus { site: String },
    PilotJobs { site: String },
    SiteStatus { site: String },
    ScheduledMaintenance,
}

impl ClientOperation {
    /// Operation names per client, in the order they are listed.
    pub const NAMES: &'static [(ClientKind, &'static [&'static str])] = &[
        (ClientKind::Docs, &["get_docs"]),
        (ClientKind::Logs, &["get_job_logs", "get_task_logs"]),
        (ClientKind::Data, &["get_dataset", "get_files"]),
        (ClientKind::Pilots, &["get_pilot_status", "get_pilot_jobs"]),
        (ClientKind::Maintenance, &["get_site_status", "get_scheduled_maintenance"]),
    ];

    /// Parse an operation name and its single argument.
    ///
    /// Every operation except `get_scheduled_maintenance` needs `arg`.
    pub fn parse(name: &str, arg: Option<&str>) -> Result<Self, ClientError> {
        if name == "get_scheduled_maintenance" {
            return Ok(Self::ScheduledMaintenance);
        }

        let kind = Self::NAMES
            .iter()
            .find(|(_, names)| names.contains(&name))
            .map(|(kind, _)| *kind)
            .ok_or_else(|| ClientError::InvalidParams {
                client: "router".into(),
                reason: format!("unknown operation '{name}'"),
            })?;
        let arg = arg
            .filter(|a| !a.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| ClientError::InvalidParams {
                client: kind.to_string(),
                reason: format!("'{name}' needs an argument"),
            })?;

        Ok(match name {
            "get_docs" => Self::Docs { topic: arg },
            "get_job_logs" => Self::JobLogs { job_id: arg },
            "get_task_logs" => Self::TaskLogs { task_id: arg },
            "get_dataset" => Self::Dataset { name: arg },
            "get_files" => Self::DatasetFiles { name: arg },
            "get_pilot_status" => Self::PilotStatus { site: arg },
            "get_pilot_jobs" => Self::PilotJobs { site: arg },
            _ => Self::SiteStatus { site: arg },
        })
    }

    pub fn kind(&self) -> ClientKind {
        match self {
            Self::Docs { .. } => ClientKind::Docs,
            Self::JobLogs { .. } | Self::TaskLogs { .. } => ClientKind::Logs,
            Self::Dataset { .. } | Self::DatasetFiles { .. } => ClientKind::Data,
            Self::PilotStatus { .. } | Self::PilotJobs { .. } => ClientKind::Pilots,
            Self::SiteStatus { .. } | Self::ScheduledMaintenance => ClientKind::Maintenance,
        }
    }
}

impl ClientRouter {
    /// Run a client-specific operation inside a session on its client.
    pub async fn call(&self, operation: &ClientOperation) -> Result<Value, Error> {
        let session = self.open_session(operation.kind())?;
        let result = match operation {
            ClientOperation::Docs { topic } => DocsClient.get_docs(&session, topic).await,
            ClientOperation::JobLogs { job_id } => LogsClient.get_job_logs(&session, job_id).await,
            ClientOperation::TaskLogs { task_id } => LogsClient.get_task_logs(&session, task_id).await,
            ClientOperation::Dataset { name } => DataClient.get_dataset(&session, name).await,
            ClientOperation::DatasetFiles { name } => DataClient.get_files(&session, name).await,
            ClientOperation::PilotStatus { site } => PilotsClient.get_pilot_status(&session, site).await,
            ClientOperation::PilotJobs { site } => PilotsClient.get_pilot_jobs(&session, site).await,
            ClientOperation::SiteStatus { site } => MaintenanceClient.get_site_status(&session, site).await,
            ClientOperation::ScheduledMaintenance => MaintenanceClient.get_scheduled_maintenance(&session).await,
        }?;
        tracing::debug!(client = %operation.kind(), "Client operation completed");
        Ok(result)
    }
}
