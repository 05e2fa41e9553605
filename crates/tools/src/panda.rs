//! PanDA tool set: free-form queries, job status, documentation search.
//!
//! Placeholder handlers. They validate arguments and echo them back in the
//! shape a real PanDA monitor response would take.

use async_trait::async_trait;
use askpanda_core::error::ToolError;
use askpanda_core::tool::{Tool, required_str};
use serde_json::{Value, json};

/// `query_panda`: run a query against PanDA for an experiment.
pub struct QueryPandaTool {
    default_experiment: String,
}

impl QueryPandaTool {
    pub fn new(default_experiment: impl Into<String>) -> Self {
        Self {
            default_experiment: default_experiment.into(),
        }
    }
}

#[async_trait]
impl Tool for QueryPandaTool {
    fn name(&self) -> &str {
        "query_panda"
    }

    fn description(&self) -> &str {
        "Query PanDA for job information"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The query to execute" },
                "experiment": { "type": "string", "description": "Experiment name" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let query = required_str(&arguments, "query")?;
        let experiment = arguments["experiment"]
            .as_str()
            .unwrap_or(&self.default_experiment);

        tracing::debug!(query, experiment, "query_panda called");
        Ok(json!({
            "result": format!("Query '{query}' executed for {experiment}"),
            "data": [],
        }))
    }
}

/// `get_job_status`: look up one PanDA job.
pub struct JobStatusTool;

#[async_trait]
impl Tool for JobStatusTool {
    fn name(&self) -> &str {
        "get_job_status"
    }

    fn description(&self) -> &str {
        "Get status of a PanDA job"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "job_id": { "type": "string", "description": "The job ID" }
            },
            "required": ["job_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let job_id = required_str(&arguments, "job_id")?;
        Ok(json!({
            "job_id": job_id,
            "status": "unknown",
            "message": "Job status query placeholder",
        }))
    }
}

/// `search_documentation`: search PanDA documentation.
pub struct SearchDocumentationTool;

#[async_trait]
impl Tool for SearchDocumentationTool {
    fn name(&self) -> &str {
        "search_documentation"
    }

    fn description(&self) -> &str {
        "Search PanDA documentation"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let query = required_str(&arguments, "query")?;
        Ok(json!({
            "query": query,
            "results": [],
            "message": "Documentation search placeholder",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn query_panda_uses_default_experiment() {
        let tool = QueryPandaTool::new("atlas");
        let out = tool.execute(json!({"query": "failed jobs"})).await.unwrap();
        assert_eq!(out["result"], "Query 'failed jobs' executed for atlas");
        assert!(out["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_panda_honours_explicit_experiment() {
        let tool = QueryPandaTool::new("atlas");
        let out = tool
            .execute(json!({"query": "campaigns", "experiment": "epic"}))
            .await
            .unwrap();
        assert_eq!(out["result"], "Query 'campaigns' executed for epic");
    }

    #[tokio::test]
    async fn job_status_is_unknown_placeholder() {
        let out = JobStatusTool.execute(json!({"job_id": "6123456789"})).await.unwrap();
        assert_eq!(out["job_id"], "6123456789");
        assert_eq!(out["status"], "unknown");
    }

    #[tokio::test]
    async fn missing_required_argument_is_rejected() {
        let err = SearchDocumentationTool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        let err = JobStatusTool.execute(json!({"job_id": 42})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
