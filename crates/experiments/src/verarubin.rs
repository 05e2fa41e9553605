//! Vera C. Rubin Observatory (LSST).

use askpanda_core::provider::ToolDefinition;

use crate::{Experiment, job_status_tool, settings};

const SYSTEM_PROMPT: &str = "You are an AI assistant specialized in helping users with the Vera C. Rubin Observatory
and its Legacy Survey of Space and Time (LSST). You have knowledge of:
- PanDA workload management system for Rubin data processing
- Rubin Science Platform and data access
- LSST Data Management pipelines
- Butler data repository system
- Rubin-specific workflows and procedures

Help users query PanDA, understand job statuses, troubleshoot issues, and navigate Rubin computing resources.";

pub fn profile() -> Experiment {
    Experiment {
        name: "verarubin",
        summary: "Vera C. Rubin Observatory LSST",
        description: "Vera C. Rubin Observatory Legacy Survey of Space and Time (LSST)",
        panda_url: "https://panda.lsst.io",
        system_prompt: SYSTEM_PROMPT,
        custom_settings: settings(&[
            ("panda_url", "https://panda.lsst.io"),
            ("butler_repo", "/repo/main"),
        ]),
        tools: vec![
            job_status_tool("get_rubin_job_status", "Get the status of a Rubin PanDA job"),
            ToolDefinition {
                name: "query_butler".into(),
                description: "Query the Butler data repository".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "collection": { "type": "string", "description": "Collection name" },
                        "data_type": { "type": "string", "description": "Data type to query" }
                    },
                    "required": ["collection"]
                }),
            },
        ],
    }
}
