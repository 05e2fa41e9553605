//! ATLAS at the CERN LHC.

use askpanda_core::provider::ToolDefinition;

use crate::{Experiment, job_status_tool, settings};

const SYSTEM_PROMPT: &str = "You are an AI assistant specialized in helping users with the ATLAS experiment
at CERN's Large Hadron Collider. You have knowledge of:
- PanDA (Production and Distributed Analysis) workload management system
- ATLAS computing infrastructure and grid computing
- Data management with Rucio
- Job submission and monitoring
- ATLAS-specific workflows and procedures

Help users query PanDA, understand job statuses, troubleshoot issues, and navigate ATLAS computing resources.";

pub fn profile() -> Experiment {
    Experiment {
        name: "atlas",
        summary: "ATLAS experiment at CERN LHC",
        description: "ATLAS experiment at CERN LHC",
        panda_url: "https://bigpanda.cern.ch",
        system_prompt: SYSTEM_PROMPT,
        custom_settings: settings(&[
            ("panda_url", "https://bigpanda.cern.ch"),
            ("rucio_account", "atlas"),
        ]),
        tools: vec![
            job_status_tool("get_atlas_job_status", "Get the status of an ATLAS PanDA job"),
            ToolDefinition {
                name: "search_atlas_datasets".into(),
                description: "Search for ATLAS datasets in Rucio".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "pattern": { "type": "string", "description": "Dataset name pattern" },
                        "scope": { "type": "string", "description": "Rucio scope" }
                    },
                    "required": ["pattern"]
                }),
            },
        ],
    }
}
