//! ePIC at the Electron-Ion Collider.

use askpanda_core::provider::ToolDefinition;

use crate::{Experiment, job_status_tool, settings};

const SYSTEM_PROMPT: &str = "You are an AI assistant specialized in helping users with the ePIC experiment
at the Electron-Ion Collider (EIC). You have knowledge of:
- PanDA workload management system for ePIC simulations and analysis
- EIC computing infrastructure
- ePIC detector simulations and reconstruction
- Data management and storage systems
- ePIC-specific workflows and procedures

Help users query PanDA, understand job statuses, troubleshoot issues, and navigate ePIC computing resources.";

pub fn profile() -> Experiment {
    Experiment {
        name: "epic",
        summary: "ePIC detector at the Electron-Ion Collider",
        description: "ePIC detector at the Electron-Ion Collider (EIC)",
        panda_url: "https://panda.eic.io",
        system_prompt: SYSTEM_PROMPT,
        custom_settings: settings(&[
            ("panda_url", "https://panda.eic.io"),
            ("simulation_version", "latest"),
        ]),
        tools: vec![
            job_status_tool("get_epic_job_status", "Get the status of an ePIC PanDA job"),
            ToolDefinition {
                name: "list_simulation_campaigns".into(),
                description: "List ePIC simulation campaigns".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "status": { "type": "string", "description": "Filter by campaign status" }
                    }
                }),
            },
        ],
    }
}
