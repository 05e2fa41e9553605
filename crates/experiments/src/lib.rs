//! Experiment profiles.
//!
//! Each supported experiment contributes a system prompt, a PanDA endpoint,
//! custom settings, and a few experiment-specific tool definitions. Profiles
//! are looked up by name, case-insensitively.

pub mod atlas;
pub mod verarubin;
pub mod epic;

use std::collections::BTreeMap;

use askpanda_config::ExperimentConfig;
use askpanda_core::provider::ToolDefinition;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ExperimentError {
    #[error("Unknown experiment: {0}")]
    Unknown(String),
}

/// A supported experiment.
#[derive(Debug, Clone, Serialize)]
pub struct Experiment {
    /// Lowercase identifier (`atlas`, `verarubin`, `epic`)
    pub name: &'static str,
    /// One-line description used in listings
    pub summary: &'static str,
    /// Full description
    pub description: &'static str,
    pub panda_url: &'static str,
    #[serde(skip)]
    pub system_prompt: &'static str,
    pub custom_settings: BTreeMap<String, serde_json::Value>,
    pub tools: Vec<ToolDefinition>,
}

impl Experiment {
    /// Prefix `base` with this experiment's system prompt.
    pub fn customize_prompt(&self, base: &str) -> String {
        format!("{}\n\n{}", self.system_prompt, base)
    }

    /// The `[experiment]` config section this profile implies.
    pub fn default_config(&self) -> ExperimentConfig {
        ExperimentConfig {
            name: self.name.to_string(),
            description: self.description.to_string(),
            custom_settings: self.custom_settings.clone(),
        }
    }

    /// The profile's settings overlaid with `config.custom_settings`.
    pub fn settings_with(&self, config: &ExperimentConfig) -> BTreeMap<String, serde_json::Value> {
        let mut settings = self.custom_settings.clone();
        settings.extend(config.custom_settings.clone());
        settings
    }
}

/// Every supported experiment, in listing order.
pub fn all() -> Vec<Experiment> {
    vec![atlas::profile(), verarubin::profile(), epic::profile()]
}

/// Find an experiment by name, ignoring case.
pub fn lookup(name: &str) -> Result<Experiment, ExperimentError> {
    let wanted = name.to_ascii_lowercase();
    all()
        .into_iter()
        .find(|e| e.name == wanted)
        .ok_or_else(|| ExperimentError::Unknown(name.to_string()))
}

/// Names of every supported experiment.
pub fn names() -> Vec<&'static str> {
    all().iter().map(|e| e.name).collect()
}

pub(crate) fn settings(pairs: &[(&str, &str)]) -> BTreeMap<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect()
}

pub(crate) fn job_status_tool(name: &str, description: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters: serde_json::json!({
            "type": "object",
            "properties": {
                "job_id": { "type": "string", "description": "The PanDA job ID" }
            },
            "required": ["job_id"]
        }),
    }
}
