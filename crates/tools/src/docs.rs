//! Documentation tool set: search, page fetch, section listing.

use async_trait::async_trait;
use askpanda_core::error::ToolError;
use askpanda_core::tool::{Tool, required_str};
use serde_json::{Value, json};

/// Top-level documentation sections as `(id, title)`.
pub const SECTIONS: &[(&str, &str)] = &[
    ("getting-started", "Getting Started"),
    ("user-guide", "User Guide"),
    ("api-reference", "API Reference"),
    ("troubleshooting", "Troubleshooting"),
];

pub struct SearchDocsTool;

#[async_trait]
impl Tool for SearchDocsTool {
    fn name(&self) -> &str {
        "search_docs"
    }

    fn description(&self) -> &str {
        "Search PanDA documentation"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" },
                "section": { "type": "string", "description": "Documentation section to search" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let query = required_str(&arguments, "query")?;
        let section = arguments.get("section").and_then(Value::as_str);
        Ok(json!({
            "query": query,
            "section": section,
            "results": [],
            "message": "Documentation search placeholder",
        }))
    }
}

pub struct GetDocPageTool;

#[async_trait]
impl Tool for GetDocPageTool {
    fn name(&self) -> &str {
        "get_doc_page"
    }

    fn description(&self) -> &str {
        "Get a specific documentation page"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "page_id": { "type": "string", "description": "Page identifier" }
            },
            "required": ["page_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let page_id = required_str(&arguments, "page_id")?;
        Ok(json!({
            "page_id": page_id,
            "content": format!("Documentation page content for {page_id}"),
            "title": page_id,
        }))
    }
}

pub struct ListDocSectionsTool;

#[async_trait]
impl Tool for ListDocSectionsTool {
    fn name(&self) -> &str {
        "list_doc_sections"
    }

    fn description(&self) -> &str {
        "List available documentation sections"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: Value) -> Result<Value, ToolError> {
        let sections: Vec<Value> = SECTIONS
            .iter()
            .map(|(id, title)| json!({ "id": id, "title": title }))
            .collect();
        Ok(json!({ "sections": sections }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_docs_echoes_optional_section() {
        let out = SearchDocsTool
            .execute(json!({"query": "brokerage", "section": "user-guide"}))
            .await
            .unwrap();
        assert_eq!(out["section"], "user-guide");

        let out = SearchDocsTool.execute(json!({"query": "brokerage"})).await.unwrap();
        assert!(out["section"].is_null());
        assert_eq!(out["message"], "Documentation search placeholder");
    }

    #[tokio::test]
    async fn doc_page_is_titled_by_id() {
        let out = GetDocPageTool.execute(json!({"page_id": "prun"})).await.unwrap();
        assert_eq!(out["title"], "prun");
        assert_eq!(out["content"], "Documentation page content for prun");
    }

    #[tokio::test]
    async fn sections_are_listed_in_order() {
        let out = ListDocSectionsTool.execute(json!({})).await.unwrap();
        let ids: Vec<_> = out["sections"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["getting-started", "user-guide", "api-reference", "troubleshooting"]);
    }
}
