use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

/// A row in the `workflows` table.
#[derive(Debug, Clone)]
pub struct WorkflowRecord {
    pub id: String,
    pub tenant_id: String,
    pub app_id: String,
    /// Stored in the `type` column, e.g. `"chat"` or `"workflow"`.
    pub kind: String,
    pub version: String,
    /// JSON document with `nodes` and `edges`.
    pub graph: String,
    /// JSON document of structural feature flags.
    pub features: String,
    pub app_caller_nodes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl WorkflowRecord {
    /// Version label of the editable, unpublished graph.
    pub const DRAFT_VERSION: &'static str = "draft";

    /// Node type that invokes another app.
    pub const APP_CALLER_NODE: &'static str = "app-caller";

    /// Whether any node of the graph has `data.type == node_type`.
    pub fn contains_node_type(&self, node_type: &str) -> Result<bool, serde_json::Error> {
        let graph: Value = serde_json::from_str(&self.graph)?;
        let found = graph
            .get("nodes")
            .and_then(Value::as_array)
            .is_some_and(|nodes| {
                nodes
                    .iter()
                    .any(|node| node.pointer("/data/type").and_then(Value::as_str) == Some(node_type))
            });
        Ok(found)
    }

    pub fn contains_app_caller(&self) -> Result<bool, serde_json::Error> {
        self.contains_node_type(Self::APP_CALLER_NODE)
    }

    /// [`contains_app_caller`](Self::contains_app_caller), falling back to a
    /// plain text search when the graph is not valid JSON.
    pub fn references_app_caller(&self) -> bool {
        self.contains_app_caller().unwrap_or_else(|e| {
            warn!(workflow_id = %self.id, error = %e, "draft graph is not valid JSON; scanning raw text");
            self.graph.contains(Self::APP_CALLER_NODE)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tracing_test::traced_test;

    fn with_graph(graph: &str) -> WorkflowRecord {
        WorkflowRecord {
            id: "wf".into(),
            tenant_id: "t".into(),
            app_id: "a".into(),
            kind: "chat".into(),
            version: WorkflowRecord::DRAFT_VERSION.into(),
            graph: graph.into(),
            features: "{}".into(),
            app_caller_nodes: None,
            created_by: "u".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn detects_app_caller_node() {
        let wf = with_graph(
            r#"{"nodes":[{"id":"1","data":{"type":"start"}},{"id":"2","data":{"type":"app-caller"}}],"edges":[]}"#,
        );
        assert!(wf.contains_app_caller().unwrap());
    }

    #[test]
    fn ignores_app_caller_text_outside_node_types() {
        let wf = with_graph(
            r#"{"nodes":[{"id":"1","data":{"type":"llm","title":"app-caller"}}],"edges":[]}"#,
        );
        assert!(!wf.contains_app_caller().unwrap());
    }

    #[test]
    fn graph_without_nodes_is_clean() {
        assert!(!with_graph("{}").contains_app_caller().unwrap());
    }

    #[test]
    fn malformed_graph_is_an_error() {
        assert!(with_graph("{nodes:").contains_app_caller().is_err());
    }

    #[test]
    #[traced_test]
    fn malformed_graph_falls_back_to_text_search() {
        assert!(with_graph(r#"{nodes: [{"type": "app-caller""#).references_app_caller());
        assert!(!with_graph(r#"{nodes: [{"type": "llm""#).references_app_caller());
        assert!(logs_contain("draft graph is not valid JSON"));
    }

    #[test]
    fn well_formed_graph_ignores_text_outside_node_types() {
        let wf = with_graph(r#"{"nodes":[{"id":"1","data":{"type":"llm","title":"app-caller"}}]}"#);
        assert!(!wf.references_app_caller());
    }
}
