use crate::models::{Customization, Node, NodeContent, NodeKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Network,
    Http,
    Parse,
    /// Backend answered 2xx but reported a non-success status in the body
    /// (the move endpoint does this).
    Rejected,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }

    fn rejected(message: String) -> Self {
        Self {
            kind: ApiErrorKind::Rejected,
            message,
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:5000".to_string();

        // Deployments inject `window.ENV.API_URL`; fall back to the legacy
        // lowercase key, then to localhost.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"API_URL".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }

                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"api_url".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateNodeRequest {
    pub id: String,
    pub name: String,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    pub parent_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateNodeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<NodeContent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MoveNodeRequest {
    /// `null` means "move to root".
    pub parent_id: Option<String>,
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    pub fn from_env() -> Self {
        Self::new(EnvConfig::new().api_url)
    }

    /// Single request funnel: HTTP status decides success, and empty bodies
    /// (204-style responses) come back as JSON `null` rather than a parse
    /// error.
    async fn request_api(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&impl serde::Serialize>,
    ) -> ApiResult<serde_json::Value> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let mut req = client.request(method, url);

        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        let status = res.status();
        let text = res.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ApiError::http(status, text, "Request failed"));
        }

        if text.trim().is_empty() {
            Ok(serde_json::Value::Null)
        } else {
            serde_json::from_str(&text).map_err(ApiError::parse)
        }
    }

    /// Initial load of the whole forest.
    pub async fn fetch_tree(&self) -> ApiResult<Vec<Node>> {
        let data = self
            .request_api(reqwest::Method::GET, "/api/nodes", None::<&()>)
            .await?;
        Ok(Self::parse_tree_response(data))
    }

    pub async fn create_node(&self, req: CreateNodeRequest) -> ApiResult<()> {
        self.request_api(reqwest::Method::POST, "/api/nodes", Some(&req))
            .await?;
        Ok(())
    }

    pub async fn delete_node(&self, id: &str) -> ApiResult<()> {
        self.request_api(
            reqwest::Method::DELETE,
            &format!("/api/nodes/{id}"),
            None::<&()>,
        )
        .await?;
        Ok(())
    }

    pub async fn update_node(&self, id: &str, req: UpdateNodeRequest) -> ApiResult<()> {
        self.request_api(reqwest::Method::PUT, &format!("/api/nodes/{id}"), Some(&req))
            .await?;
        Ok(())
    }

    /// Reparent. The endpoint reports success in the body, so a 2xx answer
    /// with a non-success status still counts as failure.
    pub async fn move_node(&self, id: &str, parent_id: Option<&str>) -> ApiResult<()> {
        let data = self
            .request_api(
                reqwest::Method::PUT,
                &format!("/api/nodes/{id}/move"),
                Some(&MoveNodeRequest {
                    parent_id: parent_id.map(|s| s.to_string()),
                }),
            )
            .await?;
        Self::check_move_response(&data)
    }

    pub(crate) fn check_move_response(data: &serde_json::Value) -> ApiResult<()> {
        // Missing status is treated as success (older backends answer 204).
        let status = data.get("status").and_then(|v| v.as_str());
        match status {
            None | Some("success") => Ok(()),
            Some(other) => {
                let message = data
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or(other)
                    .to_string();
                Err(ApiError::rejected(message))
            }
        }
    }

    /// The forest endpoint has been observed answering either a bare array
    /// or `{"nodes": [...]}`; accept both and skip malformed entries.
    pub(crate) fn parse_tree_response(data: serde_json::Value) -> Vec<Node> {
        let list = match data {
            serde_json::Value::Array(items) => items,
            other => other
                .get("nodes")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default(),
        };

        let mut out: Vec<Node> = Vec::with_capacity(list.len());
        for item in list {
            match serde_json::from_value::<Node>(item) {
                Ok(node) => out.push(node),
                Err(e) => {
                    leptos::logging::warn!("skipping malformed node in tree response: {e}");
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::find_node;

    #[test]
    fn test_create_request_wire_contract() {
        let req = CreateNodeRequest {
            id: "1755000000000-0".to_string(),
            name: "Recipes".to_string(),
            kind: NodeKind::Folder,
            parent_id: None,
            customization: None,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["id"], "1755000000000-0");
        assert_eq!(v["type"], "folder");
        // parentId is always present (null for root), customization only
        // when set.
        assert_eq!(v["parentId"], serde_json::Value::Null);
        assert!(v.get("customization").is_none());
    }

    #[test]
    fn test_update_request_omits_untouched_fields() {
        let req = UpdateNodeRequest {
            name: Some("Dinner ideas".to_string()),
            ..Default::default()
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["name"], "Dinner ideas");
        assert!(v.get("content").is_none());
        assert!(v.get("customization").is_none());
    }

    #[test]
    fn test_move_request_null_parent_means_root() {
        let v = serde_json::to_value(MoveNodeRequest { parent_id: None }).unwrap();
        assert_eq!(v["parentId"], serde_json::Value::Null);
    }

    #[test]
    fn test_check_move_response_statuses() {
        assert!(ApiClient::check_move_response(&serde_json::json!({"status": "success"})).is_ok());
        assert!(ApiClient::check_move_response(&serde_json::Value::Null).is_ok());

        let err = ApiClient::check_move_response(
            &serde_json::json!({"status": "error", "message": "target is not a folder"}),
        )
        .expect_err("non-success status should fail");
        assert_eq!(err.kind, ApiErrorKind::Rejected);
        assert_eq!(err.message, "target is not a folder");
    }

    #[test]
    fn test_parse_tree_response_accepts_both_shapes() {
        let bare = serde_json::json!([
            {"id": "f1", "name": "Recipes", "type": "folder", "children": [
                {"id": "n1", "name": "Pasta", "type": "note", "parentId": "f1"}
            ]}
        ]);
        let forest = ApiClient::parse_tree_response(bare);
        assert_eq!(forest.len(), 1);
        assert!(find_node(&forest, "n1").is_some());

        let wrapped = serde_json::json!({"nodes": [
            {"id": "n2", "name": "Inbox", "type": "note"}
        ]});
        let forest = ApiClient::parse_tree_response(wrapped);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, "n2");
    }

    #[test]
    fn test_parse_tree_response_skips_malformed_entries() {
        let data = serde_json::json!([
            {"id": "n1", "name": "Pasta", "type": "note"},
            {"name": "missing id and type"},
            42
        ]);
        let forest = ApiClient::parse_tree_response(data);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].id, "n1");
    }

    #[test]
    fn test_api_client_base_url() {
        let client = ApiClient::new("http://localhost:5000".to_string());
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}
