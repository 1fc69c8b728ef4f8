use serde::{Deserialize, Serialize};

/// What a tree entry is. Determines its icon, click behavior and whether it
/// may contain children (folders only).
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum NodeKind {
    Folder,
    Note,
    Chat,
}

impl NodeKind {
    pub fn is_folder(&self) -> bool {
        matches!(self, NodeKind::Folder)
    }
}

/// Type-dependent node payload. The tree never interprets blocks/messages;
/// they are pass-through for the editor/chat collaborators.
///
/// Wire shape: folders carry `null`, notes `{"blocks": []}`, chats
/// `{"messages": []}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub(crate) enum NodeContent {
    Note { blocks: Vec<serde_json::Value> },
    Chat { messages: Vec<serde_json::Value> },
    Empty,
}

impl Default for NodeContent {
    fn default() -> Self {
        NodeContent::Empty
    }
}

impl NodeContent {
    pub fn default_for(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Folder => NodeContent::Empty,
            NodeKind::Note => NodeContent::Note { blocks: vec![] },
            NodeKind::Chat => NodeContent::Chat { messages: vec![] },
        }
    }
}

/// Per-node display override (emoji, color). Opaque pass-through to the
/// backend; `extra` keeps unknown fields intact across round trips.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct Customization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single tree entry.
///
/// Invariant: a node's `parent_id` always matches the container it lives in
/// (a folder's `children` array, or the root list with `parent_id == None`),
/// and every node has exactly one such container. All mutation helpers in
/// `crate::tree` preserve this.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Node {
    pub id: String,
    pub name: String,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    #[serde(default)]
    pub content: NodeContent,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub children: Vec<Node>,

    /// Folder-only view state. Forced to `true` when loading a snapshot.
    #[serde(default)]
    pub collapsed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<Customization>,

    /// Search-highlight tag, set by `tree::filter_forest`. Never persisted.
    #[serde(skip)]
    pub matched: bool,
}

impl Node {
    pub fn new(id: String, name: String, kind: NodeKind, content: NodeContent) -> Self {
        Self {
            id,
            name,
            kind,
            content,
            parent_id: None,
            children: vec![],
            collapsed: false,
            customization: None,
            matched: false,
        }
    }
}

/// Input for `TreeController::add_node`.
#[derive(Clone, Debug)]
pub(crate) struct NewNode {
    pub name: String,
    pub kind: NodeKind,
    pub content: Option<NodeContent>,
}

/// Partial update for `TreeController::update_node`. `None` fields are left
/// untouched.
#[derive(Clone, Debug, Default)]
pub(crate) struct NodeUpdate {
    pub name: Option<String>,
    pub content: Option<NodeContent>,
    pub customization: Option<Customization>,
}
